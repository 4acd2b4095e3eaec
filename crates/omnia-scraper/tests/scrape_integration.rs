//! End-to-end scrape runs against a wiremock stand-in for the vendor API.
//!
//! Covers login, pagination, tech-sheet enrichment, session cookies, fixed
//! headers, error propagation, retries and the skip policy.

use omnia_scraper::catalog::paginator::PRODUCT_LIST_ENDPOINT;
use omnia_scraper::catalog::techsheet::TECHSHEET_ENDPOINT;
use omnia_scraper::config::{
    Credentials, MissingTechsheetPolicy, ScraperConfig, DEFAULT_USER_AGENT,
};
use omnia_scraper::error::ScrapeError;
use omnia_scraper::pacing::PacingPolicy;
use omnia_scraper::progress::{self, ProgressEventKind};
use omnia_scraper::scraper::{scrape, Scraper};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ─────────────────────── helpers ───────────────────────

const SESSION_COOKIE: &str = "omnia_session=abc123";

fn config(server: &MockServer) -> ScraperConfig {
    ScraperConfig {
        base_url: server.uri(),
        credentials: Credentials::new("Generic Customer", "gen_cust_2019"),
        category_id: 1327,
        timeout_ms: 5_000,
        max_retries: 0,
        pacing: PacingPolicy::new(0, 1),
        ..ScraperConfig::default()
    }
}

fn endpoint(p: &str) -> String {
    format!("/{p}")
}

fn product(id: u64) -> Value {
    json!({
        "id": id,
        "code": format!("OM-{id}"),
        "name": format!("Part {id} "),
        "image": format!("img/{id}.jpg"),
    })
}

fn page(ids: std::ops::RangeInclusive<u64>) -> Value {
    json!({ "products": ids.map(product).collect::<Vec<_>>() })
}

fn empty_page() -> Value {
    json!({ "products": [] })
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{SESSION_COOKIE}; Path=/").as_str())
                .set_body_json(json!({"user": {"id": 1, "name": "Generic Customer"}})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_index: u32, body: Value) {
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .and(body_partial_json(json!({"page_index": page_index})))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Answers every tech-sheet request with data derived from its product id,
/// except for ids listed in `missing`, which get an empty record list.
struct TechsheetResponder {
    missing: Vec<u64>,
}

impl Respond for TechsheetResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let id: u64 = body["product_id"].as_str().unwrap().parse().unwrap();
        if self.missing.contains(&id) {
            return ResponseTemplate::new(200).set_body_json(json!([]));
        }
        ResponseTemplate::new(200).set_body_json(json!([{
            "data": {
                "dati_generali": [{
                    "cross_reference_customer": format!("X{id},Y{id}, Z{id}"),
                    "technical_description": format!("spec {id}"),
                }]
            }
        }]))
    }
}

async fn mount_techsheets(server: &MockServer, missing: Vec<u64>, expected: u64) {
    Mock::given(method("POST"))
        .and(path(endpoint(TECHSHEET_ENDPOINT)))
        .respond_with(TechsheetResponder { missing })
        .expect(expected)
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, p: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == endpoint(p))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ─────────────────────── scenarios ───────────────────────

#[tokio::test]
async fn test_two_pages_then_empty() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, page(1..=20)).await;
    mount_page(&server, 2, page(21..=25)).await;
    mount_page(&server, 3, empty_page()).await;
    mount_techsheets(&server, vec![], 25).await;

    let items = scrape(config(&server)).await.unwrap();

    assert_eq!(items.len(), 25);
    for (i, item) in items.iter().enumerate() {
        let id = i as u64 + 1;
        assert_eq!(item.code, format!("OM-{id}"));
        assert_eq!(item.image_url, format!("img/{id}.jpg"));
        assert_eq!(item.description, format!("Part {id} spec {id}"));
        assert_eq!(
            item.original_codes,
            vec![format!("X{id}"), format!("Y{id}"), format!(" Z{id}")]
        );
    }

    let pages = requests_to(&server, PRODUCT_LIST_ENDPOINT).await;
    let page_indexes: Vec<u64> = pages
        .iter()
        .map(|b| b["page_index"].as_u64().unwrap())
        .collect();
    assert_eq!(page_indexes, vec![1, 2, 3]);

    let details = requests_to(&server, TECHSHEET_ENDPOINT).await;
    let detail_ids: Vec<String> = details
        .iter()
        .map(|b| b["product_id"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (1..=25).map(|id: u64| id.to_string()).collect();
    assert_eq!(detail_ids, expected);

    server.verify().await;
}

#[tokio::test]
async fn test_request_bodies_match_vendor_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(
            json!({"username": "Generic Customer", "password": "gen_cust_2019"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .and(body_json(json!({
            "category_id": 1327,
            "division_id": "1",
            "onlyAvailable": null,
            "orderBy": "price asc",
            "page_index": 1,
            "page_size": 20,
            "selected_facets": "",
            "user_search": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(8..=8)))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 2, empty_page()).await;
    Mock::given(method("POST"))
        .and(path(endpoint(TECHSHEET_ENDPOINT)))
        .and(body_json(json!({"product_id": "8", "filter": []})))
        .respond_with(TechsheetResponder { missing: vec![] })
        .expect(1)
        .mount(&server)
        .await;

    let items = scrape(config(&server)).await.unwrap();
    assert_eq!(items.len(), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_null_user_aborts_before_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": null})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(0)
        .mount(&server)
        .await;
    mount_techsheets(&server, vec![], 0).await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Auth), "got {err:?}");
    server.verify().await;
}

#[tokio::test]
async fn test_unauthorized_status_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .mount(&server)
        .await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Auth), "got {err:?}");
    assert!(requests_to(&server, PRODUCT_LIST_ENDPOINT).await.is_empty());
}

#[tokio::test]
async fn test_session_cookie_and_fixed_headers_replayed() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;

    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .and(header("cookie", SESSION_COOKIE))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let items = scrape(config(&server)).await.unwrap();
    assert!(items.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_missing_techsheet_fails_by_default() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .and(body_partial_json(json!({"page_index": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1..=3)))
        .mount(&server)
        .await;
    mount_techsheets(&server, vec![2], 2).await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::MissingTechsheet { product_id: 2 }),
        "got {err:?}"
    );
    // The run stops at the broken product; page 2 is never requested.
    assert_eq!(requests_to(&server, PRODUCT_LIST_ENDPOINT).await.len(), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_missing_techsheet_skipped_with_policy() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, page(1..=3)).await;
    mount_page(&server, 2, empty_page()).await;
    mount_techsheets(&server, vec![2], 3).await;

    let config = ScraperConfig {
        on_missing_techsheet: MissingTechsheetPolicy::Skip,
        ..config(&server)
    };
    let report = Scraper::new(config).unwrap().run().await.unwrap();

    let codes: Vec<&str> = report.items.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["OM-1", "OM-3"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].product_id, 2);
    assert_eq!(report.skipped[0].code, "OM-2");
    server.verify().await;
}

#[tokio::test]
async fn test_missing_field_is_named() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, page(5..=5)).await;
    Mock::given(method("POST"))
        .and(path(endpoint(TECHSHEET_ENDPOINT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "data": {"dati_generali": [{"technical_description": "no codes"}]}
        }])))
        .mount(&server)
        .await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(
        matches!(
            err,
            ScrapeError::MissingField {
                product_id: 5,
                field: "cross_reference_customer"
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_page_failure_aborts_run() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, page(1..=2)).await;
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .and(body_partial_json(json!({"page_index": 2})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_techsheets(&server, vec![], 2).await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::HttpStatus { status: 500, .. }),
        "got {err:?}"
    );
    server.verify().await;
}

#[tokio::test]
async fn test_malformed_page_is_decode_error() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path(endpoint(PRODUCT_LIST_ENDPOINT)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = scrape(config(&server)).await.unwrap_err();
    match err {
        ScrapeError::Decode { endpoint, .. } => assert_eq!(endpoint, PRODUCT_LIST_ENDPOINT),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, empty_page()).await;

    let config = ScraperConfig {
        max_retries: 1,
        ..config(&server)
    };
    let items = scrape(config).await.unwrap();
    assert!(items.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_progress_events_follow_the_run() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, page(1..=2)).await;
    mount_page(&server, 2, empty_page()).await;
    mount_techsheets(&server, vec![], 2).await;

    let (tx, mut rx) = progress::channel();
    let report = Scraper::new(config(&server))
        .unwrap()
        .with_progress(tx)
        .run()
        .await
        .unwrap();
    assert_eq!(report.pages, 1);
    assert!(report.skipped.is_empty());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.run_id, report.run_id);
        events.push(event.event);
    }

    assert!(matches!(events.first(), Some(ProgressEventKind::LoggedIn { .. })));
    assert!(matches!(
        events.last(),
        Some(ProgressEventKind::ScrapeComplete {
            pages: 1,
            items: 2,
            skipped: 0,
            ..
        })
    ));
    let pages: Vec<(u32, usize)> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEventKind::PageFetched {
                page_index,
                product_count,
            } => Some((*page_index, *product_count)),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![(1, 2), (2, 0)]);
    let assembled = events
        .iter()
        .filter(|e| matches!(e, ProgressEventKind::ItemAssembled { .. }))
        .count();
    assert_eq!(assembled, 2);
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_login_ok(&server).await;
    mount_page(&server, 1, empty_page()).await;

    let config = ScraperConfig {
        max_retries: 1,
        ..config(&server)
    };
    let (tx, mut rx) = progress::channel();
    let report = Scraper::new(config)
        .unwrap()
        .with_progress(tx)
        .run()
        .await
        .unwrap();
    assert!(report.items.is_empty());
    assert_eq!(report.pages, 0);

    let mut warnings = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ProgressEventKind::Warning { message } = event.event {
            warnings.push(message);
        }
    }
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("rate limited"), "{}", warnings[0]);

    let logins = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/login")
        .count();
    assert_eq!(logins, 2);
    server.verify().await;
}

#[tokio::test]
async fn test_rate_limit_without_retries_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(1)
        .mount(&server)
        .await;

    let err = scrape(config(&server)).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::HttpStatus { status: 429, .. }),
        "expected 429 status error, got {err:?}"
    );
}

/// Base URL of a local port nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn offline_config(base_url: String) -> ScraperConfig {
    ScraperConfig {
        base_url,
        credentials: Credentials::new("Generic Customer", "gen_cust_2019"),
        timeout_ms: 2_000,
        max_retries: 1,
        pacing: PacingPolicy::new(0, 1),
        ..ScraperConfig::default()
    }
}

#[tokio::test]
async fn test_unreachable_vendor_is_transport_error() {
    let (tx, mut rx) = progress::channel();
    let err = Scraper::new(offline_config(closed_port_url()))
        .unwrap()
        .with_progress(tx)
        .run()
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScrapeError::Transport(_)),
        "expected transport error, got {err:?}"
    );

    let mut retries = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event.event, ProgressEventKind::Warning { .. }) {
            retries += 1;
        }
    }
    assert_eq!(retries, 1);
}

#[tokio::test]
async fn test_truncated_body_is_retried() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promises 100 bytes, sends 5, hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"use")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    let err = scrape(offline_config(base_url)).await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::Transport(_)),
        "expected transport error, got {err:?}"
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
