//! Session-carrying JSON client wrapping reqwest.
//!
//! Cookies set by any response (the login session in particular) are kept in
//! the client's cookie store and replayed on every later request to the same
//! origin. Retries transport errors (including a body cut short) and 5xx,
//! backs off on 429. Every retry is reported as a progress warning.

use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::progress::{self, ProgressEventKind, ProgressSink};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// First retry waits this long; each further retry doubles it.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Default wait on 429 when the server sends no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Upper bound on any `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 10;

/// Raw response, before any status or body interpretation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON-over-HTTP client bound to one vendor origin.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u32,
    progress: Arc<ProgressSink>,
}

impl HttpClient {
    /// Build a client with a cookie store, the configured user agent and a
    /// JSON content type on every request.
    pub fn new(config: &ScraperConfig) -> ScrapeResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            max_retries: config.max_retries,
            progress: Arc::new(ProgressSink::disabled()),
        })
    }

    /// Report retries on `progress` from now on.
    pub fn with_progress(mut self, progress: Arc<ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Resolve an endpoint path against the base origin.
    pub fn endpoint(&self, path: &str) -> ScrapeResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send `body` as JSON and decode a successful response as `T`.
    ///
    /// A non-2xx status that survives the retries is an `HttpStatus` error; a
    /// body that does not decode as `T` is a `Decode` error.
    pub async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> ScrapeResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send_raw(method, path, body).await?;
        if !resp.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: resp.status,
                url: resp.url,
            });
        }
        decode(path, &resp.body)
    }

    /// Send `body` as JSON with retry on transport errors, 5xx and 429.
    ///
    /// Returns whatever status the last attempt produced.
    pub async fn send_raw<B>(&self, method: Method, path: &str, body: &B) -> ScrapeResult<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)?;
        let mut retries = 0u32;

        loop {
            let resp = self
                .client
                .request(method.clone(), url.clone())
                .body(payload.clone())
                .send()
                .await;

            let err = match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        let delay = backoff(retries);
                        self.warn_retry(format!(
                            "{method} {path} returned {status}, retry {retries}/{} in {}ms",
                            self.max_retries,
                            delay.as_millis()
                        ));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let delay = retry_after(r.headers());
                        self.warn_retry(format!(
                            "{method} {path} rate limited, retry {retries}/{} in {}s",
                            self.max_retries,
                            delay.as_secs()
                        ));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    match r.text().await {
                        Ok(body) => {
                            tracing::debug!("{method} {path} -> {status} ({} bytes)", body.len());
                            return Ok(HttpResponse {
                                url: url.to_string(),
                                status,
                                body,
                            });
                        }
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            if retries >= self.max_retries {
                return Err(err.into());
            }
            retries += 1;
            let delay = backoff(retries);
            self.warn_retry(format!(
                "{method} {path} failed: {err}, retry {retries}/{} in {}ms",
                self.max_retries,
                delay.as_millis()
            ));
            tokio::time::sleep(delay).await;
        }
    }

    fn warn_retry(&self, message: String) {
        tracing::warn!("{message}");
        progress::emit(&self.progress, ProgressEventKind::Warning { message });
    }
}

/// Decode a JSON body, tagging failures with the endpoint they came from.
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> ScrapeResult<T> {
    serde_json::from_str(body).map_err(|source| ScrapeError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// How long to wait after a 429: the `Retry-After` seconds when present and
/// numeric, capped at `MAX_RETRY_AFTER_SECS`.
fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS))
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt.saturating_sub(1)))
}
