//! CLI handler for a scrape run.

use crate::cli::output;
use crate::config::{
    resolve_category_id, resolve_password, resolve_string, MissingTechsheetPolicy, ScraperConfig,
    ENV_BASE_URL, ENV_USERNAME,
};
use crate::error::ScrapeResult;
use crate::output::{write_items_to_path, write_items_to_stdout, OutputFormat};
use crate::progress::{self, ProgressEventKind, ProgressReceiver};
use crate::scraper::Scraper;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

/// Flags for a scrape run. Each one overrides the matching env var, which
/// overrides the config file, which overrides the built-in default.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScrapeArgs {
    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Account name (env: OMNIA_USERNAME)
    #[arg(long, short)]
    pub username: Option<String>,

    /// Account password (env: OMNIA_PASSWORD_FILE, OMNIA_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Category to scrape (env: OMNIA_CATEGORY_ID)
    #[arg(long, short)]
    pub category: Option<u64>,

    /// Vendor origin (env: OMNIA_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// User-Agent sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Retries for transport errors, 5xx and 429
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Shortest delay before a tech-sheet request, inclusive
    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    /// Longest delay before a tech-sheet request, exclusive
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Skip products without tech-sheet data instead of aborting
    #[arg(long)]
    pub skip_missing_techsheet: bool,

    /// Write items to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Item serialization
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Layer flags and environment over the config file (or the defaults).
pub fn build_config<F>(args: &ScrapeArgs, env: F) -> ScrapeResult<ScraperConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => ScraperConfig::from_json_file(path)?,
        None => ScraperConfig::default(),
    };

    if let Some(username) = resolve_string(args.username.as_deref(), ENV_USERNAME, &env) {
        config.credentials.username = username;
    }
    if let Some(password) = resolve_password(args.password.as_deref(), &env)? {
        config.credentials.password = password;
    }
    if let Some(category_id) = resolve_category_id(args.category, &env)? {
        config.category_id = category_id;
    }
    if let Some(base_url) = resolve_string(args.base_url.as_deref(), ENV_BASE_URL, &env) {
        config.base_url = base_url;
    }
    if let Some(ref user_agent) = args.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(min_ms) = args.min_delay_ms {
        config.pacing.min_ms = min_ms;
    }
    if let Some(max_ms) = args.max_delay_ms {
        config.pacing.max_ms = max_ms;
    }
    if args.skip_missing_techsheet {
        config.on_missing_techsheet = MissingTechsheetPolicy::Skip;
    }

    config.validate()?;
    Ok(config)
}

/// Run the scrape command.
pub async fn run(args: ScrapeArgs) -> Result<()> {
    let config = build_config(&args, |key| std::env::var(key).ok())?;
    let category_id = config.category_id;

    let (tx, rx) = progress::channel();
    let scraper = Scraper::new(config)?.with_progress(tx);

    let printer = if !output::is_quiet() && !output::is_json() {
        Some(tokio::spawn(print_progress(rx)))
    } else {
        drop(rx);
        None
    };

    let report = scraper
        .run()
        .await
        .with_context(|| format!("scraping category {category_id}"))?;

    // Dropping the scraper closes the channel and lets the printer finish.
    drop(scraper);
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    match &args.output {
        Some(path) => write_items_to_path(&report.items, args.format, path)?,
        None => write_items_to_stdout(&report.items, args.format)?,
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "run_id": report.run_id,
            "category_id": report.category_id,
            "pages": report.pages,
            "items": report.items.len(),
            "skipped": report.skipped,
            "elapsed_ms": report.elapsed_ms,
        }));
    } else if !output::is_quiet() {
        eprintln!(
            "  Scraped {} items ({} pages) from category {} in {:.1}s",
            report.items.len(),
            report.pages,
            report.category_id,
            report.elapsed_ms as f64 / 1000.0
        );
        if !report.skipped.is_empty() {
            eprintln!("  Skipped {} products without tech sheets:", report.skipped.len());
            for skipped in &report.skipped {
                eprintln!("    {:<16} (id {})", skipped.code, skipped.product_id);
            }
        }
    }

    Ok(())
}

async fn print_progress(mut rx: ProgressReceiver) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.event {
                ProgressEventKind::LoggedIn { username } => {
                    eprintln!("  Logged in as {username}");
                }
                ProgressEventKind::PageFetched {
                    page_index,
                    product_count,
                } if product_count > 0 => {
                    eprintln!("  Page {page_index:>3}: {product_count} products");
                }
                ProgressEventKind::ItemSkipped { product_id, reason } => {
                    eprintln!("  Skipped product {product_id}: {reason}");
                }
                _ => {}
            },
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
