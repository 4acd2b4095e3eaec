// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! One scrape run: log in, walk the category, enrich every product.
//!
//! Strictly sequential. One request is in flight at a time and each product
//! is fully enriched before the next one is pulled from the listing.

use crate::acquisition::auth;
use crate::acquisition::http_client::HttpClient;
use crate::catalog::assembler::assemble;
use crate::catalog::paginator::list_products;
use crate::catalog::techsheet::fetch_detail;
use crate::catalog::types::{Item, ProductSummary};
use crate::config::{MissingTechsheetPolicy, ScraperConfig};
use crate::error::ScrapeResult;
use crate::progress::{self, ProgressEventKind, ProgressSender, ProgressSink};
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// A product left out of the output under [`MissingTechsheetPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProduct {
    pub product_id: i64,
    pub code: String,
    pub reason: String,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub run_id: String,
    pub category_id: u64,
    pub started_at: String,
    pub elapsed_ms: u64,
    /// Catalog pages that carried products.
    pub pages: u32,
    /// Items in vendor page/row order.
    pub items: Vec<Item>,
    pub skipped: Vec<SkippedProduct>,
}

/// Drives one run against the vendor.
pub struct Scraper {
    client: HttpClient,
    config: ScraperConfig,
    progress: Arc<ProgressSink>,
}

impl Scraper {
    /// Validate `config` and build the session client.
    pub fn new(config: ScraperConfig) -> ScrapeResult<Self> {
        config.validate()?;
        let client = HttpClient::new(&config)?;
        Ok(Self {
            client,
            config,
            progress: Arc::new(ProgressSink::new(None, uuid::Uuid::new_v4().to_string())),
        })
    }

    /// Broadcast progress events on `tx` for the next run, retries included.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        let run_id = self.progress.run_id().to_string();
        self.progress = Arc::new(ProgressSink::new(Some(tx), run_id));
        self.client = self.client.with_progress(Arc::clone(&self.progress));
        self
    }

    /// Log in once, then page through the configured category.
    ///
    /// Any error aborts the run with no partial output, except per-item
    /// data-shape errors when the config asks to skip them.
    pub async fn run(&self) -> ScrapeResult<ScrapeReport> {
        let start = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let category_id = self.config.category_id;

        auth::login(&self.client, &self.config.credentials).await?;
        progress::emit(
            &self.progress,
            ProgressEventKind::LoggedIn {
                username: self.config.credentials.username.clone(),
            },
        );

        let mut items = Vec::new();
        let mut skipped = Vec::new();
        let mut pages = 0u32;

        let products = list_products(&self.client, category_id, &self.progress);
        futures::pin_mut!(products);

        while let Some(listed) = products.next().await {
            let (page_index, product) = listed?;
            pages = page_index;
            self.config.pacing.delay().await;

            match self.enrich(&product).await {
                Ok(item) => {
                    tracing::debug!("assembled {} (product {})", item.code, product.id);
                    progress::emit(
                        &self.progress,
                        ProgressEventKind::ItemAssembled {
                            product_id: product.id,
                            code: item.code.clone(),
                        },
                    );
                    items.push(item);
                }
                Err(e)
                    if e.is_data_shape()
                        && self.config.on_missing_techsheet == MissingTechsheetPolicy::Skip =>
                {
                    tracing::warn!("skipping {} (product {}): {e}", product.code, product.id);
                    progress::emit(
                        &self.progress,
                        ProgressEventKind::ItemSkipped {
                            product_id: product.id,
                            reason: e.to_string(),
                        },
                    );
                    skipped.push(SkippedProduct {
                        product_id: product.id,
                        code: product.code.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "category {category_id}: {pages} pages, {} items, {} skipped in {elapsed_ms}ms",
            items.len(),
            skipped.len()
        );
        progress::emit(
            &self.progress,
            ProgressEventKind::ScrapeComplete {
                pages,
                items: items.len(),
                skipped: skipped.len(),
                elapsed_ms,
            },
        );

        Ok(ScrapeReport {
            run_id: self.progress.run_id().to_string(),
            category_id,
            started_at,
            elapsed_ms,
            pages,
            items,
            skipped,
        })
    }

    async fn enrich(&self, product: &ProductSummary) -> ScrapeResult<Item> {
        let detail = fetch_detail(&self.client, product.id).await?;
        assemble(product, &detail)
    }
}

/// Run a full scrape with `config` and return the items.
pub async fn scrape(config: ScraperConfig) -> ScrapeResult<Vec<Item>> {
    let report = Scraper::new(config)?.run().await?;
    Ok(report.items)
}
