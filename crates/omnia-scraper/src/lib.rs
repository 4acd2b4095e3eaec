// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Omnia catalog scraper. Logs into the B2B site, pages through one category,
//! enriches every product with its tech sheet, and emits normalized items.
//!
//! ```no_run
//! use omnia_scraper::config::{Credentials, ScraperConfig};
//!
//! # async fn demo() -> omnia_scraper::error::ScrapeResult<()> {
//! let config = ScraperConfig {
//!     credentials: Credentials::new("Generic Customer", "secret"),
//!     category_id: 1327,
//!     ..ScraperConfig::default()
//! };
//! let items = omnia_scraper::scraper::scrape(config).await?;
//! println!("{} items", items.len());
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pacing;
pub mod progress;
pub mod scraper;
