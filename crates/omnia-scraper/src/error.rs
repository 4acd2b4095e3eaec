// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for a scrape run.
//!
//! Every component returns [`ScrapeResult`]; the binary is the single place
//! that decides whether an error ends the run.

/// All errors that can occur while scraping the catalog.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Cannot decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Login failed, the credentials are likely incorrect")]
    Auth,

    #[error("Product {product_id} has no tech sheet data")]
    MissingTechsheet { product_id: i64 },

    #[error("Product {product_id} tech sheet is missing `{field}`")]
    MissingField {
        product_id: i64,
        field: &'static str,
    },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ScrapeError {
    /// True for per-item data-shape errors, the only kind a run may skip past.
    pub fn is_data_shape(&self) -> bool {
        matches!(
            self,
            Self::MissingTechsheet { .. } | Self::MissingField { .. }
        )
    }
}

/// Convenience result type.
pub type ScrapeResult<T> = Result<T, ScrapeError>;
