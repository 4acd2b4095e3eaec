// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Catalog records: what the vendor sends and what a run produces.

use serde::{Deserialize, Serialize};

/// One row of a catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Vendor product id; keys the tech-sheet request.
    pub id: i64,
    /// Product code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Image reference.
    pub image: String,
}

/// First general-data entry of a product's tech sheet.
///
/// Either field may be null or missing on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalDetail {
    /// Comma-separated cross-reference codes.
    #[serde(rename = "cross_reference_customer", default)]
    pub original_codes: Option<String>,
    /// Free-text technical description.
    #[serde(default)]
    pub technical_description: Option<String>,
}

/// Normalized output record, one per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub code: String,
    pub original_codes: Vec<String>,
    pub description: String,
    pub image_url: String,
}

// ── Wire shapes ──

/// Body of a `get_productlist` request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProductListRequest<'a> {
    pub category_id: u64,
    pub division_id: &'a str,
    /// Always null; the listing is never filtered by availability.
    #[serde(rename = "onlyAvailable")]
    pub only_available: Option<()>,
    #[serde(rename = "orderBy")]
    pub order_by: &'a str,
    pub page_index: u32,
    pub page_size: u32,
    pub selected_facets: &'a str,
    pub user_search: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductListResponse {
    /// Missing or null reads as an empty page.
    #[serde(default)]
    pub products: Option<Vec<ProductSummary>>,
}

impl ProductListResponse {
    pub fn into_products(self) -> Vec<ProductSummary> {
        self.products.unwrap_or_default()
    }
}

/// Body of a `get_techsheet_data` request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TechsheetRequest {
    pub product_id: String,
    pub filter: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TechsheetRecord {
    #[serde(default)]
    pub data: Option<TechsheetData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TechsheetData {
    #[serde(rename = "dati_generali", default)]
    pub general: Option<Vec<TechnicalDetail>>,
}
