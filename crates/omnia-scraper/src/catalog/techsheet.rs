//! Tech-sheet lookup for a single product.

use crate::acquisition::http_client::HttpClient;
use crate::catalog::types::{TechnicalDetail, TechsheetRecord, TechsheetRequest};
use crate::error::{ScrapeError, ScrapeResult};
use reqwest::Method;

pub const TECHSHEET_ENDPOINT: &str = "api/v1/public/get_techsheet_data";

/// Fetch the first general-data entry of the first tech-sheet record.
///
/// An empty record list or an empty general-data list is
/// [`ScrapeError::MissingTechsheet`].
pub async fn fetch_detail(client: &HttpClient, product_id: i64) -> ScrapeResult<TechnicalDetail> {
    let request = TechsheetRequest {
        product_id: product_id.to_string(),
        filter: Vec::new(),
    };
    let records: Option<Vec<TechsheetRecord>> = client
        .send(Method::POST, TECHSHEET_ENDPOINT, &request)
        .await?;

    first_general_entry(product_id, records.unwrap_or_default())
}

pub(crate) fn first_general_entry(
    product_id: i64,
    records: Vec<TechsheetRecord>,
) -> ScrapeResult<TechnicalDetail> {
    records
        .into_iter()
        .next()
        .and_then(|record| record.data)
        .and_then(|data| data.general)
        .and_then(|general| general.into_iter().next())
        .ok_or(ScrapeError::MissingTechsheet { product_id })
}
