//! Category listing, one fixed-size page at a time.
//!
//! The stream asks for page 1, 2, 3, ... and ends at the first page with no
//! products. There is no page cap and no duplicate detection: an endpoint
//! that never returns an empty page keeps the stream alive.

use crate::acquisition::http_client::HttpClient;
use crate::catalog::types::{ProductListRequest, ProductListResponse, ProductSummary};
use crate::error::ScrapeResult;
use crate::progress::{self, ProgressEventKind, ProgressSink};
use futures::Stream;
use reqwest::Method;

pub const PRODUCT_LIST_ENDPOINT: &str = "api/v1/public/get_productlist";

/// Products per page requested from the vendor.
pub const PAGE_SIZE: u32 = 20;

/// The only division the catalog is queried for.
pub const DIVISION_ID: &str = "1";

/// Listing order; pages come back cheapest first.
pub const ORDER_BY: &str = "price asc";

pub(crate) fn page_request(category_id: u64, page_index: u32) -> ProductListRequest<'static> {
    ProductListRequest {
        category_id,
        division_id: DIVISION_ID,
        only_available: None,
        order_by: ORDER_BY,
        page_index,
        page_size: PAGE_SIZE,
        selected_facets: "",
        user_search: "",
    }
}

/// Fetch a single page of the category listing.
pub async fn fetch_page(
    client: &HttpClient,
    category_id: u64,
    page_index: u32,
) -> ScrapeResult<Vec<ProductSummary>> {
    let request = page_request(category_id, page_index);
    let resp: ProductListResponse = client
        .send(Method::POST, PRODUCT_LIST_ENDPOINT, &request)
        .await?;
    Ok(resp.into_products())
}

/// Every product of `category_id`, in vendor page order, tagged with the
/// index of the page it came from.
///
/// Each call starts over at page 1. A failed page yields one `Err` and
/// ends the stream.
pub fn list_products<'a>(
    client: &'a HttpClient,
    category_id: u64,
    progress: &'a ProgressSink,
) -> impl Stream<Item = ScrapeResult<(u32, ProductSummary)>> + 'a {
    async_stream::try_stream! {
        let mut page_index: u32 = 1;
        loop {
            let products = fetch_page(client, category_id, page_index).await?;
            tracing::info!(
                "category {category_id} page {page_index}: {} products",
                products.len()
            );
            progress::emit(
                progress,
                ProgressEventKind::PageFetched {
                    page_index,
                    product_count: products.len(),
                },
            );

            if products.is_empty() {
                break;
            }
            for product in products {
                yield (page_index, product);
            }
            page_index += 1;
        }
    }
}
