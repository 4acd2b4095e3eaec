//! Merge a catalog row and its tech sheet into an output [`Item`].

use crate::catalog::types::{Item, ProductSummary, TechnicalDetail};
use crate::error::{ScrapeError, ScrapeResult};

/// Build the output record for `product`.
///
/// Original codes are split on every literal `,` and never trimmed. The
/// description is the product name followed directly by the technical
/// description, with no separator.
pub fn assemble(product: &ProductSummary, detail: &TechnicalDetail) -> ScrapeResult<Item> {
    let codes = detail
        .original_codes
        .as_deref()
        .ok_or(ScrapeError::MissingField {
            product_id: product.id,
            field: "cross_reference_customer",
        })?;
    let technical = detail
        .technical_description
        .as_deref()
        .ok_or(ScrapeError::MissingField {
            product_id: product.id,
            field: "technical_description",
        })?;

    Ok(Item {
        code: product.code.clone(),
        original_codes: split_codes(codes),
        description: format!("{}{}", product.name, technical),
        image_url: product.image.clone(),
    })
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}
