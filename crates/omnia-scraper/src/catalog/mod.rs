//! Catalog access: paging through a category, fetching tech sheets, and
//! normalizing both into output items.

pub mod assembler;
pub mod paginator;
pub mod techsheet;
pub mod types;
