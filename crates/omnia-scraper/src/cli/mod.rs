//! CLI command implementations for the omnia-scraper binary.

pub mod output;
pub mod scrape_cmd;
