//! Item sink: the run's deliverable, written as JSON or JSON Lines.

use crate::catalog::types::Item;
use crate::error::ScrapeResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialization of the item collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One pretty-printed JSON array.
    #[default]
    Json,
    /// One compact JSON object per line.
    Jsonl,
}

/// Write `items` to `writer` in order.
pub fn write_items<W: Write>(items: &[Item], format: OutputFormat, mut writer: W) -> ScrapeResult<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, items)?;
            writeln!(writer)?;
        }
        OutputFormat::Jsonl => {
            for item in items {
                serde_json::to_writer(&mut writer, item)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write `items` to a file, creating parent directories as needed.
pub fn write_items_to_path(items: &[Item], format: OutputFormat, path: &Path) -> ScrapeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_items(items, format, BufWriter::new(file))?;
    tracing::info!("wrote {} items to {}", items.len(), path.display());
    Ok(())
}

/// Write `items` to stdout.
pub fn write_items_to_stdout(items: &[Item], format: OutputFormat) -> ScrapeResult<()> {
    let stdout = std::io::stdout();
    write_items(items, format, stdout.lock())
}
