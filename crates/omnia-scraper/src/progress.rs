// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for scrape telemetry.
//!
//! The scraper emits `ProgressEvent`s as it logs in, fetches pages and
//! assembles items. Events flow through a `tokio::sync::broadcast` channel to
//! every subscriber (the CLI status line, tests). When no subscriber exists,
//! events are silently dropped.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A progress event emitted during a scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The login handshake succeeded.
    LoggedIn { username: String },
    /// A catalog page came back. A count of zero ends the listing.
    PageFetched {
        page_index: u32,
        product_count: usize,
    },
    /// A product was enriched and normalized.
    ItemAssembled { product_id: i64, code: String },
    /// A product was dropped because its tech sheet was unusable.
    ItemSkipped { product_id: i64, reason: String },
    /// Something recoverable went wrong, such as a request being retried.
    Warning { message: String },
    /// The run finished. `pages` counts the pages that carried products.
    ScrapeComplete {
        pages: u32,
        items: usize,
        skipped: usize,
        elapsed_ms: u64,
    },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
///
/// A lagging subscriber loses the oldest events, never blocks the run.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Where one run's events go, with the run's own sequence counter.
#[derive(Debug)]
pub struct ProgressSink {
    tx: Option<ProgressSender>,
    run_id: String,
    seq: AtomicU64,
}

impl ProgressSink {
    pub fn new(tx: Option<ProgressSender>, run_id: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self::new(None, String::new())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Emit a progress event, silently ignoring send errors (which occur when no
/// receivers are listening).
pub fn emit(sink: &ProgressSink, event: ProgressEventKind) {
    if let Some(ref sender) = sink.tx {
        let seq = sink.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = sender.send(ProgressEvent {
            run_id: sink.run_id.clone(),
            seq,
            event,
        });
    }
}
