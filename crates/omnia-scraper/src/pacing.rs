// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Randomized delay inserted before every tech-sheet request.
//!
//! Fixed jitter only. The delay does not grow on failures and ignores
//! server responses entirely.

use crate::error::{ScrapeError, ScrapeResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound of the default delay, inclusive.
pub const DEFAULT_MIN_DELAY_MS: u64 = 100;

/// Upper bound of the default delay, exclusive.
pub const DEFAULT_MAX_DELAY_MS: u64 = 1100;

/// Uniform delay in the half-open range `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingPolicy {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY_MS, DEFAULT_MAX_DELAY_MS)
    }
}

impl PacingPolicy {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// An empty range has nothing to sample from.
    pub fn validate(&self) -> ScrapeResult<()> {
        if self.min_ms >= self.max_ms {
            return Err(ScrapeError::Config(format!(
                "pacing range [{}, {}) ms is empty",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }

    /// Draw one delay. Falls back to `min_ms` if the range is empty.
    pub fn sample(&self) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleep for one sampled delay.
    pub async fn delay(&self) {
        let wait = self.sample();
        tracing::debug!("pacing: sleeping {}ms", wait.as_millis());
        tokio::time::sleep(wait).await;
    }
}
