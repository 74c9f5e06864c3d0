use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{ValidationMode, ValidationResult};

/// Limits and sizing of batch runs.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Larger batches are refused before any work starts.
    pub max_batch_size: usize,
    /// Batches up to this size run the full pipeline; larger ones run fast.
    pub full_mode_limit: usize,
    pub workers: usize,
    /// Capacity of both internal channels.
    pub channel_capacity: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_batch_size: 5_000,
            full_mode_limit: 100,
            workers: 8,
            channel_capacity: 64,
        }
    }
}

impl BatchOptions {
    pub fn mode_for(&self, size: usize) -> ValidationMode {
        if size <= self.full_mode_limit {
            ValidationMode::Full
        } else {
            ValidationMode::Fast
        }
    }
}

/// Where a batch stands after one more address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub percent: f64,
    pub elapsed_ms: u64,
    /// Linear extrapolation from the average time per address so far.
    pub estimated_remaining_ms: Option<u64>,
    pub valid: usize,
    pub invalid: usize,
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub stored: usize,
    pub cancelled: bool,
    #[cfg_attr(feature = "with-serde", serde(rename = "elapsed_ms", with = "crate::engine::duration_ms"))]
    pub elapsed: Duration,
}

/// What a [`BatchStream`](super::BatchStream) yields: one `Start`, one
/// `Result` per completed address, one `Complete`.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "event", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Start {
        total: usize,
        mode: ValidationMode,
    },
    Result {
        email: String,
        result: Box<ValidationResult>,
        stored: bool,
        progress: Progress,
    },
    Complete(BatchSummary),
}
