use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use super::{BatchSummary, Progress};
use crate::engine::ValidationMode;

/// Cooperative cancellation of a batch: workers stop taking new addresses,
/// results already computed are still stored and reported.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Streaming,
    Complete,
    Cancelled,
}

/// Counters of a batch run. Only ever incremented.
#[derive(Debug)]
pub struct BatchJob {
    total: usize,
    mode: ValidationMode,
    processed: AtomicUsize,
    valid: AtomicUsize,
    invalid: AtomicUsize,
    stored: AtomicUsize,
    state: Mutex<JobState>,
    started: Instant,
}

impl BatchJob {
    pub(crate) fn new(total: usize, mode: ValidationMode) -> Self {
        Self {
            total,
            mode,
            processed: AtomicUsize::new(0),
            valid: AtomicUsize::new(0),
            invalid: AtomicUsize::new(0),
            stored: AtomicUsize::new(0),
            state: Mutex::new(JobState::NotStarted),
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn valid_count(&self) -> usize {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.load(Ordering::SeqCst)
    }

    pub fn stored_count(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> JobState {
        *self.state.lock()
    }

    pub(crate) fn start(&self) {
        let mut state = self.state.lock();
        if *state == JobState::NotStarted {
            *state = JobState::Streaming;
        }
    }

    /// Counts one completed address.
    pub(crate) fn record(&self, valid: bool, stored: bool) -> Progress {
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        if valid {
            self.valid.fetch_add(1, Ordering::SeqCst);
        } else {
            self.invalid.fetch_add(1, Ordering::SeqCst);
        }
        if stored {
            self.stored.fetch_add(1, Ordering::SeqCst);
        }

        let elapsed = self.started.elapsed();
        let remaining = self.total.saturating_sub(processed);
        let estimated_remaining_ms = (processed > 0).then(|| {
            let per_item = elapsed.as_millis() as f64 / processed as f64;
            (per_item * remaining as f64).round() as u64
        });
        let percent = if self.total == 0 {
            100.0
        } else {
            (processed as f64 * 1000.0 / self.total as f64).round() / 10.0
        };

        Progress {
            processed,
            total: self.total,
            percent,
            elapsed_ms: elapsed.as_millis() as u64,
            estimated_remaining_ms,
            valid: self.valid_count(),
            invalid: self.invalid_count(),
        }
    }

    /// Final state. `cancelled` only sticks when addresses were left over.
    pub(crate) fn finish(&self, cancel_requested: bool) -> BatchSummary {
        let processed = self.processed();
        let cancelled = cancel_requested && processed < self.total;
        *self.state.lock() = if cancelled {
            JobState::Cancelled
        } else {
            JobState::Complete
        };
        BatchSummary {
            total: self.total,
            processed,
            valid: self.valid_count(),
            invalid: self.invalid_count(),
            stored: self.stored_count(),
            cancelled,
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_progress() {
        let job = BatchJob::new(4, ValidationMode::Full);
        assert_eq!(job.state(), JobState::NotStarted);
        job.start();
        assert_eq!(job.state(), JobState::Streaming);

        let first = job.record(true, true);
        assert_eq!(first.processed, 1);
        assert_eq!(first.percent, 25.0);
        let second = job.record(false, false);
        assert_eq!((second.valid, second.invalid), (1, 1));
        assert_eq!(job.stored_count(), 1);

        let summary = job.finish(false);
        assert!(!summary.cancelled);
        assert_eq!(summary.processed, 2);
        assert_eq!(job.state(), JobState::Complete);
    }

    #[test]
    fn cancellation_sticks_only_with_leftovers() {
        let job = BatchJob::new(1, ValidationMode::Fast);
        job.record(true, true);
        assert!(!job.finish(true).cancelled);

        let job = BatchJob::new(3, ValidationMode::Fast);
        job.record(true, true);
        assert!(job.finish(true).cancelled);
        assert_eq!(job.state(), JobState::Cancelled);
    }

    #[test]
    fn token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
