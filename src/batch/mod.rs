//! Streaming batch validation.
//!
//! A fixed pool of worker threads drains a shared cursor over the addresses;
//! each result goes through a bounded channel to a single coordinator that
//! owns the counters and forwards [`BatchEvent`]s to the consumer through a
//! second bounded channel.

mod error;
mod job;
mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use tracing::{debug, info, warn};

pub use error::BatchError;
pub use job::{BatchJob, CancelToken, JobState};
pub use types::{BatchEvent, BatchOptions, BatchSummary, Progress};

use crate::engine::{Engine, InputError, ValidateOptions, ValidationMode, ValidationResult};

/// Receiving end of a batch run. Iterating blocks until the next event and
/// ends after [`BatchEvent::Complete`].
///
/// Dropping the stream does not stop the run: remaining addresses are still
/// validated and stored.
pub struct BatchStream {
    events: Receiver<BatchEvent>,
    job: Arc<BatchJob>,
    cancel: CancelToken,
}

impl BatchStream {
    pub fn job(&self) -> &Arc<BatchJob> {
        &self.job
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Iterator for BatchStream {
    type Item = BatchEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.recv().ok()
    }
}

struct Outcome {
    email: String,
    result: ValidationResult,
    stored: bool,
}

impl Engine {
    /// Validates `emails` concurrently and streams the results as they
    /// complete. Up to [`BatchOptions::full_mode_limit`] addresses get the
    /// full pipeline, larger batches run in fast mode.
    pub fn validate_batch<I, S>(
        &self,
        emails: I,
        options: ValidateOptions,
    ) -> Result<BatchStream, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let emails: Vec<String> = emails.into_iter().map(Into::into).collect();
        let limits = &self.config().batch;
        if emails.is_empty() {
            return Err(InputError::EmptyBatch.into());
        }
        if emails.len() > limits.max_batch_size {
            return Err(BatchError::LimitExceeded {
                size: emails.len(),
                limit: limits.max_batch_size,
            });
        }

        let total = emails.len();
        let mode = limits.mode_for(total);
        let workers = limits.workers.clamp(1, total);
        let capacity = limits.channel_capacity.max(1);
        info!("batch of {total} addresses, {mode:?} mode, {workers} workers");

        let job = Arc::new(BatchJob::new(total, mode));
        let cancel = CancelToken::new();
        let (outcome_tx, outcome_rx) = mpsc::sync_channel::<Outcome>(capacity);
        let (event_tx, event_rx) = mpsc::sync_channel::<BatchEvent>(capacity);

        let emails = Arc::new(emails);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut spawned = 0usize;
        let mut spawn_error = None;
        for id in 0..workers {
            let worker = Worker {
                engine: self.clone(),
                emails: Arc::clone(&emails),
                cursor: Arc::clone(&cursor),
                cancel: cancel.clone(),
                outcomes: outcome_tx.clone(),
                options,
                mode,
            };
            match thread::Builder::new()
                .name(format!("mailvet-worker-{id}"))
                .spawn(move || worker.run())
            {
                Ok(_) => spawned += 1,
                Err(err) => {
                    warn!("cannot spawn batch worker {id}: {err}");
                    spawn_error = Some(err);
                }
            }
        }
        drop(outcome_tx);
        if spawned == 0 {
            if let Some(source) = spawn_error {
                return Err(BatchError::Spawn { source });
            }
        }

        let coordinator = Coordinator {
            job: Arc::clone(&job),
            cancel: cancel.clone(),
            outcomes: outcome_rx,
            events: event_tx,
        };
        if let Err(source) = thread::Builder::new()
            .name("mailvet-batch".to_string())
            .spawn(move || coordinator.run())
        {
            cancel.cancel();
            return Err(BatchError::Spawn { source });
        }

        Ok(BatchStream {
            events: event_rx,
            job,
            cancel,
        })
    }
}

struct Worker {
    engine: Engine,
    emails: Arc<Vec<String>>,
    cursor: Arc<AtomicUsize>,
    cancel: CancelToken,
    outcomes: SyncSender<Outcome>,
    options: ValidateOptions,
    mode: ValidationMode,
}

impl Worker {
    fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                debug!("worker stopping: batch cancelled");
                return;
            }
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(email) = self.emails.get(index) else {
                return;
            };

            let evaluation = self.engine.evaluate(email, &self.options, self.mode);
            let stored = self.engine.persist(&evaluation.record);
            let outcome = Outcome {
                email: email.clone(),
                result: evaluation.result,
                stored,
            };
            if self.outcomes.send(outcome).is_err() {
                return;
            }
        }
    }
}

struct Coordinator {
    job: Arc<BatchJob>,
    cancel: CancelToken,
    outcomes: Receiver<Outcome>,
    events: SyncSender<BatchEvent>,
}

impl Coordinator {
    fn run(self) {
        self.job.start();
        // le consommateur peut avoir disparu: on continue à drainer quand même
        let _ = self.events.send(BatchEvent::Start {
            total: self.job.total(),
            mode: self.job.mode(),
        });

        for outcome in self.outcomes.iter() {
            let progress = self.job.record(outcome.result.valid, outcome.stored);
            let _ = self.events.send(BatchEvent::Result {
                email: outcome.email,
                result: Box::new(outcome.result),
                stored: outcome.stored,
                progress,
            });
        }

        let summary = self.job.finish(self.cancel.is_cancelled());
        info!(
            "batch done: {}/{} processed, {} valid, {} invalid, {} stored{}",
            summary.processed,
            summary.total,
            summary.valid,
            summary.invalid,
            summary.stored,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        let _ = self.events.send(BatchEvent::Complete(summary));
    }
}
