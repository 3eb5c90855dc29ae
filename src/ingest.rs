// vecto-ingest — ingest.rs
// Ingestion orchestrator: reset policy, sequential batch submission,
// outcome recording, progress and cancellation.
// Author: d65v <https://github.com/d65v>

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;

use crate::batch::{partition_with_attributes, Batch};
use crate::item::{Attribute, Item, Modality};
use crate::{IngestOptions, Result, TransportError, VectoError};

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Ids the service assigned to the items of one batch, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchUploadResult {
    #[serde(default)]
    pub ids: Vec<u64>,
}

/// Uploads one batch.
pub trait Transport {
    fn submit(&mut self, batch: Batch<'_>) -> std::result::Result<BatchUploadResult, TransportError>;
}

/// Deletes every entry in the target vector space.
pub trait Reset {
    fn reset_all(&mut self) -> std::result::Result<(), TransportError>;
}

/// Advisory progress hook, called once per finished batch.
pub trait ProgressObserver {
    fn on_progress(&mut self, completed: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressObserver for F {
    fn on_progress(&mut self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _completed: usize, _total: usize) {}
}

/// Observer that logs progress at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, completed: usize, total: usize) {
        log::info!("ingested batch {}/{}", completed, total);
    }
}

/// Cooperative cancellation flag, honoured between batches only.
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

// ── Report ────────────────────────────────────────────────────────────────────

/// What to do after a batch fails to upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and keep going.
    #[default]
    Continue,
    /// Stop after the first failed batch.
    FailFast,
}

/// Result of one batch, at the position it was submitted.
#[derive(Debug)]
pub enum IngestOutcome {
    Success {
        batch_index: usize,
        len: usize,
        result: BatchUploadResult,
    },
    Failure {
        batch_index: usize,
        len: usize,
        error: TransportError,
    },
}

impl IngestOutcome {
    pub fn batch_index(&self) -> usize {
        match self {
            IngestOutcome::Success { batch_index, .. } | IngestOutcome::Failure { batch_index, .. } => {
                *batch_index
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IngestOutcome::Success { .. })
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every batch was attempted (or ingestion was skipped).
    Completed,
    /// The cancel token fired; only finished batches are reported.
    Cancelled,
    /// `FailurePolicy::FailFast` stopped the run after a failure.
    AbortedOnFailure,
}

/// Ordered per-batch outcomes of one ingestion run.
///
/// Partial failure does not fail the run: check [`IngestionReport::is_success`]
/// or [`IngestionReport::failures`].
#[derive(Debug)]
pub struct IngestionReport {
    pub outcomes: Vec<IngestOutcome>,
    pub total_batches: usize,
    pub termination: Termination,
}

impl IngestionReport {
    fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            total_batches: 0,
            termination: Termination::Completed,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when every planned batch ran and none failed.
    pub fn is_success(&self) -> bool {
        self.termination == Termination::Completed && self.outcomes.iter().all(IngestOutcome::is_success)
    }

    /// `(batch_index, error)` for every failed batch.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &TransportError)> {
        self.outcomes.iter().filter_map(|o| match o {
            IngestOutcome::Failure { batch_index, error, .. } => Some((*batch_index, error)),
            IngestOutcome::Success { .. } => None,
        })
    }

    /// Ids assigned across all successful batches, in submission order.
    pub fn ingested_ids(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                IngestOutcome::Success { result, .. } => Some(result.ids.iter().copied()),
                IngestOutcome::Failure { .. } => None,
            })
            .flatten()
            .collect()
    }

    /// Number of items in batches that uploaded.
    pub fn items_ingested(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                IngestOutcome::Success { len, .. } => *len,
                IngestOutcome::Failure { .. } => 0,
            })
            .sum()
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Runs batched ingestion against injected collaborators.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    options: IngestOptions,
    cancel: Option<CancelToken>,
}

impl Ingestor {
    pub fn new(options: IngestOptions) -> Self {
        Self { options, cancel: None }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Ingest `items` (with optional lock-step `attributes`) one batch at a time.
    ///
    /// # Errors
    /// * `ConfigError`, `LengthMismatch`, `ModalityMismatch` before any
    ///   network call.
    /// * `ResetFailed` if deleting existing entries fails; nothing is uploaded.
    ///
    /// Per-batch transport failures never surface here; they are recorded in
    /// the returned report.
    pub fn run<T, R, P>(
        &self,
        transport: &mut T,
        reset: &mut R,
        observer: &mut P,
        modality: Modality,
        items: &[Item],
        attributes: Option<&[Attribute]>,
    ) -> Result<IngestionReport>
    where
        T: Transport + ?Sized,
        R: Reset + ?Sized,
        P: ProgressObserver + ?Sized,
    {
        self.options.validate()?;
        let chunks = partition_with_attributes(items, attributes, self.options.batch_size)?;

        if let Some((index, item)) = items.iter().enumerate().find(|(_, i)| i.modality() != modality) {
            return Err(VectoError::ModalityMismatch {
                index,
                expected: modality,
                got: item.modality(),
            });
        }

        if self.options.skip_ingestion {
            log::info!("skip_ingestion set; not touching the vector space");
            return Ok(IngestionReport::empty());
        }

        if self.options.delete_existing {
            log::info!("deleting existing vector space entries");
            reset.reset_all().map_err(|e| {
                log::error!("reset failed, aborting ingestion: {}", e);
                VectoError::ResetFailed(e)
            })?;
        }

        let total = chunks.len();
        let mut report = IngestionReport {
            outcomes: Vec::with_capacity(total),
            total_batches: total,
            termination: Termination::Completed,
        };

        log::info!(
            "ingesting {} {} items in {} batches (batch_size={})",
            items.len(),
            modality,
            total,
            self.options.batch_size
        );

        for chunk in &chunks {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                log::warn!("ingestion cancelled after {}/{} batches", report.len(), total);
                report.termination = Termination::Cancelled;
                break;
            }

            let len = chunk.items.len();
            // The batch is moved into the transport and dropped when it returns.
            let result = Batch::open(chunk, modality)
                .map_err(TransportError::from)
                .and_then(|batch| transport.submit(batch));

            let failed = result.is_err();
            let outcome = match result {
                Ok(result) => {
                    log::debug!("batch {} ok ({} items)", chunk.index, len);
                    IngestOutcome::Success {
                        batch_index: chunk.index,
                        len,
                        result,
                    }
                }
                Err(error) => {
                    log::warn!("batch {} failed: {}", chunk.index, error);
                    IngestOutcome::Failure {
                        batch_index: chunk.index,
                        len,
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
            observer.on_progress(report.len(), total);

            if failed && self.options.failure_policy == FailurePolicy::FailFast {
                log::warn!("fail-fast: stopping after batch {}", chunk.index);
                report.termination = Termination::AbortedOnFailure;
                break;
            }
        }

        log::info!(
            "ingestion finished: {}/{} batches ok, {} items",
            report.outcomes.iter().filter(|o| o.is_success()).count(),
            total,
            report.items_ingested()
        );

        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
