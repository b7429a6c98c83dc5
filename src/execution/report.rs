//! Run reporting: per-worker summaries and batch-scoped failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::FailurePolicy;
use crate::models::{Batch, Record, SequenceNo};

/// Why a batch produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The worker's processor could not be constructed
    Initialization,
    /// The processor call returned an error
    Processor,
    /// The processor returned a different number of texts than it was given
    LengthMismatch,
    /// Never started because shutdown was requested after another failure
    Cancelled,
    /// The worker task panicked; none of its output survived
    WorkerPanicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Initialization => "initialization",
            FailureKind::Processor => "processor",
            FailureKind::LengthMismatch => "length_mismatch",
            FailureKind::Cancelled => "cancelled",
            FailureKind::WorkerPanicked => "worker_panicked",
        };
        write!(f, "{name}")
    }
}

/// One batch whose items were not emitted, with everything needed to retry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub worker_id: usize,
    pub batch_index: usize,
    pub device: String,
    pub sequence_nos: Vec<SequenceNo>,
    pub kind: FailureKind,
    pub message: String,
}

impl BatchFailure {
    pub fn for_batch(
        batch: &Batch,
        worker_id: usize,
        device: &str,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            worker_id,
            batch_index: batch.index,
            device: device.to_string(),
            sequence_nos: batch.sequence_nos(),
            kind,
            message: message.into(),
        }
    }

    /// Inclusive `(first, last)` sequence numbers of the batch
    pub fn sequence_range(&self) -> Option<(SequenceNo, SequenceNo)> {
        Some((*self.sequence_nos.first()?, *self.sequence_nos.last()?))
    }
}

/// Sorted sequence numbers covered by `failures`
pub fn unprocessed_sequence_nos(failures: &[BatchFailure]) -> Vec<SequenceNo> {
    let mut seqs: Vec<SequenceNo> = failures
        .iter()
        .flat_map(|f| f.sequence_nos.iter().copied())
        .collect();
    seqs.sort_unstable();
    seqs
}

/// What one worker did during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub device: String,
    pub batches_assigned: usize,
    pub batches_completed: usize,
    pub items_processed: usize,
    pub duration_ms: u64,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_items: usize,
    pub total_batches: usize,
    pub oversized_batches: usize,
    pub worker_count: usize,
    pub failure_policy: FailurePolicy,
    pub workers: Vec<WorkerSummary>,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sorted sequence numbers of every item that was not emitted
    pub fn unprocessed_sequence_nos(&self) -> Vec<SequenceNo> {
        unprocessed_sequence_nos(&self.failures)
    }

    pub fn items_processed(&self) -> usize {
        self.workers.iter().map(|w| w.items_processed).sum()
    }
}

/// Records in original input order plus the run report
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub report: RunReport,
}
