//! # Error Types
//!
//! Crate-level error taxonomy for the batch dispatch pipeline.
//!
//! - [`ConfigurationError`] covers invalid budgets, worker counts and field sets.
//!   These fail fast before any batching or distribution occurs.
//! - Processor failures are batch-scoped. Each one is recorded as a
//!   [`BatchFailure`] and, in fail-fast mode, surfaced as [`BatchflowError::RunFailed`]
//!   with enough context (worker, batch index, sequence numbers) to retry exactly
//!   the affected subset.

use thiserror::Error;
use uuid::Uuid;

pub use crate::config::ConfigurationError;
use crate::execution::report::{unprocessed_sequence_nos, BatchFailure};
use crate::models::SequenceNo;

#[derive(Debug, Error)]
pub enum BatchflowError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid work item {sequence_no}: {reason}")]
    InvalidWorkItem {
        sequence_no: SequenceNo,
        reason: String,
    },

    #[error("Input error: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "Run {run_id} failed: {} batch(es) left {} item(s) unprocessed",
        failures.len(),
        failures.iter().map(|f| f.sequence_nos.len()).sum::<usize>()
    )]
    RunFailed {
        run_id: Uuid,
        failures: Vec<BatchFailure>,
    },

    #[error("Aggregation integrity violation: {0}")]
    IntegrityViolation(String),
}

impl BatchflowError {
    /// Sequence numbers that were not processed when this error is a run failure.
    pub fn unprocessed_sequence_nos(&self) -> Vec<SequenceNo> {
        match self {
            BatchflowError::RunFailed { failures, .. } => unprocessed_sequence_nos(failures),
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchflowError>;
