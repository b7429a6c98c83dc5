//! Round-robin assignment of batches to worker slots.
//!
//! Balances batch count per worker, not cost. Batches of uneven size can leave
//! one worker with noticeably more work than another.

use tracing::debug;

use crate::config::ConfigurationError;
use crate::error::Result;
use crate::models::{Batch, WorkerAssignment};

/// Assign the batch at position `i` to worker `i % worker_count`.
///
/// Always returns exactly `worker_count` assignments (some possibly empty);
/// each keeps its batches in production order.
pub fn distribute(batches: Vec<Batch>, worker_count: usize) -> Result<Vec<WorkerAssignment>> {
    if worker_count == 0 {
        return Err(ConfigurationError::invalid_value(
            "workers.worker_count",
            "0",
            "worker pool needs at least one worker",
        )
        .into());
    }

    let mut assignments: Vec<WorkerAssignment> =
        (0..worker_count).map(WorkerAssignment::new).collect();

    for (position, batch) in batches.into_iter().enumerate() {
        assignments[position % worker_count].batches.push(batch);
    }

    for assignment in &assignments {
        debug!(
            worker_id = assignment.worker_id,
            batches = assignment.batches.len(),
            items = assignment.item_count(),
            total_cost = assignment.total_cost(),
            "Worker assignment"
        );
    }

    Ok(assignments)
}
