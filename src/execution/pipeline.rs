//! # Batch Pipeline
//!
//! Coordinates one run end to end:
//!
//! ```text
//! items -> build_batches -> distribute -> W spawned Workers -> join barrier -> aggregate
//! ```
//!
//! Assignment is static and fully decided before any worker starts. Workers run
//! as independent tokio tasks with private output buffers; the only shared state
//! is the [`ShutdownSignal`]. Ownership of every buffer moves back to the
//! coordinator at the join barrier, so the merge needs no locking.

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::aggregator::{aggregate, verify_coverage};
use super::devices::{resolve_device_bindings, DeviceBinding};
use super::processor::ProcessorFactory;
use super::report::{
    unprocessed_sequence_nos, BatchFailure, FailureKind, PipelineOutput, RunReport, WorkerSummary,
};
use super::shutdown::ShutdownSignal;
use super::worker::Worker;
use crate::batching::{build_batches, distribute, CostEstimator};
use crate::config::{BatchflowConfig, FailurePolicy};
use crate::error::{BatchflowError, Result};
use crate::logging::log_error;
use crate::models::{FieldSet, Record, SequenceNo, WorkItem};

/// The scheduler: configuration, cost estimator and processor factory for runs
pub struct BatchPipeline {
    config: BatchflowConfig,
    fields: Arc<FieldSet>,
    worker_count: usize,
    estimator: Arc<dyn CostEstimator>,
    factory: Arc<dyn ProcessorFactory>,
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("config", &self.config)
            .field("worker_count", &self.worker_count)
            .finish_non_exhaustive()
    }
}

/// One batch in a dry-run plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub index: usize,
    pub worker_id: usize,
    pub items: usize,
    pub cost: usize,
    pub oversized: bool,
    pub first_sequence_no: Option<SequenceNo>,
    pub last_sequence_no: Option<SequenceNo>,
}

/// One worker slot in a dry-run plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPlan {
    pub worker_id: usize,
    pub device: String,
    pub batch_indices: Vec<usize>,
    pub items: usize,
    pub total_cost: usize,
}

/// What a run would do, without invoking any processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub total_items: usize,
    pub total_cost: usize,
    pub max_batch_cost: usize,
    pub batches: Vec<BatchPlan>,
    pub workers: Vec<WorkerPlan>,
}

impl BatchPipeline {
    /// Validate configuration and build a pipeline. Fails fast on bad configuration.
    pub fn new(
        config: BatchflowConfig,
        estimator: Arc<dyn CostEstimator>,
        factory: Arc<dyn ProcessorFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let fields = Arc::new(FieldSet::new(config.batching.fields.clone())?);
        let worker_count = config.workers.effective_worker_count();

        Ok(Self {
            config,
            fields,
            worker_count,
            estimator,
            factory,
        })
    }

    pub fn config(&self) -> &BatchflowConfig {
        &self.config
    }

    pub fn fields(&self) -> Arc<FieldSet> {
        self.fields.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Assign sequence numbers to records in read order
    pub fn ingest(&self, records: Vec<Record>) -> Result<Vec<WorkItem>> {
        crate::io::ingest(records, &self.fields)
    }

    /// Batch and distribute without processing
    pub fn plan(&self, items: Vec<WorkItem>) -> Result<DispatchPlan> {
        let total_items = items.len();
        let max_batch_cost = self.config.batching.max_batch_cost;
        let batches = build_batches(items, self.estimator.as_ref(), max_batch_cost)?;
        let total_cost = batches.iter().map(|b| b.cost).sum();
        let assignments = distribute(batches, self.worker_count)?;
        let bindings = resolve_device_bindings(&self.config.workers.device_ids, self.worker_count)?;

        let mut batch_plans: Vec<BatchPlan> = assignments
            .iter()
            .flat_map(|assignment| {
                assignment.batches.iter().map(move |batch| {
                    let seqs = batch.sequence_nos();
                    BatchPlan {
                        index: batch.index,
                        worker_id: assignment.worker_id,
                        items: batch.len(),
                        cost: batch.cost,
                        oversized: batch.is_oversized(max_batch_cost),
                        first_sequence_no: seqs.first().copied(),
                        last_sequence_no: seqs.last().copied(),
                    }
                })
            })
            .collect();
        batch_plans.sort_by_key(|b| b.index);

        let workers = assignments
            .iter()
            .zip(&bindings)
            .map(|(assignment, binding)| WorkerPlan {
                worker_id: assignment.worker_id,
                device: binding.device_id.clone(),
                batch_indices: assignment.batch_indices(),
                items: assignment.item_count(),
                total_cost: assignment.total_cost(),
            })
            .collect();

        Ok(DispatchPlan {
            total_items,
            total_cost,
            max_batch_cost,
            batches: batch_plans,
            workers,
        })
    }

    /// Ingest records and run them through the pipeline
    pub async fn run_records(&self, records: Vec<Record>) -> Result<PipelineOutput> {
        let items = self.ingest(records)?;
        self.run(items).await
    }

    /// Process `items` (sequence numbers `0..n` in order) and return records in input order.
    ///
    /// Under [`FailurePolicy::FailFast`] any batch failure yields
    /// [`BatchflowError::RunFailed`]. Under [`FailurePolicy::Degraded`] the output
    /// holds every successfully processed record and the report lists the rest.
    #[instrument(skip(self, items), fields(items = items.len(), workers = self.worker_count))]
    pub async fn run(&self, items: Vec<WorkItem>) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let policy = self.config.workers.failure_policy;
        let max_batch_cost = self.config.batching.max_batch_cost;

        check_sequence_numbers(&items)?;
        let total_items = items.len();

        let batches = build_batches(items, self.estimator.as_ref(), max_batch_cost)?;
        let total_batches = batches.len();
        let oversized_batches = batches
            .iter()
            .filter(|b| b.is_oversized(max_batch_cost))
            .count();

        let assignments = distribute(batches, self.worker_count)?;
        let bindings = resolve_device_bindings(&self.config.workers.device_ids, self.worker_count)?;

        info!(
            run_id = %run_id,
            total_items,
            total_batches,
            oversized_batches,
            worker_count = self.worker_count,
            failure_policy = %policy,
            "Starting batch pipeline run"
        );

        // Everything a worker was given, for reporting if its task dies
        let manifests: Vec<Vec<BatchFailure>> = assignments
            .iter()
            .zip(&bindings)
            .map(|(assignment, binding)| {
                assignment
                    .batches
                    .iter()
                    .map(|batch| {
                        BatchFailure::for_batch(
                            batch,
                            assignment.worker_id,
                            &binding.device_id,
                            FailureKind::WorkerPanicked,
                            "worker task panicked; its output was lost",
                        )
                    })
                    .collect()
            })
            .collect();

        let shutdown = ShutdownSignal::new();
        let handles: Vec<_> = assignments
            .into_iter()
            .zip(bindings.iter().cloned())
            .map(|(assignment, binding)| {
                let worker = Worker::new(
                    run_id,
                    binding,
                    self.fields.clone(),
                    policy,
                    shutdown.clone(),
                );
                let factory = self.factory.clone();
                let signal = shutdown.clone();
                tokio::spawn(async move {
                    let result = AssertUnwindSafe(worker.run(assignment, factory))
                        .catch_unwind()
                        .await;
                    if result.is_err() && policy == FailurePolicy::FailFast {
                        signal.trigger();
                    }
                    result
                })
            })
            .collect();

        let results = join_all(handles).await;

        let mut buffers: Vec<Vec<WorkItem>> = Vec::with_capacity(results.len());
        let mut failures: Vec<BatchFailure> = Vec::new();
        let mut workers: Vec<WorkerSummary> = Vec::with_capacity(results.len());

        for ((result, manifest), binding) in results.into_iter().zip(manifests).zip(&bindings) {
            match result {
                Ok(Ok(outcome)) => {
                    workers.push(outcome.summary());
                    failures.extend(outcome.failures);
                    buffers.push(outcome.processed);
                }
                Ok(Err(_)) | Err(_) => {
                    log_error(
                        "pipeline",
                        "join_worker",
                        "worker task panicked",
                        Some(binding.to_string().as_str()),
                    );
                    workers.push(lost_worker_summary(binding, manifest.len()));
                    failures.extend(manifest);
                }
            }
        }
        failures.sort_by_key(|f| f.batch_index);

        let emitted: Vec<SequenceNo> = buffers
            .iter()
            .flatten()
            .map(WorkItem::sequence_no)
            .collect();
        let failed = unprocessed_sequence_nos(&failures);
        verify_coverage(&emitted, &failed, total_items)?;

        let records = aggregate(buffers)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let report = RunReport {
            run_id,
            started_at,
            duration_ms,
            total_items,
            total_batches,
            oversized_batches,
            worker_count: self.worker_count,
            failure_policy: policy,
            workers,
            failures,
        };

        if report.is_complete() {
            info!(
                run_id = %run_id,
                records = records.len(),
                duration_ms,
                "Batch pipeline run completed"
            );
            return Ok(PipelineOutput { records, report });
        }

        warn!(
            run_id = %run_id,
            failed_batches = report.failures.len(),
            unprocessed_items = failed.len(),
            failure_policy = %policy,
            "Batch pipeline run finished with failures"
        );

        match policy {
            FailurePolicy::FailFast => Err(BatchflowError::RunFailed {
                run_id,
                failures: report.failures,
            }),
            FailurePolicy::Degraded => Ok(PipelineOutput { records, report }),
        }
    }
}

fn check_sequence_numbers(items: &[WorkItem]) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        if item.sequence_no() != position as SequenceNo {
            return Err(BatchflowError::InvalidInput(format!(
                "work item at position {position} has sequence number {}; expected gap-free numbering from 0",
                item.sequence_no()
            )));
        }
    }
    Ok(())
}

fn lost_worker_summary(binding: &DeviceBinding, batches_assigned: usize) -> WorkerSummary {
    WorkerSummary {
        worker_id: binding.worker_id,
        device: binding.device_id.clone(),
        batches_assigned,
        batches_completed: 0,
        items_processed: 0,
        duration_ms: 0,
    }
}
