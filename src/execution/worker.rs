//! # Worker
//!
//! One unit of parallel execution. A worker owns its device binding, builds its
//! own processor, walks its assigned batches in order and collects processed
//! items into a buffer nobody else touches until the join barrier.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::devices::DeviceBinding;
use super::processor::{Processor, ProcessorError, ProcessorFactory};
use super::report::{BatchFailure, FailureKind, WorkerSummary};
use super::shutdown::ShutdownSignal;
use crate::config::FailurePolicy;
use crate::logging::{log_batch_operation, log_error, log_worker_operation};
use crate::models::{Batch, FieldSet, WorkItem, WorkerAssignment};

/// Everything a worker hands back at the join barrier
#[derive(Debug)]
pub struct WorkerOutcome {
    pub worker_id: usize,
    pub device: String,
    /// Processed items in batch order, then within-batch order
    pub processed: Vec<WorkItem>,
    pub failures: Vec<BatchFailure>,
    pub batches_assigned: usize,
    pub batches_completed: usize,
    pub duration_ms: u64,
}

impl WorkerOutcome {
    fn new(binding: &DeviceBinding, batches_assigned: usize) -> Self {
        Self {
            worker_id: binding.worker_id,
            device: binding.device_id.clone(),
            processed: Vec::new(),
            failures: Vec::new(),
            batches_assigned,
            batches_completed: 0,
            duration_ms: 0,
        }
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            worker_id: self.worker_id,
            device: self.device.clone(),
            batches_assigned: self.batches_assigned,
            batches_completed: self.batches_completed,
            items_processed: self.processed.len(),
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Worker {
    run_id: Uuid,
    binding: DeviceBinding,
    fields: Arc<FieldSet>,
    policy: FailurePolicy,
    shutdown: ShutdownSignal,
}

impl Worker {
    pub fn new(
        run_id: Uuid,
        binding: DeviceBinding,
        fields: Arc<FieldSet>,
        policy: FailurePolicy,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            run_id,
            binding,
            fields,
            policy,
            shutdown,
        }
    }

    /// Process the assignment to completion (or until shutdown) and return the buffer
    #[instrument(
        skip(self, assignment, factory),
        fields(
            run_id = %self.run_id,
            worker_id = self.binding.worker_id,
            device = %self.binding.device_id
        )
    )]
    pub async fn run(
        self,
        assignment: WorkerAssignment,
        factory: Arc<dyn ProcessorFactory>,
    ) -> WorkerOutcome {
        let started = Instant::now();
        let run_id = self.run_id.to_string();
        let worker_id = self.binding.worker_id;
        let device = self.binding.device_id.clone();
        let mut outcome = WorkerOutcome::new(&self.binding, assignment.batches.len());

        log_worker_operation("start", &run_id, worker_id, &device, "starting", None);

        let mut processor = match factory.create(&self.binding).await {
            Ok(processor) => processor,
            Err(error) => {
                let message = error.to_string();
                log_error(
                    "worker",
                    "create_processor",
                    &message,
                    Some(self.binding.to_string().as_str()),
                );
                outcome.failures = assignment
                    .batches
                    .iter()
                    .map(|batch| {
                        BatchFailure::for_batch(
                            batch,
                            worker_id,
                            &device,
                            FailureKind::Initialization,
                            message.clone(),
                        )
                    })
                    .collect();
                self.request_shutdown();
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                return outcome;
            }
        };

        let mut batches = assignment.batches.into_iter();
        while let Some(mut batch) = batches.next() {
            if self.shutdown.is_triggered() {
                let remaining = std::iter::once(batch).chain(batches.by_ref());
                outcome.failures.extend(remaining.map(|b| {
                    BatchFailure::for_batch(
                        &b,
                        worker_id,
                        &device,
                        FailureKind::Cancelled,
                        "shutdown requested before batch started",
                    )
                }));
                warn!(
                    cancelled = outcome.failures.len(),
                    "Shutdown requested; remaining batches cancelled"
                );
                break;
            }

            match self.process_batch(processor.as_mut(), &mut batch).await {
                Ok(()) => {
                    log_batch_operation(
                        "process",
                        &run_id,
                        worker_id,
                        batch.index,
                        batch.len(),
                        "completed",
                        None,
                    );
                    outcome.batches_completed += 1;
                    outcome.processed.extend(batch.items);
                }
                Err(error) => {
                    let kind = match error {
                        ProcessorError::LengthMismatch { .. } => FailureKind::LengthMismatch,
                        ProcessorError::Initialization { .. } => FailureKind::Initialization,
                        ProcessorError::Failed(_) => FailureKind::Processor,
                    };
                    let message = error.to_string();
                    log_batch_operation(
                        "process",
                        &run_id,
                        worker_id,
                        batch.index,
                        batch.len(),
                        "failed",
                        Some(message.as_str()),
                    );
                    outcome.failures.push(BatchFailure::for_batch(
                        &batch, worker_id, &device, kind, message,
                    ));
                    self.request_shutdown();
                }
            }
        }

        outcome.duration_ms = started.elapsed().as_millis() as u64;
        let details = format!(
            "{}/{} batches, {} items",
            outcome.batches_completed,
            outcome.batches_assigned,
            outcome.processed.len()
        );
        log_worker_operation("finish", &run_id, worker_id, &device, "finished", Some(details.as_str()));

        outcome
    }

    /// Run every field of `batch` through the processor, then write results back.
    ///
    /// Nothing is written unless every field call succeeded with a matching length.
    async fn process_batch(
        &self,
        processor: &mut dyn Processor,
        batch: &mut Batch,
    ) -> Result<(), ProcessorError> {
        let mut transformed = Vec::with_capacity(self.fields.len());

        for (position, field) in self.fields.iter().enumerate() {
            let texts = batch.texts_for(position);
            let output = processor.process(&texts).await?;
            if output.len() != texts.len() {
                return Err(ProcessorError::LengthMismatch {
                    field: field.to_string(),
                    expected: texts.len(),
                    actual: output.len(),
                });
            }
            debug!(
                batch_index = batch.index,
                field = field,
                texts = texts.len(),
                "Field processed"
            );
            transformed.push(output);
        }

        for (position, output) in transformed.into_iter().enumerate() {
            for (item, text) in batch.items.iter_mut().zip(output) {
                item.set_text(position, text);
            }
        }

        Ok(())
    }

    fn request_shutdown(&self) {
        if self.policy == FailurePolicy::FailFast && self.shutdown.trigger() {
            warn!(
                worker_id = self.binding.worker_id,
                "Fail-fast policy: signalling all workers to stop"
            );
        }
    }
}
