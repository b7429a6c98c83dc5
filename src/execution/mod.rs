//! # Execution
//!
//! Parallel processing of planned batches: device binding, per-worker processors,
//! cooperative shutdown, the join barrier and order-restoring aggregation.

pub mod aggregator;
pub mod devices;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod shutdown;
pub mod worker;

pub use aggregator::{aggregate, verify_coverage};
pub use devices::{resolve_device_bindings, DeviceBinding};
pub use pipeline::{BatchPipeline, BatchPlan, DispatchPlan, WorkerPlan};
pub use processor::{
    BuiltinProcessorFactory, IdentityProcessor, Processor, ProcessorError, ProcessorFactory,
    ProcessorKind, UppercaseProcessor,
};
pub use report::{BatchFailure, FailureKind, PipelineOutput, RunReport, WorkerSummary};
pub use shutdown::ShutdownSignal;
pub use worker::{Worker, WorkerOutcome};
