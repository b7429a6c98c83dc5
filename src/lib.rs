#![allow(clippy::doc_markdown)] // Allow technical terms like JSONL, GPU in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batchflow Core
//!
//! Token-budgeted batch scheduler for expensive, batch-friendly text processors
//! such as model inference.
//!
//! ## Overview
//!
//! A run takes an ordered list of records, each carrying one or more text fields,
//! and pushes every text through an external [`execution::Processor`]. The crate
//! owns the scheduling around that call:
//!
//! 1. Greedy, order-preserving packing of work items into batches under a cost budget
//! 2. Static round-robin assignment of batches to `W` worker slots
//! 3. One independent worker per slot, bound to its own device and processor instance
//! 4. A join barrier, then reassembly of results into original input order
//!
//! ## Guarantees
//!
//! - Output order equals input order, whatever the worker count or finish order
//! - Every item is emitted exactly once, or accounted for in a batch failure
//! - A batch never exceeds the budget unless it is a single oversized item
//! - Field values are replaced atomically per batch; nothing is half-written
//!
//! ## Module Organization
//!
//! - [`models`] - Work items, field sets, batches and worker assignments
//! - [`batching`] - Cost estimation, batch building and distribution
//! - [`execution`] - Workers, processors, device binding, the pipeline coordinator
//! - [`io`] - JSON / JSON Lines input and output
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured tracing setup and log helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use batchflow_core::batching::ApproxTokenEstimator;
//! use batchflow_core::config::BatchflowConfig;
//! use batchflow_core::execution::{BatchPipeline, BuiltinProcessorFactory, ProcessorKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchflowConfig::with_max_batch_cost(1024);
//! let pipeline = BatchPipeline::new(
//!     config,
//!     Arc::new(ApproxTokenEstimator),
//!     Arc::new(BuiltinProcessorFactory::new(ProcessorKind::Uppercase)),
//! )?;
//!
//! let records = batchflow_core::io::load_records("input.json".as_ref())?;
//! let output = pipeline.run_records(records).await?;
//! println!("{} records in input order", output.records.len());
//! # Ok(())
//! # }
//! ```

pub mod batching;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod io;
pub mod logging;
pub mod models;

pub use batching::{build_batches, distribute, CostEstimator};
pub use config::{BatchflowConfig, ConfigManager, FailurePolicy};
pub use error::{BatchflowError, Result};
pub use execution::{
    BatchPipeline, PipelineOutput, Processor, ProcessorError, ProcessorFactory, RunReport,
};
pub use models::{Batch, FieldSet, Record, SequenceNo, WorkItem, WorkerAssignment};
