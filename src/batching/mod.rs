//! # Batching
//!
//! Batch construction under a cost budget and static distribution of batches
//! across worker slots.
//!
//! ```text
//! [ordered WorkItems] --build_batches--> [ordered Batches] --distribute--> [W WorkerAssignments]
//! ```
//!
//! Both stages are pure and deterministic: the same input order, cost function
//! and configuration always produce the same batches and the same assignment.

pub mod builder;
pub mod cost;
pub mod distributor;

pub use builder::{build_batches, BatchBudget};
pub use cost::{ApproxTokenEstimator, CharCountEstimator, CostEstimator, WhitespaceTokenEstimator};
pub use distributor::distribute;
