//! # Data Model
//!
//! - [`WorkItem`] - one input record plus its ingestion sequence number
//! - [`FieldSet`] - the ordered text fields every work item carries
//! - [`Batch`] - an order-preserving, cost-bounded group of work items
//! - [`WorkerAssignment`] - the static list of batches owned by one worker slot

pub mod batch;
pub mod field_set;
pub mod work_item;

pub use batch::{Batch, WorkerAssignment};
pub use field_set::FieldSet;
pub use work_item::{Record, SequenceNo, WorkItem};
