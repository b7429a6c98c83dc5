//! # Input / Output
//!
//! File boundary of the pipeline: load records, assign sequence numbers, write
//! results back out in input order.

pub mod loader;
pub mod writer;

pub use loader::{ingest, load_records};
pub use writer::{write_json, write_records, OutputFormat};
