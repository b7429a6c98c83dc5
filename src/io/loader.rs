//! Reading input records and turning them into work items.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{BatchflowError, Result};
use crate::models::{FieldSet, Record, SequenceNo, WorkItem};

/// Whether a path names a JSON Lines file
pub(crate) fn is_json_lines(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("jsonl") | Some("ndjson")
    )
}

/// Load records from a JSON array file or a JSON Lines file (`.jsonl`, `.ndjson`).
///
/// Record order and key order are preserved exactly as read.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let contents = fs::read_to_string(path)?;

    let records = if is_json_lines(path) {
        parse_json_lines(&contents)?
    } else {
        parse_json_array(&contents)?
    };

    debug!(path = %path.display(), records = records.len(), "Loaded input records");
    Ok(records)
}

fn parse_json_array(contents: &str) -> Result<Vec<Record>> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Array(values) => values
            .into_iter()
            .enumerate()
            .map(|(position, value)| into_record(value, position))
            .collect(),
        other => Err(BatchflowError::InvalidInput(format!(
            "expected a JSON array of objects, found {}",
            type_name(&other)
        ))),
    }
}

fn parse_json_lines(contents: &str) -> Result<Vec<Record>> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(position, line)| into_record(serde_json::from_str(line)?, position))
        .collect()
}

fn into_record(value: Value, position: usize) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BatchflowError::InvalidInput(format!(
            "record {position} must be a JSON object, found {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Assign sequence numbers `0..n` in read order and validate every record.
///
/// The whole input is rejected if any record lacks a configured field or holds
/// a non-string value in one.
pub fn ingest(records: Vec<Record>, fields: &Arc<FieldSet>) -> Result<Vec<WorkItem>> {
    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| {
            WorkItem::from_record(position as SequenceNo, record, fields.clone())
        })
        .collect()
}
