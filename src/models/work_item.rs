//! Work items and the records they are built from.

use serde_json::Value;
use std::sync::Arc;

use super::FieldSet;
use crate::error::{BatchflowError, Result};

/// Stable per-item ingestion position, used only to restore order after processing
pub type SequenceNo = u64;

/// One input record. Key order is preserved from input to output.
pub type Record = serde_json::Map<String, Value>;

/// The unit of work flowing through the pipeline.
///
/// Texts for the configured fields are held separately from the rest of the
/// record so workers can replace them by position. The sequence number is set
/// once at ingestion and is dropped by [`WorkItem::into_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    sequence_no: SequenceNo,
    fields: Arc<FieldSet>,
    texts: Vec<String>,
    payload: Record,
}

impl WorkItem {
    /// Build a work item from a record, requiring every field to be a string
    pub fn from_record(
        sequence_no: SequenceNo,
        payload: Record,
        fields: Arc<FieldSet>,
    ) -> Result<Self> {
        let mut texts = Vec::with_capacity(fields.len());
        for name in fields.iter() {
            match payload.get(name) {
                Some(Value::String(text)) => texts.push(text.clone()),
                Some(other) => {
                    return Err(BatchflowError::InvalidWorkItem {
                        sequence_no,
                        reason: format!(
                            "field '{name}' must be a string, found {}",
                            json_type_name(other)
                        ),
                    })
                }
                None => {
                    return Err(BatchflowError::InvalidWorkItem {
                        sequence_no,
                        reason: format!("missing text field '{name}'"),
                    })
                }
            }
        }

        Ok(Self {
            sequence_no,
            fields,
            texts,
            payload,
        })
    }

    pub fn sequence_no(&self) -> SequenceNo {
        self.sequence_no
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Texts in field-set order
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Current text of the field at `position` in the field set
    pub fn text(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    /// Replace the text of the field at `position`. Returns false if out of range.
    pub fn set_text(&mut self, position: usize, text: String) -> bool {
        match self.texts.get_mut(position) {
            Some(slot) => {
                *slot = text;
                true
            }
            None => false,
        }
    }

    /// Pass-through view of the original record
    pub fn payload(&self) -> &Record {
        &self.payload
    }

    /// Strip the sequence number and produce the output record.
    ///
    /// Field texts are written back into their original key positions.
    pub fn into_record(self) -> Record {
        let WorkItem {
            fields,
            texts,
            mut payload,
            ..
        } = self;
        for (name, text) in fields.iter().zip(texts) {
            payload.insert(name.to_string(), Value::String(text));
        }
        payload
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
