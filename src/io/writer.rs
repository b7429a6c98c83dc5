//! Writing processed records and reports.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::loader::is_json_lines;
use crate::error::Result;
use crate::models::Record;

/// On-disk layout for output records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One pretty-printed JSON array, two-space indent
    Json,
    /// One compact JSON object per line
    JsonLines,
}

impl OutputFormat {
    /// `.jsonl` / `.ndjson` select JSON Lines; anything else is a JSON array
    pub fn from_path(path: &Path) -> Self {
        if is_json_lines(path) {
            OutputFormat::JsonLines
        } else {
            OutputFormat::Json
        }
    }
}

/// Write records in the given order. Non-ASCII text is written as-is.
pub fn write_records(path: &Path, records: &[Record], format: OutputFormat) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::JsonLines => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
        }
    }

    writer.flush()?;
    debug!(path = %path.display(), records = records.len(), ?format, "Wrote output records");
    Ok(())
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_records;
    use serde_json::json;
    use tempfile::TempDir;

    fn records() -> Vec<Record> {
        vec![
            json!({"question": "Xin chào", "answer": "ok", "id": 1})
                .as_object()
                .cloned()
                .unwrap(),
            json!({"question": "b", "answer": "c", "id": 2})
                .as_object()
                .cloned()
                .unwrap(),
        ]
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.jsonl")), OutputFormat::JsonLines);
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Json);
    }

    #[test]
    fn test_pretty_json_keeps_non_ascii_and_indent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        write_records(&path, &records(), OutputFormat::Json).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Xin chào"));
        assert!(text.contains("\n  {\n    \"question\""));
        assert_eq!(load_records(&path).unwrap(), records());
    }

    #[test]
    fn test_json_lines_one_record_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");

        write_records(&path, &records(), OutputFormat::JsonLines).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with(r#"{"question":"b""#));
    }
}
