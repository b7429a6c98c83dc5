//! Order-restoring merge of worker buffers.

use std::collections::HashSet;

use crate::error::{BatchflowError, Result};
use crate::models::{Record, SequenceNo, WorkItem};

/// Concatenate worker buffers, sort by sequence number and strip it.
///
/// Order across buffers is irrelevant; the result is in original input order
/// regardless of which worker handled which item or when it finished.
/// A repeated sequence number is an integrity violation.
pub fn aggregate(worker_buffers: Vec<Vec<WorkItem>>) -> Result<Vec<Record>> {
    let mut combined: Vec<WorkItem> = worker_buffers.into_iter().flatten().collect();
    combined.sort_by_key(WorkItem::sequence_no);

    if let Some(pair) = combined
        .windows(2)
        .find(|pair| pair[0].sequence_no() == pair[1].sequence_no())
    {
        return Err(BatchflowError::IntegrityViolation(format!(
            "sequence number {} emitted more than once",
            pair[0].sequence_no()
        )));
    }

    Ok(combined.into_iter().map(WorkItem::into_record).collect())
}

/// Check that emitted plus failed sequence numbers cover `0..total` exactly once
pub fn verify_coverage(
    emitted: &[SequenceNo],
    failed: &[SequenceNo],
    total: usize,
) -> Result<()> {
    let accounted = emitted.len() + failed.len();
    if accounted != total {
        return Err(BatchflowError::IntegrityViolation(format!(
            "{} items accounted for ({} emitted, {} failed) but {} were ingested",
            accounted,
            emitted.len(),
            failed.len(),
            total
        )));
    }

    let mut seen: HashSet<SequenceNo> = HashSet::with_capacity(total);
    for &seq in emitted.iter().chain(failed) {
        if seq >= total as SequenceNo || !seen.insert(seq) {
            return Err(BatchflowError::IntegrityViolation(format!(
                "sequence number {seq} is out of range or accounted for twice"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSet;
    use serde_json::json;
    use std::sync::Arc;

    fn item(seq: u64) -> WorkItem {
        let fields = Arc::new(FieldSet::new(["text"]).unwrap());
        let record = json!({"id": seq, "text": format!("t{seq}")})
            .as_object()
            .cloned()
            .unwrap();
        WorkItem::from_record(seq, record, fields).unwrap()
    }

    #[test]
    fn test_restores_order_across_buffers() {
        let buffers = vec![
            vec![item(0), item(1), item(6)],
            vec![item(2), item(3)],
            vec![],
            vec![item(4), item(5)],
        ];

        let records = aggregate(buffers).unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(records.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_duplicate_sequence_is_rejected() {
        let err = aggregate(vec![vec![item(1)], vec![item(1)]]).unwrap_err();
        assert!(matches!(err, BatchflowError::IntegrityViolation(_)));
    }

    #[test]
    fn test_empty_buffers() {
        assert!(aggregate(vec![vec![], vec![]]).unwrap().is_empty());
    }

    #[test]
    fn test_verify_coverage() {
        assert!(verify_coverage(&[0, 1, 3], &[2], 4).is_ok());
        assert!(verify_coverage(&[0, 1], &[], 3).is_err());
        assert!(verify_coverage(&[0, 0], &[2], 3).is_err());
        assert!(verify_coverage(&[0, 1], &[7], 3).is_err());
    }
}
