//! Single-pass, order-preserving greedy batch construction.

use tracing::{debug, warn};

use super::cost::CostEstimator;
use crate::config::ConfigurationError;
use crate::error::Result;
use crate::models::{Batch, WorkItem};

/// Running cost accumulator for the batch under construction
#[derive(Debug, Clone)]
pub struct BatchBudget {
    max_cost: usize,
    current: usize,
}

impl BatchBudget {
    pub fn new(max_cost: usize) -> Self {
        Self {
            max_cost,
            current: 0,
        }
    }

    pub fn can_add(&self, cost: usize) -> bool {
        self.current.saturating_add(cost) <= self.max_cost
    }

    pub fn add(&mut self, cost: usize) {
        self.current = self.current.saturating_add(cost);
    }

    pub fn reset(&mut self, cost: usize) {
        self.current = cost;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn remaining(&self) -> usize {
        self.max_cost.saturating_sub(self.current)
    }
}

/// Summed cost of every configured field of one item
pub fn item_cost(item: &WorkItem, estimator: &dyn CostEstimator) -> usize {
    item.texts()
        .iter()
        .map(|text| estimator.cost(text))
        .fold(0usize, usize::saturating_add)
}

/// Group `items` into batches whose total cost stays within `max_cost`.
///
/// Items are never reordered. An item whose own cost exceeds the budget is
/// emitted alone as a singleton batch rather than rejected, so the budget is a
/// bound on multi-item batches only. Empty input yields no batches.
pub fn build_batches(
    items: Vec<WorkItem>,
    estimator: &dyn CostEstimator,
    max_cost: usize,
) -> Result<Vec<Batch>> {
    if max_cost == 0 {
        return Err(ConfigurationError::invalid_value(
            "batching.max_batch_cost",
            "0",
            "batch cost budget must be a positive integer",
        )
        .into());
    }

    let mut batches: Vec<Batch> = Vec::new();
    let mut current: Vec<WorkItem> = Vec::new();
    let mut budget = BatchBudget::new(max_cost);

    for item in items {
        let cost = item_cost(&item, estimator);

        if cost > max_cost {
            warn!(
                sequence_no = item.sequence_no(),
                item_cost = cost,
                max_cost = max_cost,
                "Work item exceeds batch budget on its own; emitting as singleton batch"
            );
        }

        if current.is_empty() || budget.can_add(cost) {
            current.push(item);
            budget.add(cost);
        } else {
            let index = batches.len();
            batches.push(Batch::new(index, std::mem::take(&mut current), budget.current()));
            current.push(item);
            budget.reset(cost);
        }
    }

    if !current.is_empty() {
        let index = batches.len();
        batches.push(Batch::new(index, current, budget.current()));
    }

    debug!(
        batch_count = batches.len(),
        max_cost = max_cost,
        "Built batches"
    );

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchflowError;
    use crate::models::FieldSet;
    use serde_json::json;
    use std::sync::Arc;

    fn items_with_texts(texts: &[&str]) -> Vec<WorkItem> {
        let fields = Arc::new(FieldSet::new(["text"]).unwrap());
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let record = json!({ "text": t }).as_object().cloned().unwrap();
                WorkItem::from_record(i as u64, record, fields.clone()).unwrap()
            })
            .collect()
    }

    fn char_cost(text: &str) -> usize {
        text.chars().count()
    }

    fn shape(batches: &[Batch]) -> Vec<Vec<u64>> {
        batches.iter().map(Batch::sequence_nos).collect()
    }

    #[test]
    fn test_uniform_costs_scenario() {
        let text = "x".repeat(300);
        let items = items_with_texts(&[&text, &text, &text, &text, &text]);

        let batches = build_batches(items, &char_cost, 700).unwrap();

        assert_eq!(shape(&batches), vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert_eq!(
            batches.iter().map(|b| b.cost).collect::<Vec<_>>(),
            vec![600, 600, 300]
        );
        assert_eq!(
            batches.iter().map(|b| b.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_oversized_item_is_a_singleton() {
        let items = items_with_texts(&["aa", "aaaaaaaaaa", "a", "b"]);

        let batches = build_batches(items, &char_cost, 5).unwrap();

        assert_eq!(shape(&batches), vec![vec![0], vec![1], vec![2, 3]]);
        assert!(batches[1].is_oversized(5));
        assert_eq!(batches[1].cost, 10);
    }

    #[test]
    fn test_leading_oversized_item_not_merged_with_zero_cost_followers() {
        let items = items_with_texts(&["aaaaaaaa", "", ""]);

        let batches = build_batches(items, &char_cost, 4).unwrap();

        assert_eq!(shape(&batches), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_exact_fit_stays_in_batch() {
        let items = items_with_texts(&["aaa", "bb", "c"]);

        let batches = build_batches(items, &char_cost, 5).unwrap();

        assert_eq!(shape(&batches), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_multi_field_cost_is_summed() {
        let fields = Arc::new(FieldSet::new(["question", "answer"]).unwrap());
        let items: Vec<WorkItem> = (0..3)
            .map(|i| {
                let record = json!({"question": "abc", "answer": "de"})
                    .as_object()
                    .cloned()
                    .unwrap();
                WorkItem::from_record(i, record, fields.clone()).unwrap()
            })
            .collect();

        let batches = build_batches(items, &char_cost, 10).unwrap();

        assert_eq!(shape(&batches), vec![vec![0, 1], vec![2]]);
        assert_eq!(batches[0].cost, 10);
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let batches = build_batches(Vec::new(), &char_cost, 10).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_zero_budget_fails_fast() {
        let err = build_batches(items_with_texts(&["a"]), &char_cost, 0).unwrap_err();
        assert!(matches!(err, BatchflowError::Configuration(_)));
    }

    #[test]
    fn test_budget_tracker() {
        let mut budget = BatchBudget::new(10);
        assert!(budget.can_add(10));
        budget.add(7);
        assert_eq!(budget.remaining(), 3);
        assert!(!budget.can_add(4));
        budget.reset(12);
        assert_eq!(budget.remaining(), 0);
        assert!(!budget.can_add(0));
    }
}
