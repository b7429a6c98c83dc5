//! Shared test support: processor doubles, record builders and proptest strategies.
#![allow(dead_code)]

pub mod processors;
pub mod strategies;

use batchflow_core::batching::CostEstimator;
use batchflow_core::config::{BatchflowConfig, FailurePolicy};
use batchflow_core::execution::{BatchPipeline, ProcessorFactory};
use batchflow_core::models::Record;
use serde_json::json;
use std::sync::Arc;

/// A record with one `text` field plus an `id` for checking order
pub fn text_record(id: usize, text: &str) -> Record {
    json!({"id": id, "text": text, "source": "test"})
        .as_object()
        .cloned()
        .unwrap_or_default()
}

/// Records `t0`, `t1`, ... with one `text` field each
pub fn text_records(count: usize) -> Vec<Record> {
    (0..count).map(|i| text_record(i, &format!("t{i}"))).collect()
}

/// A question/answer record shaped like a translation dataset row
pub fn qa_record(id: usize) -> Record {
    json!({
        "id": id,
        "question": format!("question {id}"),
        "answer": format!("answer {id}"),
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

pub fn ids(records: &[Record]) -> Vec<u64> {
    records
        .iter()
        .map(|r| r["id"].as_u64().unwrap_or(u64::MAX))
        .collect()
}

pub fn texts<'a>(records: &'a [Record], field: &str) -> Vec<&'a str> {
    records
        .iter()
        .map(|r| r[field].as_str().unwrap_or_default())
        .collect()
}

/// Configuration over the single `text` field
pub fn text_config(max_cost: usize, workers: usize, policy: FailurePolicy) -> BatchflowConfig {
    let mut config = BatchflowConfig::with_max_batch_cost(max_cost);
    config.batching.fields = vec!["text".to_string()];
    config.workers.worker_count = Some(workers);
    config.workers.failure_policy = policy;
    config
}

/// Every text costs `cost`, whatever its content
pub fn flat_cost(cost: usize) -> Arc<dyn CostEstimator> {
    Arc::new(move |_: &str| cost)
}

pub fn pipeline(
    config: BatchflowConfig,
    estimator: Arc<dyn CostEstimator>,
    factory: Arc<dyn ProcessorFactory>,
) -> BatchPipeline {
    BatchPipeline::new(config, estimator, factory).expect("test configuration is valid")
}
