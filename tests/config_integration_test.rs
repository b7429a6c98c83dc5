mod common;

use batchflow_core::config::{ConfigManager, FailurePolicy};
use batchflow_core::execution::{BatchPipeline, BuiltinProcessorFactory};
use batchflow_core::batching::ApproxTokenEstimator;
use std::path::PathBuf;
use std::sync::Arc;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_shipped_base_config_is_valid() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "development")
            .unwrap();

    let config = manager.config();
    assert_eq!(config.batching.max_batch_cost, 1024);
    assert_eq!(config.batching.fields, vec!["question", "answer"]);
    assert_eq!(config.workers.effective_worker_count(), 1);
    assert_eq!(config.workers.failure_policy, FailurePolicy::FailFast);
}

#[test]
fn test_shipped_production_overlay() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "production")
            .unwrap();

    assert_eq!(manager.sources().len(), 2);
    let config = manager.config();
    assert_eq!(config.workers.worker_count, Some(3));
    assert_eq!(config.workers.device_ids, vec!["cuda:0", "cuda:1"]);
}

#[tokio::test]
async fn test_pipeline_runs_with_loaded_config() {
    let config =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "production")
            .unwrap()
            .into_config();
    let pipeline = BatchPipeline::new(
        config,
        Arc::new(ApproxTokenEstimator),
        Arc::new(BuiltinProcessorFactory::default()),
    )
    .unwrap();
    assert_eq!(pipeline.worker_count(), 3);

    let records: Vec<_> = (0..9).map(common::qa_record).collect();
    let plan = pipeline.plan(pipeline.ingest(records.clone()).unwrap()).unwrap();
    let devices: Vec<&str> = plan.workers.iter().map(|w| w.device.as_str()).collect();
    assert_eq!(devices, vec!["cuda:0", "cuda:1", "cuda:1"]);

    let output = pipeline.run_records(records.clone()).await.unwrap();
    assert_eq!(output.records, records);
}
