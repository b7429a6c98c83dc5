//! # System Constants
//!
//! Defaults and well-known names shared by configuration, logging and the pipeline.

/// Default batch cost budget (tokens per batch)
pub const DEFAULT_MAX_BATCH_COST: usize = 1024;

/// Default text fields transformed per work item
pub const DEFAULT_FIELDS: &[&str] = &["question", "answer"];

/// Worker count used when neither a count nor any device is configured
pub const DEFAULT_WORKER_COUNT_WITHOUT_DEVICES: usize = 1;

/// Device identifier for non-accelerated execution
pub const CPU_DEVICE: &str = "cpu";

/// Configuration directory searched by default
pub const CONFIG_DIRECTORY: &str = "config";

/// Base name of configuration files (`batchflow.toml`, `batchflow.production.toml`)
pub const CONFIG_FILE_STEM: &str = "batchflow";

/// Prefix for environment variable overrides (`BATCHFLOW__BATCHING__MAX_BATCH_COST`)
pub const ENV_PREFIX: &str = "BATCHFLOW";

/// Environment selector variable
pub const ENVIRONMENT_VARIABLE: &str = "BATCHFLOW_ENV";

/// Log output format selector variable (`json` or anything else for human-readable)
pub const LOG_FORMAT_VARIABLE: &str = "BATCHFLOW_LOG_FORMAT";

/// Environment assumed when `BATCHFLOW_ENV` is unset
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Approximate characters per token for the tokenizer-free estimator
pub const APPROX_CHARS_PER_TOKEN: usize = 4;
