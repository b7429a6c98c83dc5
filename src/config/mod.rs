//! # Batchflow Configuration System
//!
//! Typed configuration for the batch scheduler. Values are loaded in layers by
//! [`ConfigManager`] (defaults, optional TOML file, `BATCHFLOW__*` environment
//! variables) and validated explicitly before any batching starts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use batchflow_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let max_cost = manager.config().batching.max_batch_cost;
//! let workers = manager.config().workers.effective_worker_count();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FIELDS, DEFAULT_MAX_BATCH_COST, DEFAULT_WORKER_COUNT_WITHOUT_DEVICES,
};
use crate::models::FieldSet;
pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigManager, ConfigOverrides};

/// Root configuration structure mirroring `config/batchflow.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchflowConfig {
    /// Batch construction settings
    pub batching: BatchingConfig,

    /// Worker pool and device settings
    #[serde(default)]
    pub workers: WorkerPoolConfig,
}

/// Batch construction settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchingConfig {
    /// Upper bound on the summed cost of every multi-item batch
    pub max_batch_cost: usize,

    /// Ordered names of the text fields handed to the processor
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_cost: DEFAULT_MAX_BATCH_COST,
            fields: default_fields(),
        }
    }
}

fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect()
}

/// Worker pool configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkerPoolConfig {
    /// Number of parallel workers. Defaults to the device count, or 1 without devices.
    #[serde(default)]
    pub worker_count: Option<usize>,

    /// Ordered device identifiers, duplicated if shorter than `worker_count`
    #[serde(default)]
    pub device_ids: Vec<String>,

    /// How processor failures are resolved at the join barrier
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl WorkerPoolConfig {
    /// Worker count after applying the device-count fallback
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or(if self.device_ids.is_empty() {
            DEFAULT_WORKER_COUNT_WITHOUT_DEVICES
        } else {
            self.device_ids.len()
        })
    }
}

/// Resolution of batch-scoped processor failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop dispatching new batches on the first failure and fail the run
    #[default]
    FailFast,
    /// Keep going and return partial output plus the list of failed batches
    Degraded,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail_fast"),
            FailurePolicy::Degraded => write!(f, "degraded"),
        }
    }
}

impl BatchflowConfig {
    /// Build a configuration with the given budget and defaults elsewhere
    pub fn with_max_batch_cost(max_batch_cost: usize) -> Self {
        Self {
            batching: BatchingConfig {
                max_batch_cost,
                ..BatchingConfig::default()
            },
            workers: WorkerPoolConfig::default(),
        }
    }

    /// Validate every value the scheduler depends on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batching.max_batch_cost == 0 {
            return Err(ConfigurationError::invalid_value(
                "batching.max_batch_cost",
                "0",
                "batch cost budget must be a positive integer",
            ));
        }

        FieldSet::new(self.batching.fields.iter().map(String::as_str))?;

        if self.workers.worker_count == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "workers.worker_count",
                "0",
                "worker pool needs at least one worker",
            ));
        }

        if let Some(blank) = self.workers.device_ids.iter().find(|d| d.trim().is_empty()) {
            return Err(ConfigurationError::invalid_value(
                "workers.device_ids",
                blank.clone(),
                "device identifiers must not be blank",
            ));
        }

        Ok(())
    }
}
