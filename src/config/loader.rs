//! Configuration Loader
//!
//! Environment-aware layered loading built on the `config` crate:
//!
//! 1. Built-in defaults (field set, empty device list, fail-fast policy)
//! 2. `batchflow.toml` in the configuration directory (or an explicit file)
//! 3. `batchflow.{environment}.toml` overrides when present
//! 4. `BATCHFLOW__SECTION__KEY` environment variables
//! 5. Explicit [`ConfigOverrides`] (command-line flags)
//!
//! `batching.max_batch_cost` has no default and must come from one of the layers.

use super::error::{ConfigResult, ConfigurationError};
use super::{BatchflowConfig, FailurePolicy};
use crate::constants::{
    CONFIG_DIRECTORY, CONFIG_FILE_STEM, DEFAULT_ENVIRONMENT, DEFAULT_FIELDS, ENV_PREFIX,
    ENVIRONMENT_VARIABLE,
};
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Values set by the caller that win over every other layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub max_batch_cost: Option<usize>,
    pub worker_count: Option<usize>,
    pub device_ids: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub failure_policy: Option<FailurePolicy>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: BatchflowConfig,
    environment: String,
    sources: Vec<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<ConfigManager> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<ConfigManager> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a directory with an explicit environment.
    /// Useful for testing without modifying global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<ConfigManager> {
        let directory = config_dir.unwrap_or_else(|| PathBuf::from(CONFIG_DIRECTORY));
        let files = Self::discover_files(&directory, environment);
        Self::load_layers(&files, environment, ENV_PREFIX)
    }

    /// Load with caller overrides on top: an explicit file (which must exist) or
    /// whatever base and environment files exist in the default directory, then
    /// `BATCHFLOW__*` variables, then `overrides`. Every layer is optional, but
    /// the merged result must still provide `batching.max_batch_cost`.
    pub fn load_with_overrides(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> ConfigResult<ConfigManager> {
        let environment = Self::detect_environment();
        let files = match config_file {
            Some(path) if !path.is_file() => {
                return Err(ConfigurationError::config_file_not_found(path))
            }
            Some(path) => vec![path.to_path_buf()],
            None => Self::discover_files(Path::new(CONFIG_DIRECTORY), &environment),
        };
        Self::load_layers_with_overrides(&files, &environment, ENV_PREFIX, overrides)
    }

    /// `batchflow.toml` and `batchflow.{environment}.toml` in `directory`, if present
    fn discover_files(directory: &Path, environment: &str) -> Vec<PathBuf> {
        let base = directory.join(format!("{CONFIG_FILE_STEM}.toml"));
        let overlay = directory.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"));
        [base, overlay].into_iter().filter(|p| p.is_file()).collect()
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from_file(path: &Path) -> ConfigResult<ConfigManager> {
        Self::load_with_overrides(Some(path), &ConfigOverrides::default())
    }

    /// Merge defaults, the given TOML files (in order) and prefixed environment variables
    pub fn load_layers(
        files: &[PathBuf],
        environment: &str,
        env_prefix: &str,
    ) -> ConfigResult<ConfigManager> {
        Self::load_layers_with_overrides(files, environment, env_prefix, &ConfigOverrides::default())
    }

    /// [`ConfigManager::load_layers`] plus a final override layer
    pub fn load_layers_with_overrides(
        files: &[PathBuf],
        environment: &str,
        env_prefix: &str,
        overrides: &ConfigOverrides,
    ) -> ConfigResult<ConfigManager> {
        debug!(
            environment = %environment,
            files = ?files,
            env_prefix = %env_prefix,
            overrides = !overrides.is_empty(),
            "Loading batchflow configuration"
        );

        let mut builder = Config::builder()
            .set_default("batching.fields", DEFAULT_FIELDS.to_vec())?
            .set_default("workers.device_ids", Vec::<String>::new())?
            .set_default("workers.failure_policy", "fail_fast")?;

        for file in files {
            builder = builder.add_source(File::from(file.as_path()).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("workers.device_ids")
                .with_list_parse_key("batching.fields")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option(
                "batching.max_batch_cost",
                overrides.max_batch_cost.map(|n| n as u64),
            )?
            .set_override_option("workers.worker_count", overrides.worker_count.map(|n| n as u64))?
            .set_override_option("workers.device_ids", overrides.device_ids.clone())?
            .set_override_option("batching.fields", overrides.fields.clone())?
            .set_override_option(
                "workers.failure_policy",
                overrides.failure_policy.map(|p| p.to_string()),
            )?;

        let config: BatchflowConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            max_batch_cost = config.batching.max_batch_cost,
            worker_count = config.workers.effective_worker_count(),
            devices = config.workers.device_ids.len(),
            failure_policy = %config.workers.failure_policy,
            "Configuration loaded successfully"
        );

        Ok(ConfigManager {
            config,
            environment: environment.to_string(),
            sources: files.to_vec(),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BatchflowConfig {
        &self.config
    }

    /// Consume the manager, returning the configuration
    pub fn into_config(self) -> BatchflowConfig {
        self.config
    }

    /// Environment the configuration was loaded for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Files that contributed to the configuration, in merge order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Detect the current environment from `BATCHFLOW_ENV`
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VARIABLE).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
    }
}
