//! Worker-to-device binding.
//!
//! Hardware discovery is left to the caller: devices arrive as configured
//! identifiers. When fewer devices than workers exist, the last device is
//! shared by the remaining workers; with none, every worker runs on `cpu`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::config::ConfigurationError;
use crate::constants::CPU_DEVICE;
use crate::error::Result;

/// A worker's reference to a compute device. Several workers may share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub worker_id: usize,
    pub device_id: String,
}

impl DeviceBinding {
    pub fn new(worker_id: usize, device_id: impl Into<String>) -> Self {
        Self {
            worker_id,
            device_id: device_id.into(),
        }
    }

    pub fn cpu(worker_id: usize) -> Self {
        Self::new(worker_id, CPU_DEVICE)
    }
}

impl fmt::Display for DeviceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {} on {}", self.worker_id, self.device_id)
    }
}

/// Bind `worker_count` workers to the configured devices
pub fn resolve_device_bindings(
    device_ids: &[String],
    worker_count: usize,
) -> Result<Vec<DeviceBinding>> {
    if worker_count == 0 {
        return Err(ConfigurationError::invalid_value(
            "workers.worker_count",
            "0",
            "worker pool needs at least one worker",
        )
        .into());
    }

    let Some(last) = device_ids.last() else {
        return Ok((0..worker_count).map(DeviceBinding::cpu).collect());
    };

    if device_ids.len() < worker_count {
        warn!(
            devices = device_ids.len(),
            workers = worker_count,
            shared_device = %last,
            "Fewer devices than workers; sharing the last device"
        );
    }

    Ok((0..worker_count)
        .map(|worker_id| {
            let device = device_ids.get(worker_id).unwrap_or(last);
            DeviceBinding::new(worker_id, device.clone())
        })
        .collect())
}
