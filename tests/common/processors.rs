//! Processor doubles for exercising workers and failure handling.

use async_trait::async_trait;
use batchflow_core::execution::{DeviceBinding, Processor, ProcessorError, ProcessorFactory};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Appends `@device` to every text so tests can see where an item ran
pub struct TaggingProcessor {
    device: String,
}

#[async_trait]
impl Processor for TaggingProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        Ok(texts
            .iter()
            .map(|t| format!("{t}@{}", self.device))
            .collect())
    }
}

#[derive(Default)]
pub struct TaggingFactory {
    pub created: AtomicUsize,
}

#[async_trait]
impl ProcessorFactory for TaggingFactory {
    async fn create(&self, device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TaggingProcessor {
            device: device.device_id.clone(),
        }))
    }
}

/// Sleeps longer on lower worker ids so workers finish in reverse order
pub struct SlowProcessor {
    delay: Duration,
}

#[async_trait]
impl Processor for SlowProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(texts.iter().map(|t| t.to_uppercase()).collect())
    }
}

pub struct ReverseFinishFactory {
    pub worker_count: usize,
}

#[async_trait]
impl ProcessorFactory for ReverseFinishFactory {
    async fn create(&self, device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        let slots = self.worker_count.saturating_sub(device.worker_id) as u64;
        Ok(Box::new(SlowProcessor {
            delay: Duration::from_millis(5 * slots),
        }))
    }
}

/// Fails any call containing one of the poisoned texts
pub struct FailingProcessor {
    poisoned: Arc<HashSet<String>>,
}

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        if let Some(bad) = texts.iter().find(|t| self.poisoned.contains(*t)) {
            return Err(ProcessorError::Failed(format!("cannot process '{bad}'")));
        }
        Ok(texts.iter().map(|t| t.to_uppercase()).collect())
    }
}

pub struct FailingFactory {
    poisoned: Arc<HashSet<String>>,
}

impl FailingFactory {
    pub fn new<I, S>(poisoned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            poisoned: Arc::new(poisoned.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl ProcessorFactory for FailingFactory {
    async fn create(&self, _device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        Ok(Box::new(FailingProcessor {
            poisoned: self.poisoned.clone(),
        }))
    }
}

/// Returns one text fewer than it was given whenever a batch holds more than one
pub struct ShortProcessor;

#[async_trait]
impl Processor for ShortProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        let mut out: Vec<String> = texts.iter().map(|t| t.to_uppercase()).collect();
        if out.len() > 1 {
            out.pop();
        }
        Ok(out)
    }
}

pub struct ShortFactory;

#[async_trait]
impl ProcessorFactory for ShortFactory {
    async fn create(&self, _device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        Ok(Box::new(ShortProcessor))
    }
}

/// Panics when it sees the trigger text
pub struct PanickingProcessor {
    trigger: String,
}

#[async_trait]
impl Processor for PanickingProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        if texts.iter().any(|t| *t == self.trigger) {
            panic!("processor crashed on '{}'", self.trigger);
        }
        Ok(texts.to_vec())
    }
}

pub struct PanickingFactory(pub &'static str);

#[async_trait]
impl ProcessorFactory for PanickingFactory {
    async fn create(&self, _device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        Ok(Box::new(PanickingProcessor {
            trigger: self.0.to_string(),
        }))
    }
}

/// Cannot load a model onto the given device
pub struct BrokenDeviceFactory(pub &'static str);

#[async_trait]
impl ProcessorFactory for BrokenDeviceFactory {
    async fn create(&self, device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        if device.device_id == self.0 {
            return Err(ProcessorError::Initialization {
                device: device.device_id.clone(),
                message: "out of device memory".to_string(),
            });
        }
        Ok(Box::new(TaggingProcessor {
            device: device.device_id.clone(),
        }))
    }
}
