//! # Processor Boundary
//!
//! The text transformation itself (translation, rewriting, inference) lives
//! outside this crate. Workers see it only through [`Processor`], and each worker
//! builds its own instance through a shared [`ProcessorFactory`] so that model
//! state is never shared between workers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::devices::DeviceBinding;

/// Errors raised at the processor boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error("Processor initialization failed on {device}: {message}")]
    Initialization { device: String, message: String },

    #[error("Processor call failed: {0}")]
    Failed(String),

    #[error("Processor returned {actual} texts for {expected} inputs on field '{field}'")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

/// Batch text transformation: one output per input, same order.
///
/// `&mut self` reflects that an instance is owned by exactly one worker.
/// Implementations doing blocking or CPU-heavy work should move it off the
/// async executor (e.g. `tokio::task::spawn_blocking`).
#[async_trait]
pub trait Processor: Send {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError>;
}

/// Builds one [`Processor`] per worker, bound to that worker's device
#[async_trait]
pub trait ProcessorFactory: Send + Sync {
    async fn create(&self, device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError>;
}

/// Returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

#[async_trait]
impl Processor for IdentityProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        Ok(texts.to_vec())
    }
}

/// Uppercases every text
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseProcessor;

#[async_trait]
impl Processor for UppercaseProcessor {
    async fn process(&mut self, texts: &[String]) -> Result<Vec<String>, ProcessorError> {
        Ok(texts.iter().map(|t| t.to_uppercase()).collect())
    }
}

/// Built-in processors selectable from configuration or the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    #[default]
    Identity,
    Uppercase,
}

/// Factory for the built-in processors
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProcessorFactory {
    kind: ProcessorKind,
}

impl BuiltinProcessorFactory {
    pub fn new(kind: ProcessorKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ProcessorFactory for BuiltinProcessorFactory {
    async fn create(&self, _device: &DeviceBinding) -> Result<Box<dyn Processor>, ProcessorError> {
        Ok(match self.kind {
            ProcessorKind::Identity => Box::new(IdentityProcessor),
            ProcessorKind::Uppercase => Box::new(UppercaseProcessor),
        })
    }
}
