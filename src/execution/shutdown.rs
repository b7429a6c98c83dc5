//! Cooperative cancellation shared by all workers of one run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable stop flag. Workers poll it between batches; a batch already in
/// flight is always allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns true if this call flipped the flag.
    pub fn trigger(&self) -> bool {
        !self.triggered.swap(true, Ordering::AcqRel)
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}
