//! Cost estimators used to size batches.

use crate::constants::APPROX_CHARS_PER_TOKEN;

/// Estimate the processing cost of a single text.
///
/// Implementations must be pure: the same text always yields the same cost.
pub trait CostEstimator: Send + Sync {
    fn cost(&self, text: &str) -> usize;
}

impl<F> CostEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn cost(&self, text: &str) -> usize {
        self(text)
    }
}

/// Cost = number of Unicode scalar values
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCountEstimator;

impl CostEstimator for CharCountEstimator {
    fn cost(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Cost = number of whitespace-separated words
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenEstimator;

impl CostEstimator for WhitespaceTokenEstimator {
    fn cost(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Tokenizer-free approximation: one token per four characters, rounded up
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenEstimator;

impl CostEstimator for ApproxTokenEstimator {
    fn cost(&self, text: &str) -> usize {
        text.chars().count().div_ceil(APPROX_CHARS_PER_TOKEN)
    }
}
