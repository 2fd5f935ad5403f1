//! Progress reporting for the retry scheduler

use crate::merge::eligibility::Outcome;
use std::time::Duration;

/// Callback for user-facing progress output
///
/// All methods default to doing nothing.
pub trait Progress: Send + Sync {
    /// Called before waiting out a backoff delay
    fn on_backoff(&self, _number: u64, _delay: Duration) {}

    /// Called before each evaluation attempt; `tries` counts earlier attempts
    fn on_attempt(&self, _number: u64, _tries: u32) {}

    /// Called with the outcome of each attempt
    fn on_outcome(&self, _number: u64, _outcome: &Outcome) {}

    /// Called after each task to separate output blocks
    fn on_separator(&self) {}
}

/// Progress sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
