//! Retry scheduling - drives evaluation of a batch of pull requests
//!
//! Pull requests are processed strictly one at a time in FIFO order. Failed
//! merges are pushed to the back of the queue and retried after an
//! exponential backoff, up to [`MAX_TRIES`] attempts per pull request.

use crate::config::Config;
use crate::merge::eligibility::{Outcome, SkipReason, evaluate_pull_request};
use crate::merge::progress::Progress;
use crate::platform::PlatformService;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Attempts per pull request (the initial attempt plus four retries)
pub const MAX_TRIES: u32 = 5;

/// A queued pull request and the attempts already spent on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTask {
    /// PR number
    pub number: u64,
    /// Attempts already made
    pub tries: u32,
}

/// Delay before an attempt that follows `tries` earlier attempts: `2^tries` seconds
///
/// Saturates at `Duration::MAX` once `2^tries` no longer fits in a `u64`.
pub const fn backoff_delay(tries: u32) -> Duration {
    match 1u64.checked_shl(tries) {
        Some(secs) => Duration::from_secs(secs),
        None => Duration::MAX,
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default)]
pub struct AutomergeReport {
    /// Merged pull requests
    pub merged: Vec<u64>,
    /// Pull requests that would have been merged in dry-run mode
    pub dry_run: Vec<u64>,
    /// Skipped pull requests and why
    pub skipped: Vec<(u64, SkipReason)>,
    /// Pull requests that failed fatally, with the reported error
    pub failed: Vec<(u64, String)>,
    /// Total evaluation attempts made
    pub attempts: usize,
}

impl AutomergeReport {
    /// Whether no failure needs to be reported at the process boundary
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, number: u64, outcome: Outcome) {
        match outcome {
            Outcome::Merged { .. } => self.merged.push(number),
            Outcome::DryRun { .. } => self.dry_run.push(number),
            Outcome::Skipped(reason) => self.skipped.push((number, reason)),
            Outcome::Failed { error } => self.failed.push((number, error)),
            Outcome::RetryRequested { .. } => {}
        }
    }
}

/// Process every pull request in `numbers` to completion (EFFECTFUL)
///
/// Returns once each pull request is merged, skipped, or out of attempts.
/// Backoff sleeps block the whole batch.
pub async fn automerge_pull_requests(
    platform: &dyn PlatformService,
    config: &Config,
    numbers: &[u64],
    progress: &dyn Progress,
) -> AutomergeReport {
    let mut report = AutomergeReport::default();
    let mut queue: VecDeque<RetryTask> = numbers
        .iter()
        .map(|&number| RetryTask { number, tries: 0 })
        .collect();

    while let Some(task) = queue.pop_front() {
        if task.tries > 0 {
            let delay = backoff_delay(task.tries);
            debug!(pr_number = task.number, tries = task.tries, ?delay, "backing off before retry");
            progress.on_backoff(task.number, delay);
            tokio::time::sleep(delay).await;
        }

        let tries_left = (MAX_TRIES - 1) - task.tries;
        progress.on_attempt(task.number, task.tries);

        let outcome = evaluate_pull_request(platform, config, task.number, tries_left).await;
        report.attempts += 1;
        progress.on_outcome(task.number, &outcome);

        if outcome.should_retry() {
            queue.push_back(RetryTask {
                number: task.number,
                tries: task.tries + 1,
            });
        }
        report.record(task.number, outcome);

        progress.on_separator();
    }

    report
}
