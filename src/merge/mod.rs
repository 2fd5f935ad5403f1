//! Merge engine
//!
//! Three layers:
//! 1. Gates - pure eligibility checks over fetched data (`eligibility`)
//! 2. Evaluate - fetch fresh data, run gates, attempt the merge (`eligibility`)
//! 3. Schedule - FIFO queue with exponential backoff retries (`scheduler`)

mod eligibility;
mod progress;
mod scheduler;

pub use eligibility::{
    MINIMUM_APPROVALS, Outcome, SkipReason, build_merge_request, check_labels,
    check_mergeable_state, check_pull_request, check_status_checks, evaluate_pull_request,
    render_commit_template,
};
pub use progress::{NoProgress, Progress};
pub use scheduler::{AutomergeReport, MAX_TRIES, RetryTask, automerge_pull_requests, backoff_delay};

use crate::config::Config;
use crate::context::GitHubContext;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::trigger::pull_requests_for_event;
use tracing::info;

/// Run automerge for one explicit pull request or the event's pull requests
///
/// A configured `pull_request` bypasses event-based discovery.
pub async fn run(
    config: &Config,
    context: &GitHubContext,
    platform: &dyn PlatformService,
    progress: &dyn Progress,
) -> Result<AutomergeReport> {
    let repository = platform.config();
    info!(owner = %repository.owner, repo = %repository.repo, event = %context.event_name, "starting automerge");

    let numbers = match config.pull_request {
        Some(number) => vec![number],
        None => pull_requests_for_event(context, platform).await?,
    };

    if numbers.is_empty() {
        info!("no pull requests to process");
    }

    Ok(automerge_pull_requests(platform, config, &numbers, progress).await)
}
