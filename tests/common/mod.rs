//! Shared test fixtures

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::MockPlatformService;

use automerge::config::Config;
use automerge::merge::{Outcome, Progress};
use automerge::types::{
    AuthorAssociation, MergeableState, PlatformConfig, PrState, PullRequest,
    RequiredStatusChecks, Review, ReviewState,
};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Repository coordinates used by every mock
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "octo".to_string(),
        repo: "repo".to_string(),
        api_url: "https://api.github.com".to_string(),
    }
}

/// Mock platform with the default config
pub fn mock_platform() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Open, clean PR against `main` with head SHA `head_{number}`
pub fn make_pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change {number}"),
        merged: false,
        state: PrState::Open,
        author: Some("author".to_string()),
        author_association: Some(AuthorAssociation::Contributor),
        base_ref: "main".to_string(),
        head_sha: format!("head_{number}"),
        mergeable_state: MergeableState::Clean,
        labels: Vec::new(),
    }
}

/// Review by a collaborator on `sha`, submitted `minute` minutes past noon
pub fn review(id: u64, login: &str, sha: &str, state: &str, minute: u32) -> Review {
    Review {
        id,
        commit_id: Some(sha.to_string()),
        author: Some(login.to_string()),
        author_association: Some(AuthorAssociation::Collaborator),
        state: ReviewState::from(state),
        submitted_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()),
    }
}

/// Approval by a collaborator on `sha`
pub fn approval(id: u64, login: &str, sha: &str, minute: u32) -> Review {
    review(id, login, sha, "APPROVED", minute)
}

/// One required check that has passed
pub fn passing_checks() -> RequiredStatusChecks {
    RequiredStatusChecks {
        contexts: vec!["ci".to_string()],
        all_passed: true,
    }
}

/// Config built from input name/value pairs; `token` is always set
pub fn make_config(pairs: &[(&str, &str)]) -> Config {
    let mut inputs: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    inputs
        .entry("token".to_string())
        .or_insert_with(|| "test-token".to_string());
    Config::from_inputs(|name| inputs.get(name).cloned()).unwrap()
}

/// Progress sink recording every callback as a line
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    /// Recorded events
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Progress for RecordingProgress {
    fn on_backoff(&self, number: u64, delay: Duration) {
        self.push(format!("backoff #{number} {}s", delay.as_secs()));
    }

    fn on_attempt(&self, number: u64, tries: u32) {
        self.push(format!("attempt #{number} tries={tries}"));
    }

    fn on_outcome(&self, number: u64, outcome: &Outcome) {
        let kind = match outcome {
            Outcome::Skipped(_) => "skipped",
            Outcome::DryRun { .. } => "dry-run",
            Outcome::Merged { .. } => "merged",
            Outcome::RetryRequested { .. } => "retry",
            Outcome::Failed { .. } => "failed",
        };
        self.push(format!("outcome #{number} {kind}"));
    }

    fn on_separator(&self) {
        self.push(String::new());
    }
}
