//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use automerge::error::{Error, Result};
use automerge::platform::PlatformService;
use automerge::types::{
    MergeCapabilities, MergeMethod, MergeRequest, MergeResult, PlatformConfig, PullRequest,
    RequiredStatusChecks, Review, WorkflowRun,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// so call recording and error injection stay explicit.
///
/// Features:
/// - Configurable responses per PR and per base branch
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    pull_requests: Mutex<HashMap<u64, PullRequest>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    required_checks: Mutex<HashMap<String, RequiredStatusChecks>>,
    open_pull_requests: Mutex<Vec<PullRequest>>,
    capabilities: Mutex<MergeCapabilities>,
    workflow_run_prs: Mutex<Vec<u64>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    list_reviews_calls: Mutex<Vec<u64>>,
    required_checks_calls: Mutex<Vec<(String, String)>>,
    list_open_calls: Mutex<usize>,
    merge_calls: Mutex<Vec<MergeRequest>>,
    capabilities_calls: Mutex<usize>,
    workflow_run_calls: Mutex<Vec<WorkflowRun>>,
    // Error injection
    error_on_get_pr: Mutex<Option<String>>,
    /// Number of upcoming merge calls that fail, and the error they report
    merge_failures: Mutex<Option<(u32, String)>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            pull_requests: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            required_checks: Mutex::new(HashMap::new()),
            open_pull_requests: Mutex::new(Vec::new()),
            capabilities: Mutex::new(MergeCapabilities {
                allow_merge_commit: true,
                allow_squash_merge: true,
                allow_rebase_merge: true,
            }),
            workflow_run_prs: Mutex::new(Vec::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            list_reviews_calls: Mutex::new(Vec::new()),
            required_checks_calls: Mutex::new(Vec::new()),
            list_open_calls: Mutex::new(0),
            merge_calls: Mutex::new(Vec::new()),
            capabilities_calls: Mutex::new(0),
            workflow_run_calls: Mutex::new(Vec::new()),
            error_on_get_pr: Mutex::new(None),
            merge_failures: Mutex::new(None),
        }
    }

    // === Response setup ===

    /// Set the response for `get_pull_request`
    pub fn set_pull_request(&self, pr: PullRequest) {
        self.pull_requests.lock().unwrap().insert(pr.number, pr);
    }

    /// Set the response for `list_reviews`
    pub fn set_reviews(&self, number: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(number, reviews);
    }

    /// Set the response for `get_required_status_checks` on a base branch
    pub fn set_required_checks(&self, base: &str, checks: RequiredStatusChecks) {
        self.required_checks
            .lock()
            .unwrap()
            .insert(base.to_string(), checks);
    }

    /// Set the response for `list_open_pull_requests`
    pub fn set_open_pull_requests(&self, prs: Vec<PullRequest>) {
        *self.open_pull_requests.lock().unwrap() = prs;
    }

    /// Set the response for `get_merge_capabilities`
    pub fn set_capabilities(&self, capabilities: MergeCapabilities) {
        *self.capabilities.lock().unwrap() = capabilities;
    }

    /// Set the response for `pull_requests_for_workflow_run`
    pub fn set_workflow_run_prs(&self, numbers: Vec<u64>) {
        *self.workflow_run_prs.lock().unwrap() = numbers;
    }

    /// Helper to set up a PR that passes every gate
    ///
    /// One passing required check on `main`, one approval from a
    /// collaborator on the head commit, clean mergeable state.
    pub fn setup_mergeable_pr(&self, number: u64) {
        let pr = super::make_pr(number);
        self.set_reviews(number, vec![super::approval(1, "reviewer", &pr.head_sha, 0)]);
        self.set_required_checks("main", super::passing_checks());
        self.set_pull_request(pr);
    }

    // === Error injection ===

    /// Make `get_pull_request` return an error
    pub fn fail_get_pr(&self, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make every `merge_pull_request` call fail
    pub fn fail_merge(&self, msg: &str) {
        self.fail_merge_times(u32::MAX, msg);
    }

    /// Make the next `times` `merge_pull_request` calls fail
    pub fn fail_merge_times(&self, times: u32, msg: &str) {
        *self.merge_failures.lock().unwrap() = Some((times, msg.to_string()));
    }

    // === Call verification ===

    /// PR numbers `get_pull_request` was called with, in order
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// PR numbers `list_reviews` was called with, in order
    pub fn list_reviews_calls(&self) -> Vec<u64> {
        self.list_reviews_calls.lock().unwrap().clone()
    }

    /// `(base, head_sha)` pairs `get_required_status_checks` was called with
    pub fn required_checks_calls(&self) -> Vec<(String, String)> {
        self.required_checks_calls.lock().unwrap().clone()
    }

    /// Number of `list_open_pull_requests` calls
    pub fn list_open_call_count(&self) -> usize {
        *self.list_open_calls.lock().unwrap()
    }

    /// All `merge_pull_request` calls
    pub fn merge_calls(&self) -> Vec<MergeRequest> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Number of `merge_pull_request` calls
    pub fn merge_call_count(&self) -> usize {
        self.merge_calls.lock().unwrap().len()
    }

    /// Number of `get_merge_capabilities` calls
    pub fn capabilities_call_count(&self) -> usize {
        *self.capabilities_calls.lock().unwrap()
    }

    /// All `pull_requests_for_workflow_run` calls
    pub fn workflow_run_calls(&self) -> Vec<WorkflowRun> {
        self.workflow_run_calls.lock().unwrap().clone()
    }

    /// Assert that `merge_pull_request` was NOT called
    pub fn assert_merge_not_called(&self) {
        let calls = self.merge_calls();
        assert!(
            calls.is_empty(),
            "Expected merge_pull_request NOT to be called but it was: {calls:?}"
        );
    }

    /// Assert that `merge_pull_request` was called for a PR with a specific method
    pub fn assert_merge_called_with_method(&self, number: u64, method: Option<MergeMethod>) {
        let calls = self.merge_calls();
        assert!(
            calls.iter().any(|c| c.number == number && c.method == method),
            "Expected merge_pull_request(#{number}, {method:?}) but got: {calls:?}"
        );
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.get_pr_calls.lock().unwrap().push(number);

        if let Some(msg) = self.error_on_get_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        self.pull_requests
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| {
                Error::Platform(format!(
                    "get_pull_request: no response configured for PR #{number}"
                ))
            })
    }

    async fn list_reviews(&self, number: u64, per_page: u8) -> Result<Vec<Review>> {
        self.list_reviews_calls.lock().unwrap().push(number);
        let reviews = self
            .reviews
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default();
        Ok(reviews.into_iter().take(usize::from(per_page)).collect())
    }

    async fn get_required_status_checks(
        &self,
        base_branch: &str,
        head_sha: &str,
    ) -> Result<RequiredStatusChecks> {
        self.required_checks_calls
            .lock()
            .unwrap()
            .push((base_branch.to_string(), head_sha.to_string()));
        Ok(self
            .required_checks
            .lock()
            .unwrap()
            .get(base_branch)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_open_pull_requests(&self, per_page: u8) -> Result<Vec<PullRequest>> {
        *self.list_open_calls.lock().unwrap() += 1;
        Ok(self
            .open_pull_requests
            .lock()
            .unwrap()
            .iter()
            .take(usize::from(per_page))
            .cloned()
            .collect())
    }

    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<MergeResult> {
        self.merge_calls.lock().unwrap().push(request.clone());

        let mut failures = self.merge_failures.lock().unwrap();
        if let Some((remaining, msg)) = failures.as_mut()
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::MergeFailed {
                number: request.number,
                message: msg.clone(),
            });
        }

        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merged_sha_{}", request.number)),
            message: None,
        })
    }

    async fn get_merge_capabilities(&self) -> Result<MergeCapabilities> {
        *self.capabilities_calls.lock().unwrap() += 1;
        Ok(*self.capabilities.lock().unwrap())
    }

    async fn pull_requests_for_workflow_run(&self, run: &WorkflowRun) -> Result<Vec<u64>> {
        self.workflow_run_calls.lock().unwrap().push(run.clone());
        Ok(self.workflow_run_prs.lock().unwrap().clone())
    }
}
