//! Platform service for GitHub
//!
//! Provides the interface the eligibility evaluator and trigger handlers use
//! to read pull request data and issue merges.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    MergeCapabilities, MergeRequest, MergeResult, PlatformConfig, PullRequest,
    RequiredStatusChecks, Review, WorkflowRun,
};
use async_trait::async_trait;

/// Largest page size the REST API accepts
pub const MAX_PAGE_SIZE: u8 = 100;

/// Platform service trait for pull request operations
///
/// Every call hits the API; implementations must not cache, so that each
/// evaluation attempt sees fresh data.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Get the repository coordinates
    fn config(&self) -> &PlatformConfig;

    /// Fetch a pull request by number
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest>;

    /// List the reviews of a pull request (first page only)
    async fn list_reviews(&self, number: u64, per_page: u8) -> Result<Vec<Review>>;

    /// Required status checks for `base_branch`, evaluated against `head_sha`
    async fn get_required_status_checks(
        &self,
        base_branch: &str,
        head_sha: &str,
    ) -> Result<RequiredStatusChecks>;

    /// List open pull requests (first page only)
    async fn list_open_pull_requests(&self, per_page: u8) -> Result<Vec<PullRequest>>;

    /// Merge a pull request
    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<MergeResult>;

    /// Merge strategies enabled on the repository
    async fn get_merge_capabilities(&self) -> Result<MergeCapabilities>;

    /// Pull request numbers associated with a workflow run
    async fn pull_requests_for_workflow_run(&self, run: &WorkflowRun) -> Result<Vec<u64>>;
}
