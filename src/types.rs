//! Core types for automerge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repository coordinates for the platform service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Base URL of the REST API (e.g. `https://api.github.com`)
    pub api_url: String,
}

/// PR state as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR is closed (merged or not)
    Closed,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// GitHub's derived, eventually consistent mergeability classification
///
/// Unrecognized wire values land in [`MergeableState::Other`] instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MergeableState {
    /// Head branch is behind the base branch
    Behind,
    /// Blocked by branch protection
    Blocked,
    /// Mergeable, all checks passing
    Clean,
    /// Merge conflicts
    Dirty,
    /// Draft pull request
    Draft,
    /// Mergeable with passing commit status and pre-receive hooks
    HasHooks,
    /// Not computed yet
    #[default]
    Unknown,
    /// Mergeable with non-passing commit status
    Unstable,
    /// Any value not listed above
    Other(String),
}

impl From<&str> for MergeableState {
    fn from(value: &str) -> Self {
        match value {
            "behind" => Self::Behind,
            "blocked" => Self::Blocked,
            "clean" => Self::Clean,
            "dirty" => Self::Dirty,
            "draft" => Self::Draft,
            "has_hooks" => Self::HasHooks,
            "unknown" => Self::Unknown,
            "unstable" => Self::Unstable,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MergeableState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<MergeableState> for String {
    fn from(value: MergeableState) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MergeableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Behind => "behind",
            Self::Blocked => "blocked",
            Self::Clean => "clean",
            Self::Dirty => "dirty",
            Self::Draft => "draft",
            Self::HasHooks => "has_hooks",
            Self::Unknown => "unknown",
            Self::Unstable => "unstable",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// A user's relationship to the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthorAssociation {
    /// Invited to collaborate on the repository
    Collaborator,
    /// Has previously committed to the repository
    Contributor,
    /// Has never contributed to GitHub before
    FirstTimer,
    /// Has not previously committed to the repository
    FirstTimeContributor,
    /// Placeholder for an unclaimed user
    Mannequin,
    /// Member of the organization
    Member,
    /// No association
    None,
    /// Owner of the repository
    Owner,
    /// Any value not listed above
    Other(String),
}

impl AuthorAssociation {
    /// Associations allowed to approve when nothing is configured
    pub fn default_reviewers() -> Vec<Self> {
        vec![Self::Collaborator, Self::Member, Self::Owner]
    }
}

impl From<&str> for AuthorAssociation {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "COLLABORATOR" => Self::Collaborator,
            "CONTRIBUTOR" => Self::Contributor,
            "FIRST_TIMER" => Self::FirstTimer,
            "FIRST_TIME_CONTRIBUTOR" => Self::FirstTimeContributor,
            "MANNEQUIN" => Self::Mannequin,
            "MEMBER" => Self::Member,
            "NONE" => Self::None,
            "OWNER" => Self::Owner,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for AuthorAssociation {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AuthorAssociation> for String {
    fn from(value: AuthorAssociation) -> Self {
        value.to_string()
    }
}

/// Strict parsing for configuration input: unknown associations are rejected.
impl FromStr for AuthorAssociation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from(s.trim()) {
            Self::Other(other) => Err(format!("unknown author association '{other}'")),
            known => Ok(known),
        }
    }
}

impl fmt::Display for AuthorAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collaborator => "COLLABORATOR",
            Self::Contributor => "CONTRIBUTOR",
            Self::FirstTimer => "FIRST_TIMER",
            Self::FirstTimeContributor => "FIRST_TIME_CONTRIBUTOR",
            Self::Mannequin => "MANNEQUIN",
            Self::Member => "MEMBER",
            Self::None => "NONE",
            Self::Owner => "OWNER",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// A pull request as seen by the eligibility evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Whether the PR has been merged
    pub merged: bool,
    /// Open or closed
    pub state: PrState,
    /// Login of the PR author, if the account still exists
    pub author: Option<String>,
    /// Author's association with the repository
    pub author_association: Option<AuthorAssociation>,
    /// Base branch name
    pub base_ref: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Derived mergeability
    pub mergeable_state: MergeableState,
    /// Applied label names, in API order
    pub labels: Vec<String>,
}

/// Review state, matched case-insensitively from the wire value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ReviewState {
    /// Review not yet submitted
    Pending,
    /// Comment-only review
    Commented,
    /// Approval
    Approved,
    /// Changes requested
    ChangesRequested,
    /// Review was dismissed
    Dismissed,
    /// Any value not listed above
    Other(String),
}

impl From<&str> for ReviewState {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "COMMENTED" => Self::Commented,
            "APPROVED" => Self::Approved,
            "CHANGES_REQUESTED" => Self::ChangesRequested,
            "DISMISSED" => Self::Dismissed,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for ReviewState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// A review submitted on a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Review ID
    pub id: u64,
    /// Head SHA the review was submitted against
    pub commit_id: Option<String>,
    /// Reviewer login, if the account still exists
    pub author: Option<String>,
    /// Reviewer's association with the repository
    pub author_association: Option<AuthorAssociation>,
    /// Review state
    pub state: ReviewState,
    /// Submission time (absent for pending reviews)
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Required status checks for a branch, evaluated against a head commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredStatusChecks {
    /// Names of the required check contexts
    pub contexts: Vec<String>,
    /// Whether every required context has passed on the head commit
    pub all_passed: bool,
}

impl RequiredStatusChecks {
    /// Number of required checks
    pub const fn count(&self) -> usize {
        self.contexts.len()
    }
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl FromStr for MergeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "squash" => Ok(Self::Squash),
            "rebase" => Ok(Self::Rebase),
            other => Err(format!(
                "unknown merge method '{other}' (expected merge, squash or rebase)"
            )),
        }
    }
}

/// Merge strategies enabled on the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MergeCapabilities {
    /// Merge commits allowed
    pub allow_merge_commit: bool,
    /// Squash merges allowed
    pub allow_squash_merge: bool,
    /// Rebase merges allowed
    pub allow_rebase_merge: bool,
}

impl MergeCapabilities {
    /// First enabled method in priority order: merge, squash, rebase
    pub const fn preferred_method(&self) -> Option<MergeMethod> {
        if self.allow_merge_commit {
            Some(MergeMethod::Merge)
        } else if self.allow_squash_merge {
            Some(MergeMethod::Squash)
        } else if self.allow_rebase_merge {
            Some(MergeMethod::Rebase)
        } else {
            None
        }
    }
}

/// Parameters of a merge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// PR number
    pub number: u64,
    /// Head SHA the merge must apply to
    pub sha: String,
    /// Merge method (`None` = platform default)
    pub method: Option<MergeMethod>,
    /// Commit title override
    pub commit_title: Option<String>,
    /// Commit message override
    pub commit_message: Option<String>,
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// A workflow run, as needed to resolve its pull requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// Run ID
    pub id: u64,
    /// Event that triggered the run
    pub event: String,
    /// Head branch name
    pub head_branch: Option<String>,
    /// Head commit SHA
    pub head_sha: String,
    /// Owner of the head repository (differs from the base owner for forks)
    pub head_owner: Option<String>,
    /// PR numbers GitHub associated with the run (empty for forks)
    pub pull_requests: Vec<u64>,
}
