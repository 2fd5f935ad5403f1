//! Eligibility evaluation - decides whether a pull request is merged now,
//! retried later, or skipped
//!
//! The gate checks are pure functions over fetched data; `evaluate_pull_request`
//! gathers that data fresh on every call and runs the gates in order.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::labels::{is_do_not_merge_label, missing_required_labels};
use crate::platform::{MAX_PAGE_SIZE, PlatformService};
use crate::review::{commit_has_minimum_approvals, is_author_allowed};
use crate::types::{
    AuthorAssociation, MergeMethod, MergeRequest, MergeableState, PrState, PullRequest,
    RequiredStatusChecks,
};
use std::fmt;
use tracing::{error, info, warn};

/// Approvals required on the head commit
pub const MINIMUM_APPROVALS: usize = 1;

/// Why a pull request is not merged this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Already merged
    AlreadyMerged,
    /// Closed without merging
    Closed,
    /// PR author's association is not on the allow-list
    AuthorNotAllowed(Option<AuthorAssociation>),
    /// Base branch has no required status checks
    NoRequiredChecks {
        /// Base branch name
        base: String,
    },
    /// Required status checks have not all passed
    ChecksNotPassed,
    /// Head commit lacks an approval from an allowed reviewer
    NotApproved,
    /// A do-not-merge label is applied
    DoNotMergeLabel(String),
    /// Required labels are missing
    MissingRequiredLabels(Vec<String>),
    /// PR is a draft
    Draft,
    /// PR has merge conflicts
    MergeConflicts,
    /// `mergeable_state` value we do not act on
    UnsupportedMergeableState(MergeableState),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMerged => write!(f, "already merged"),
            Self::Closed => write!(f, "closed"),
            Self::AuthorNotAllowed(Some(association)) => {
                write!(f, "author association {association} is not allowed")
            }
            Self::AuthorNotAllowed(None) => write!(f, "author association is unknown"),
            Self::NoRequiredChecks { base } => write!(
                f,
                "base branch '{base}' has no required status checks"
            ),
            Self::ChecksNotPassed => write!(f, "required status checks have not passed"),
            Self::NotApproved => write!(f, "not approved"),
            Self::DoNotMergeLabel(label) => write!(f, "labeled '{label}'"),
            Self::MissingRequiredLabels(labels) => {
                write!(f, "missing required labels: {}", labels.join(", "))
            }
            Self::Draft => write!(f, "draft"),
            Self::MergeConflicts => write!(f, "has merge conflicts"),
            Self::UnsupportedMergeableState(state) => {
                write!(f, "unsupported mergeable state '{state}'")
            }
        }
    }
}

/// Result of one evaluation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not eligible; no retry
    Skipped(SkipReason),
    /// Eligible, but dry-run mode is on
    DryRun {
        /// Method that would have been used
        method: Option<MergeMethod>,
    },
    /// Merged
    Merged {
        /// Merge commit SHA
        sha: Option<String>,
    },
    /// Merge call failed with attempts remaining
    RetryRequested {
        /// Failure message
        error: String,
    },
    /// Failure to be reported at the process boundary
    Failed {
        /// Failure message
        error: String,
    },
}

impl Outcome {
    /// Whether the scheduler should re-enqueue the pull request
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::RetryRequested { .. })
    }
}

/// Gates 1-3: merged, closed, author allow-list
pub fn check_pull_request(pr: &PullRequest, config: &Config) -> Option<SkipReason> {
    if pr.merged {
        return Some(SkipReason::AlreadyMerged);
    }
    if pr.state == PrState::Closed {
        return Some(SkipReason::Closed);
    }
    if !config.pull_request_author_associations.is_empty()
        && !is_author_allowed(pr, &config.pull_request_author_associations)
    {
        return Some(SkipReason::AuthorNotAllowed(pr.author_association.clone()));
    }
    None
}

/// Gates 4-5: the base branch must require checks, and they must pass
pub fn check_status_checks(pr: &PullRequest, checks: &RequiredStatusChecks) -> Option<SkipReason> {
    if checks.count() == 0 {
        return Some(SkipReason::NoRequiredChecks {
            base: pr.base_ref.clone(),
        });
    }
    if !checks.all_passed {
        return Some(SkipReason::ChecksNotPassed);
    }
    None
}

/// Gates 7-8: do-not-merge labels and required labels
pub fn check_labels(pr: &PullRequest, config: &Config) -> Option<SkipReason> {
    if let Some(label) = pr
        .labels
        .iter()
        .find(|l| is_do_not_merge_label(l, &config.do_not_merge_labels))
    {
        return Some(SkipReason::DoNotMergeLabel(label.clone()));
    }

    let missing = missing_required_labels(&pr.labels, &config.required_labels);
    if !missing.is_empty() {
        return Some(SkipReason::MissingRequiredLabels(
            missing.into_iter().map(ToString::to_string).collect(),
        ));
    }
    None
}

/// Gate 9: mergeable state
///
/// Mergeability is computed asynchronously by GitHub, so every state that
/// might still merge is worth an attempt; the merge call has the final say.
pub fn check_mergeable_state(state: &MergeableState) -> Option<SkipReason> {
    match state {
        MergeableState::Draft => Some(SkipReason::Draft),
        MergeableState::Dirty => Some(SkipReason::MergeConflicts),
        MergeableState::Blocked
        | MergeableState::Clean
        | MergeableState::HasHooks
        | MergeableState::Unknown
        | MergeableState::Unstable => None,
        MergeableState::Behind | MergeableState::Other(_) => {
            Some(SkipReason::UnsupportedMergeableState(state.clone()))
        }
    }
}

/// Substitute `${title}` and `${number}` in a commit template
pub fn render_commit_template(template: &str, pr: &PullRequest) -> String {
    template
        .replace("${title}", &pr.title)
        .replace("${number}", &pr.number.to_string())
}

/// Build the merge call for `pr`
///
/// Commit templates only apply to squash merges.
pub fn build_merge_request(
    pr: &PullRequest,
    method: Option<MergeMethod>,
    config: &Config,
) -> MergeRequest {
    let is_squash = method == Some(MergeMethod::Squash);
    let render = |template: &Option<String>| {
        template
            .as_deref()
            .filter(|_| is_squash)
            .map(|t| render_commit_template(t, pr))
    };

    MergeRequest {
        number: pr.number,
        sha: pr.head_sha.clone(),
        method,
        commit_title: render(&config.squash_commit_title),
        commit_message: render(&config.squash_commit_message),
    }
}

/// Evaluate one pull request and act on the result (EFFECTFUL)
///
/// `tries_left` is the number of attempts remaining after this one. A failed
/// merge with attempts left requests a retry; with none left it is reported
/// as a failure. Errors while gathering data are reported as failures too.
pub async fn evaluate_pull_request(
    platform: &dyn PlatformService,
    config: &Config,
    number: u64,
    tries_left: u32,
) -> Outcome {
    match evaluate(platform, config, number, tries_left).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(pr_number = number, error = %e, "failed to evaluate pull request");
            Outcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

async fn evaluate(
    platform: &dyn PlatformService,
    config: &Config,
    number: u64,
    tries_left: u32,
) -> Result<Outcome> {
    let pr = platform.get_pull_request(number).await?;
    info!(pr_number = number, title = %pr.title, "evaluating pull request");

    if let Some(reason) = check_pull_request(&pr, config) {
        return Ok(skip(number, reason));
    }

    let checks = platform
        .get_required_status_checks(&pr.base_ref, &pr.head_sha)
        .await?;
    if let Some(reason) = check_status_checks(&pr, &checks) {
        return Ok(skip(number, reason));
    }

    let reviews = platform.list_reviews(number, MAX_PAGE_SIZE).await?;
    if reviews.len() >= usize::from(MAX_PAGE_SIZE) {
        let e = Error::TooManyReviews(number, reviews.len());
        error!(pr_number = number, "{e}");
        return Ok(Outcome::Failed {
            error: e.to_string(),
        });
    }
    if !commit_has_minimum_approvals(
        &reviews,
        &config.review_author_associations,
        &pr.head_sha,
        MINIMUM_APPROVALS,
    ) {
        return Ok(skip(number, SkipReason::NotApproved));
    }

    if let Some(reason) = check_labels(&pr, config) {
        return Ok(skip(number, reason));
    }

    if let Some(reason) = check_mergeable_state(&pr.mergeable_state) {
        if matches!(reason, SkipReason::UnsupportedMergeableState(_)) {
            warn!(pr_number = number, state = %pr.mergeable_state, "unsupported mergeable state, doing nothing");
            return Ok(Outcome::Skipped(reason));
        }
        return Ok(skip(number, reason));
    }

    let method = match config.merge_method {
        Some(method) => Some(method),
        None => platform.get_merge_capabilities().await?.preferred_method(),
    };

    if config.dry_run {
        info!(pr_number = number, method = ?method, "dry run: would merge pull request");
        return Ok(Outcome::DryRun { method });
    }

    let request = build_merge_request(&pr, method, config);
    info!(pr_number = number, method = ?method, "merging pull request");

    let failure = match platform.merge_pull_request(&request).await {
        Ok(result) if result.merged => {
            info!(pr_number = number, sha = ?result.sha, "merged pull request");
            return Ok(Outcome::Merged { sha: result.sha });
        }
        Ok(result) => Error::MergeFailed {
            number,
            message: result
                .message
                .unwrap_or_else(|| "merge was not performed".to_string()),
        }
        .to_string(),
        Err(e) => e.to_string(),
    };

    if tries_left == 0 {
        error!(pr_number = number, error = %failure, "merge failed with no attempts left");
        Ok(Outcome::Failed { error: failure })
    } else {
        error!(pr_number = number, tries_left, error = %failure, "merge failed, will retry");
        Ok(Outcome::RetryRequested { error: failure })
    }
}

fn skip(number: u64, reason: SkipReason) -> Outcome {
    info!(pr_number = number, reason = %reason, "skipping pull request");
    Outcome::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_inputs(|name| (name == "token").then(|| "t".to_string())).unwrap()
    }

    fn pr() -> PullRequest {
        PullRequest {
            number: 7,
            title: "Fix parser".to_string(),
            merged: false,
            state: PrState::Open,
            author: Some("alice".to_string()),
            author_association: Some(AuthorAssociation::Contributor),
            base_ref: "main".to_string(),
            head_sha: "abc".to_string(),
            mergeable_state: MergeableState::Clean,
            labels: vec![],
        }
    }

    #[test]
    fn test_merged_before_closed() {
        let mut pr = pr();
        pr.merged = true;
        pr.state = PrState::Closed;
        assert_eq!(check_pull_request(&pr, &config()), Some(SkipReason::AlreadyMerged));
    }

    #[test]
    fn test_closed() {
        let mut pr = pr();
        pr.state = PrState::Closed;
        assert_eq!(check_pull_request(&pr, &config()), Some(SkipReason::Closed));
    }

    #[test]
    fn test_author_allow_list_only_when_configured() {
        let mut config = config();
        assert_eq!(check_pull_request(&pr(), &config), None);

        config.pull_request_author_associations = vec![AuthorAssociation::Member];
        assert_eq!(
            check_pull_request(&pr(), &config),
            Some(SkipReason::AuthorNotAllowed(Some(AuthorAssociation::Contributor)))
        );
    }

    #[test]
    fn test_status_check_gates() {
        let pr = pr();
        assert_eq!(
            check_status_checks(&pr, &RequiredStatusChecks::default()),
            Some(SkipReason::NoRequiredChecks {
                base: "main".to_string()
            })
        );

        let failing = RequiredStatusChecks {
            contexts: vec!["ci".to_string()],
            all_passed: false,
        };
        assert_eq!(check_status_checks(&pr, &failing), Some(SkipReason::ChecksNotPassed));

        let passing = RequiredStatusChecks {
            contexts: vec!["ci".to_string()],
            all_passed: true,
        };
        assert_eq!(check_status_checks(&pr, &passing), None);
    }

    #[test]
    fn test_label_gates() {
        let mut config = config();
        config.required_labels = vec!["automerge".to_string()];

        let mut pr = pr();
        pr.labels = vec!["Do Not Merge".to_string(), "automerge".to_string()];
        assert_eq!(
            check_labels(&pr, &config),
            Some(SkipReason::DoNotMergeLabel("Do Not Merge".to_string()))
        );

        pr.labels = vec!["bug".to_string()];
        assert_eq!(
            check_labels(&pr, &config),
            Some(SkipReason::MissingRequiredLabels(vec!["automerge".to_string()]))
        );

        pr.labels = vec!["automerge".to_string()];
        assert_eq!(check_labels(&pr, &config), None);
    }

    #[test]
    fn test_mergeable_state_dispatch() {
        assert_eq!(check_mergeable_state(&MergeableState::Draft), Some(SkipReason::Draft));
        assert_eq!(
            check_mergeable_state(&MergeableState::Dirty),
            Some(SkipReason::MergeConflicts)
        );
        for state in [
            MergeableState::Blocked,
            MergeableState::Clean,
            MergeableState::HasHooks,
            MergeableState::Unknown,
            MergeableState::Unstable,
        ] {
            assert_eq!(check_mergeable_state(&state), None, "{state}");
        }
        assert!(matches!(
            check_mergeable_state(&MergeableState::from("weird")),
            Some(SkipReason::UnsupportedMergeableState(_))
        ));
    }

    #[test]
    fn test_commit_templates_only_for_squash() {
        let mut config = config();
        config.squash_commit_title = Some("${title} (#${number})".to_string());
        config.squash_commit_message = Some("Closes #${number}".to_string());

        let request = build_merge_request(&pr(), Some(MergeMethod::Squash), &config);
        assert_eq!(request.commit_title.as_deref(), Some("Fix parser (#7)"));
        assert_eq!(request.commit_message.as_deref(), Some("Closes #7"));
        assert_eq!(request.sha, "abc");

        let request = build_merge_request(&pr(), Some(MergeMethod::Merge), &config);
        assert_eq!(request.commit_title, None);
        assert_eq!(request.commit_message, None);
    }
}
