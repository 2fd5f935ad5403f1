//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    AuthorAssociation, MergeCapabilities, MergeMethod, MergeRequest, MergeResult,
    MergeableState, PlatformConfig, PrState, PullRequest, RequiredStatusChecks, Review,
    ReviewState, WorkflowRun,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Public GitHub REST API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

// REST response types. Only the fields the evaluator reads are modeled.

#[derive(Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Deserialize)]
struct WireLabel {
    name: String,
}

#[derive(Deserialize)]
struct WireRef {
    #[serde(rename = "ref")]
    ref_field: String,
    sha: String,
}

#[derive(Deserialize)]
struct WirePullRequest {
    number: u64,
    title: Option<String>,
    #[serde(default)]
    merged: bool,
    merged_at: Option<DateTime<Utc>>,
    state: PrState,
    user: Option<WireUser>,
    author_association: Option<AuthorAssociation>,
    base: WireRef,
    head: WireRef,
    mergeable_state: Option<MergeableState>,
    #[serde(default)]
    labels: Vec<WireLabel>,
}

impl From<WirePullRequest> for PullRequest {
    fn from(pr: WirePullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            // List responses omit `merged`; `merged_at` is always present.
            merged: pr.merged || pr.merged_at.is_some(),
            state: pr.state,
            author: pr.user.map(|u| u.login),
            author_association: pr.author_association,
            base_ref: pr.base.ref_field,
            head_sha: pr.head.sha,
            mergeable_state: pr.mergeable_state.unwrap_or_default(),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Deserialize)]
struct WireReview {
    id: u64,
    commit_id: Option<String>,
    user: Option<WireUser>,
    author_association: Option<AuthorAssociation>,
    state: ReviewState,
    submitted_at: Option<DateTime<Utc>>,
}

impl From<WireReview> for Review {
    fn from(review: WireReview) -> Self {
        Self {
            id: review.id,
            commit_id: review.commit_id,
            author: review.user.map(|u| u.login),
            author_association: review.author_association,
            state: review.state,
            submitted_at: review.submitted_at,
        }
    }
}

#[derive(Deserialize)]
struct WireRepository {
    allow_merge_commit: Option<bool>,
    allow_squash_merge: Option<bool>,
    allow_rebase_merge: Option<bool>,
}

#[derive(Serialize)]
struct ListParams<'a> {
    state: &'a str,
    per_page: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<&'a str>,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (status check lookups)
    token: String,
    /// HTTP client for raw requests (status check lookups)
    http_client: Client,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `api_url` defaults to [`DEFAULT_API_URL`]; GitHub Enterprise passes its
    /// `https://<host>/api/v3` URL here.
    pub fn new(token: &str, owner: String, repo: String, api_url: Option<String>) -> Result<Self> {
        let api_url = api_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(&api_url)
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("automerge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                owner,
                repo,
                api_url,
            },
            token: token.to_string(),
            http_client,
        })
    }

    fn repo_route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{suffix}", self.config.owner, self.config.repo)
    }

    /// Raw GET returning `None` on 404
    ///
    /// Protection and ruleset endpoints answer 404 for branches without
    /// rules. Any other non-success status is an error.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}{route}", self.config.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(route, "resource not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::GitHubApi(format!("GET {route} returned {status}")));
        }

        let value = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse {route}: {e}")))?;
        Ok(Some(value))
    }

    /// Required contexts from classic branch protection
    async fn protection_contexts(&self, branch: &str) -> Result<Option<Vec<String>>> {
        #[derive(Deserialize)]
        struct RequiredChecks {
            #[serde(default)]
            contexts: Vec<String>,
            #[serde(default)]
            checks: Vec<Check>,
        }

        #[derive(Deserialize)]
        struct Check {
            context: String,
        }

        let route = self.repo_route(&format!(
            "/branches/{}/protection/required_status_checks",
            urlencoding::encode(branch)
        ));

        let Some(checks) = self.get_optional::<RequiredChecks>(&route, &[]).await? else {
            return Ok(None);
        };

        let mut contexts = checks.contexts;
        for check in checks.checks {
            if !contexts.contains(&check.context) {
                contexts.push(check.context);
            }
        }
        Ok(Some(contexts))
    }

    /// Required contexts from repository rulesets active on the branch
    async fn ruleset_contexts(&self, branch: &str) -> Result<Option<Vec<String>>> {
        #[derive(Deserialize)]
        struct Rule {
            #[serde(rename = "type")]
            rule_type: String,
            parameters: Option<Parameters>,
        }

        #[derive(Deserialize)]
        struct Parameters {
            #[serde(default)]
            required_status_checks: Vec<Check>,
        }

        #[derive(Deserialize)]
        struct Check {
            context: String,
        }

        let route = self.repo_route(&format!("/rules/branches/{}", urlencoding::encode(branch)));

        let Some(rules) = self.get_optional::<Vec<Rule>>(&route, &[]).await? else {
            return Ok(None);
        };

        let mut contexts: Vec<String> = Vec::new();
        let mut found = false;
        for rule in rules {
            if rule.rule_type != "required_status_checks" {
                continue;
            }
            found = true;
            for check in rule.parameters.map(|p| p.required_status_checks).unwrap_or_default() {
                if !contexts.contains(&check.context) {
                    contexts.push(check.context);
                }
            }
        }

        Ok(found.then_some(contexts))
    }

    /// Legacy commit statuses, keyed by context
    ///
    /// The combined status API already reports the latest state per context.
    async fn commit_statuses(&self, sha: &str) -> Result<HashMap<String, bool>> {
        #[derive(Deserialize)]
        struct CombinedStatus {
            #[serde(default)]
            statuses: Vec<Status>,
        }

        #[derive(Deserialize)]
        struct Status {
            context: String,
            state: String,
        }

        let route = self.repo_route(&format!("/commits/{sha}/status"));
        let Some(status) = self.get_optional::<CombinedStatus>(&route, &[]).await? else {
            debug!("No commit statuses found");
            return Ok(HashMap::new());
        };

        Ok(status
            .statuses
            .into_iter()
            .map(|s| (s.context, s.state == "success"))
            .collect())
    }

    /// GitHub Actions check runs, keyed by name
    async fn check_runs(&self, sha: &str) -> Result<HashMap<String, bool>> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            #[serde(default)]
            check_runs: Vec<CheckRun>,
        }

        #[derive(Deserialize)]
        struct CheckRun {
            name: String,
            status: String,
            conclusion: Option<String>,
        }

        let route = self.repo_route(&format!("/commits/{sha}/check-runs"));
        let Some(response) = self
            .get_optional::<CheckRunsResponse>(&route, &[("per_page", "100")])
            .await?
        else {
            debug!("No check runs found");
            return Ok(HashMap::new());
        };

        let mut results: HashMap<String, bool> = HashMap::new();
        for run in response.check_runs {
            let passed = run.status == "completed"
                && matches!(
                    run.conclusion.as_deref(),
                    Some("success" | "neutral" | "skipped")
                );
            if !passed {
                debug!(name = %run.name, status = %run.status, conclusion = ?run.conclusion, "check run not passing");
            }
            results
                .entry(run.name)
                .and_modify(|p| *p = *p && passed)
                .or_insert(passed);
        }
        Ok(results)
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        debug!(pr_number = number, "getting pull request");
        let pr: WirePullRequest = self
            .client
            .get(self.repo_route(&format!("/pulls/{number}")), None::<&()>)
            .await?;
        Ok(pr.into())
    }

    async fn list_reviews(&self, number: u64, per_page: u8) -> Result<Vec<Review>> {
        debug!(pr_number = number, per_page, "listing reviews");
        let reviews: Vec<WireReview> = self
            .client
            .get(
                self.repo_route(&format!("/pulls/{number}/reviews")),
                Some(&PageParams { per_page }),
            )
            .await?;
        debug!(pr_number = number, count = reviews.len(), "listed reviews");
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    async fn get_required_status_checks(
        &self,
        base_branch: &str,
        head_sha: &str,
    ) -> Result<RequiredStatusChecks> {
        debug!(base_branch, head_sha, "getting required status checks");

        // Rulesets win when they define the rule; classic protection is the fallback.
        let contexts = match self.ruleset_contexts(base_branch).await? {
            Some(contexts) => contexts,
            None => self.protection_contexts(base_branch).await?.unwrap_or_default(),
        };

        if contexts.is_empty() {
            return Ok(RequiredStatusChecks::default());
        }

        let statuses = self.commit_statuses(head_sha).await?;
        let check_runs = self.check_runs(head_sha).await?;

        // A context passes when some source reports it and none reports it failing.
        let all_passed = contexts.iter().all(|context| {
            let reported: Vec<bool> = [check_runs.get(context), statuses.get(context)]
                .into_iter()
                .flatten()
                .copied()
                .collect();
            let passed = !reported.is_empty() && reported.iter().all(|&p| p);
            if !passed {
                debug!(context = %context, "required check has not passed");
            }
            passed
        });

        Ok(RequiredStatusChecks {
            contexts,
            all_passed,
        })
    }

    async fn list_open_pull_requests(&self, per_page: u8) -> Result<Vec<PullRequest>> {
        debug!(per_page, "listing open pull requests");
        let prs: Vec<WirePullRequest> = self
            .client
            .get(
                self.repo_route("/pulls"),
                Some(&ListParams {
                    state: "open",
                    per_page,
                    head: None,
                }),
            )
            .await?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<MergeResult> {
        debug!(pr_number = request.number, method = ?request.method, "merging PR");

        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.merge(request.number).sha(request.sha.clone());

        if let Some(method) = request.method {
            builder = builder.method(match method {
                MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
                MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
                MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
            });
        }
        if let Some(ref title) = request.commit_title {
            builder = builder.title(title.clone());
        }
        if let Some(ref message) = request.commit_message {
            builder = builder.message(message.clone());
        }

        let result = builder.send().await.map_err(|e| Error::MergeFailed {
            number: request.number,
            message: e.to_string(),
        })?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number = request.number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn get_merge_capabilities(&self) -> Result<MergeCapabilities> {
        let repo: WireRepository = self.client.get(self.repo_route(""), None::<&()>).await?;
        Ok(MergeCapabilities {
            allow_merge_commit: repo.allow_merge_commit.unwrap_or(false),
            allow_squash_merge: repo.allow_squash_merge.unwrap_or(false),
            allow_rebase_merge: repo.allow_rebase_merge.unwrap_or(false),
        })
    }

    async fn pull_requests_for_workflow_run(&self, run: &WorkflowRun) -> Result<Vec<u64>> {
        if !run.pull_requests.is_empty() {
            return Ok(run.pull_requests.clone());
        }

        // Runs from forks carry no PR references; look them up by head branch.
        let Some(ref branch) = run.head_branch else {
            return Ok(Vec::new());
        };
        let owner = run.head_owner.as_deref().unwrap_or(&self.config.owner);
        let head = format!("{owner}:{branch}");

        debug!(run_id = run.id, head = %head, "resolving pull requests for workflow run");
        let prs: Vec<WirePullRequest> = self
            .client
            .get(
                self.repo_route("/pulls"),
                Some(&ListParams {
                    state: "open",
                    per_page: super::MAX_PAGE_SIZE,
                    head: Some(&head),
                }),
            )
            .await?;

        Ok(prs
            .into_iter()
            .filter(|pr| pr.head.sha == run.head_sha)
            .map(|pr| pr.number)
            .collect())
    }
}
