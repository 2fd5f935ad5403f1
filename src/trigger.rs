//! Trigger handlers - map the triggering event to pull request numbers

use crate::context::GitHubContext;
use crate::error::{Error, Result};
use crate::platform::{MAX_PAGE_SIZE, PlatformService};
use crate::types::WorkflowRun;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct NumberRef {
    number: u64,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: NumberRef,
}

#[derive(Deserialize)]
struct CheckSuitePayload {
    action: String,
    check_suite: CheckSuite,
}

#[derive(Deserialize)]
struct CheckSuite {
    #[serde(default)]
    pull_requests: Vec<NumberRef>,
}

#[derive(Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Deserialize)]
struct WorkflowRunPayload {
    action: String,
    workflow_run: WireWorkflowRun,
}

#[derive(Deserialize)]
struct WireWorkflowRun {
    id: u64,
    event: String,
    head_branch: Option<String>,
    head_sha: String,
    head_repository: Option<WireRepository>,
    #[serde(default)]
    pull_requests: Vec<NumberRef>,
}

#[derive(Deserialize)]
struct WireRepository {
    owner: Option<WireOwner>,
}

#[derive(Deserialize)]
struct WireOwner {
    login: String,
}

impl From<WireWorkflowRun> for WorkflowRun {
    fn from(run: WireWorkflowRun) -> Self {
        Self {
            id: run.id,
            event: run.event,
            head_branch: run.head_branch,
            head_sha: run.head_sha,
            head_owner: run.head_repository.and_then(|r| r.owner).map(|o| o.login),
            pull_requests: run.pull_requests.into_iter().map(|p| p.number).collect(),
        }
    }
}

/// Pull request actions after which a PR may have become mergeable
const PULL_REQUEST_ACTIONS: &[&str] = &[
    "opened",
    "reopened",
    "synchronize",
    "ready_for_review",
    "labeled",
    "unlabeled",
    "edited",
];

fn parse_payload<T: DeserializeOwned>(context: &GitHubContext) -> Result<T> {
    serde_json::from_value(context.payload.clone()).map_err(|source| Error::EventPayload {
        event: context.event_name.clone(),
        source,
    })
}

/// Pull request numbers to evaluate for the event in `context`
///
/// Numbers are deduplicated, keeping first-seen order.
pub async fn pull_requests_for_event(
    context: &GitHubContext,
    platform: &dyn PlatformService,
) -> Result<Vec<u64>> {
    let numbers = match context.event_name.as_str() {
        "pull_request" | "pull_request_target" => {
            let payload: PullRequestPayload = parse_payload(context)?;
            if PULL_REQUEST_ACTIONS.contains(&payload.action.as_str()) {
                vec![payload.pull_request.number]
            } else {
                debug!(action = %payload.action, "ignoring pull request action");
                Vec::new()
            }
        }
        "pull_request_review" => {
            let payload: PullRequestPayload = parse_payload(context)?;
            if payload.action == "submitted" {
                vec![payload.pull_request.number]
            } else {
                debug!(action = %payload.action, "ignoring review action");
                Vec::new()
            }
        }
        "check_suite" => {
            let payload: CheckSuitePayload = parse_payload(context)?;
            if payload.action == "completed" {
                payload
                    .check_suite
                    .pull_requests
                    .into_iter()
                    .map(|p| p.number)
                    .collect()
            } else {
                Vec::new()
            }
        }
        "workflow_run" => {
            let payload: WorkflowRunPayload = parse_payload(context)?;
            if payload.action == "completed" {
                let run = WorkflowRun::from(payload.workflow_run);
                platform.pull_requests_for_workflow_run(&run).await?
            } else {
                Vec::new()
            }
        }
        "push" => {
            let payload: PushPayload = parse_payload(context)?;
            match payload.ref_field.strip_prefix("refs/heads/") {
                Some(branch) => platform
                    .list_open_pull_requests(MAX_PAGE_SIZE)
                    .await?
                    .into_iter()
                    .filter(|pr| pr.base_ref == branch)
                    .map(|pr| pr.number)
                    .collect(),
                None => Vec::new(),
            }
        }
        "schedule" | "workflow_dispatch" | "repository_dispatch" => platform
            .list_open_pull_requests(MAX_PAGE_SIZE)
            .await?
            .into_iter()
            .map(|pr| pr.number)
            .collect(),
        other => {
            warn!(event = other, "unsupported event, nothing to do");
            Vec::new()
        }
    };

    let mut unique = Vec::with_capacity(numbers.len());
    for number in numbers {
        if !unique.contains(&number) {
            unique.push(number);
        }
    }

    info!(event = %context.event_name, pull_requests = ?unique, "resolved pull requests");
    Ok(unique)
}
