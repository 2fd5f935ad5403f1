//! Run command - evaluate and merge the triggering pull requests

use crate::cli::CliProgress;
use crate::cli::style::{CHECK, CROSS, Stylize};
use anstream::println;
use anyhow::{Context, Result};
use automerge::config::{Config, parse_pull_request_number};
use automerge::context::GitHubContext;
use automerge::merge::{AutomergeReport, run};
use automerge::platform::GitHubService;

/// Command-line overrides for the action inputs
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pull request number, overriding the `pull-request` input
    pub pull_request: Option<String>,
    /// Force dry-run mode
    pub dry_run: bool,
    /// `owner/repo`, overriding `GITHUB_REPOSITORY`
    pub repository: Option<String>,
}

/// Load configuration and context, then process the pull requests
///
/// Configuration is validated before anything else so that bad input fails
/// without touching the API.
pub async fn run_automerge(options: RunOptions) -> Result<AutomergeReport> {
    let mut config = Config::from_env()?;
    if let Some(ref number) = options.pull_request {
        config.pull_request = Some(parse_pull_request_number(number)?);
    }
    config.dry_run |= options.dry_run;

    let context = GitHubContext::from_env_with_repository(options.repository.as_deref())?;

    let platform = GitHubService::new(
        &config.token,
        context.owner.clone(),
        context.repo.clone(),
        context.api_url.clone(),
    )
    .context("failed to create GitHub client")?;

    if config.dry_run {
        println!("{}", "Dry run: no pull request will be merged".muted());
    }

    let report = run(&config, &context, &platform, &CliProgress).await?;
    print_summary(&report);
    Ok(report)
}

/// Print the batch summary
fn print_summary(report: &AutomergeReport) {
    let list = |numbers: &[u64]| {
        numbers
            .iter()
            .map(|n| format!("#{n}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    if report.is_success() {
        println!("{} {}", CHECK.success(), "Automerge complete".emphasis());
    } else {
        println!("{} {}", CROSS.error(), "Automerge finished with failures".emphasis());
    }

    if !report.merged.is_empty() {
        println!("   Merged: {}", list(&report.merged).accent());
    }
    if !report.dry_run.is_empty() {
        println!("   Would merge: {}", list(&report.dry_run).accent());
    }
    if !report.skipped.is_empty() {
        let skipped: Vec<u64> = report.skipped.iter().map(|(n, _)| *n).collect();
        println!("   Skipped: {}", list(&skipped).muted());
    }
    for (number, error) in &report.failed {
        println!("   {} #{number}: {}", "Failed:".error(), error.muted());
    }
}
