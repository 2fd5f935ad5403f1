//! Action input configuration
//!
//! Inputs follow the GitHub Actions convention: an input named `dry-run` is
//! read from the `INPUT_DRY-RUN` environment variable.

use crate::error::{Error, Result};
use crate::types::{AuthorAssociation, MergeMethod};

/// Typed, validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Access token for the GitHub API
    pub token: String,
    /// Fixed merge method (`None` = pick from repository settings)
    pub merge_method: Option<MergeMethod>,
    /// Labels that veto a merge, in addition to the fuzzy "do not merge" match
    pub do_not_merge_labels: Vec<String>,
    /// Labels that must all be applied
    pub required_labels: Vec<String>,
    /// Explicit pull request to process, bypassing event-based discovery
    pub pull_request: Option<u64>,
    /// Allowed PR author associations (empty = any author)
    pub pull_request_author_associations: Vec<AuthorAssociation>,
    /// Associations whose reviews count
    pub review_author_associations: Vec<AuthorAssociation>,
    /// Log the intended merge without performing it
    pub dry_run: bool,
    /// Squash commit title template
    pub squash_commit_title: Option<String>,
    /// Squash commit message template
    pub squash_commit_message: Option<String>,
}

impl Config {
    /// Load configuration from `INPUT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_inputs(|name| std::env::var(input_env_name(name)).ok())
    }

    /// Load configuration from an arbitrary input lookup
    pub fn from_inputs<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = input("token")
            .ok_or_else(|| Error::Config("input 'token' is required".to_string()))?;

        let merge_method = input("merge-method")
            .map(|m| m.parse::<MergeMethod>().map_err(Error::Config))
            .transpose()?;

        let do_not_merge_labels = parse_list(input("do-not-merge-labels").as_deref());
        let required_labels = parse_list(input("required-labels").as_deref());

        if let Some(label) = required_labels
            .iter()
            .find(|l| do_not_merge_labels.iter().any(|d| d.eq_ignore_ascii_case(l)))
        {
            return Err(Error::Config(format!(
                "label '{label}' cannot be both a required label and a do-not-merge label"
            )));
        }

        let pull_request = input("pull-request")
            .map(|n| parse_pull_request_number(&n))
            .transpose()?;

        let pull_request_author_associations = parse_associations(
            "pull-request-author-associations",
            input("pull-request-author-associations").as_deref(),
        )?;

        let review_author_associations = match input("review-author-associations") {
            Some(value) => parse_associations("review-author-associations", Some(&value))?,
            None => AuthorAssociation::default_reviewers(),
        };

        let dry_run = input("dry-run")
            .map(|v| parse_bool("dry-run", &v))
            .transpose()?
            .unwrap_or(false);

        let squash_title = input("squash-title")
            .map(|v| parse_bool("squash-title", &v))
            .transpose()?
            .unwrap_or(false);

        let squash_commit_title = input("squash-commit-title").or_else(|| {
            squash_title.then(|| "${title} (#${number})".to_string())
        });

        Ok(Self {
            token,
            merge_method,
            do_not_merge_labels,
            required_labels,
            pull_request,
            pull_request_author_associations,
            review_author_associations,
            dry_run,
            squash_commit_title,
            squash_commit_message: input("squash-commit-message"),
        })
    }
}

/// Environment variable holding the input `name`
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Parse a pull request number input
pub fn parse_pull_request_number(value: &str) -> Result<u64> {
    let trimmed = value.trim().trim_start_matches('#');
    trimmed
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Config(format!("'{value}' is not a valid pull request number")))
}

/// Split a comma- or newline-separated list, dropping empty entries
fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_associations(name: &str, value: Option<&str>) -> Result<Vec<AuthorAssociation>> {
    parse_list(value)
        .iter()
        .map(|a| {
            a.parse::<AuthorAssociation>()
                .map_err(|e| Error::Config(format!("input '{name}': {e}")))
        })
        .collect()
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(Error::Config(format!(
            "input '{name}' must be a boolean (true or false), got '{other}'"
        ))),
    }
}
