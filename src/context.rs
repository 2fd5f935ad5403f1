//! GitHub Actions run context
//!
//! Built once from the environment in `main` and passed explicitly to the
//! trigger handlers and the platform service.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Event name, payload, and repository coordinates of the current run
#[derive(Debug, Clone)]
pub struct GitHubContext {
    /// Name of the triggering event (`pull_request_review`, `schedule`, ...)
    pub event_name: String,
    /// Raw webhook payload
    pub payload: serde_json::Value,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// REST API base URL (`None` = public GitHub)
    pub api_url: Option<String>,
}

impl GitHubContext {
    /// Create a context from explicit values
    pub fn new(event_name: &str, payload: serde_json::Value, repository: &str) -> Result<Self> {
        let (owner, repo) = parse_repository(repository)?;
        Ok(Self {
            event_name: event_name.to_string(),
            payload,
            owner,
            repo,
            api_url: None,
        })
    }

    /// Read the context from the `GITHUB_*` variables set by the Actions runner
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_repository(None)
    }

    /// Like [`from_env`](Self::from_env), with an optional `owner/repo` override
    pub fn from_env_with_repository(repository: Option<&str>) -> Result<Self> {
        let repository = match repository {
            Some(repository) => repository.to_string(),
            None => std::env::var("GITHUB_REPOSITORY")
                .map_err(|_| Error::Context("GITHUB_REPOSITORY is not set".to_string()))?,
        };
        let event_name = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();

        let payload = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if Path::new(&path).exists() => {
                let content = fs::read_to_string(&path)
                    .map_err(|e| Error::Context(format!("failed to read {path}: {e}")))?;
                serde_json::from_str(&content).map_err(|source| Error::EventPayload {
                    event: event_name.clone(),
                    source,
                })?
            }
            _ => serde_json::Value::Null,
        };

        let mut context = Self::new(&event_name, payload, &repository)?;
        context.api_url = std::env::var("GITHUB_API_URL").ok().filter(|u| !u.is_empty());
        Ok(context)
    }
}

/// Split `owner/repo`
pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    match repository.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::Context(format!(
            "'{repository}' is not a valid repository (expected owner/repo)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository("octo/repo").unwrap(),
            ("octo".to_string(), "repo".to_string())
        );
        assert!(parse_repository("octo").is_err());
        assert!(parse_repository("octo/").is_err());
        assert!(parse_repository("a/b/c").is_err());
    }
}
