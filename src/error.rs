//! Error types for automerge

use thiserror::Error;

/// Errors that can occur while evaluating or merging pull requests
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or contradictory configuration input
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub Actions context could not be read
    #[error("context error: {0}")]
    Context(String),

    /// Event payload could not be parsed
    #[error("failed to parse {event} event payload: {source}")]
    EventPayload {
        /// Name of the event being parsed
        event: String,
        /// Underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// GitHub API error with context
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Error reported by octocrab
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic platform error (used by mocks and adapters)
    #[error("platform error: {0}")]
    Platform(String),

    /// A pull request has more reviews than a single page can hold
    #[error("pull request #{0} has {1} or more reviews, which is not supported")]
    TooManyReviews(u64, usize),

    /// The merge call failed
    #[error("failed to merge pull request #{number}: {message}")]
    MergeFailed {
        /// Pull request number
        number: u64,
        /// Reason reported by the platform
        message: String,
    },
}

/// Result type alias for automerge operations
pub type Result<T> = std::result::Result<T, Error>;
