//! Tracker error types.

use thiserror::Error;

/// Errors that can occur while talking to an issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),

    /// HTTP transport error.
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with an unexpected status.
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The requested number refers to a pull request, not an issue.
    #[error("#{number} is a pull request, not an issue")]
    PullRequest { number: u64 },
}

impl TrackerError {
    /// Returns true if the error indicates missing permissions.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::GitHub(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("403") || msg.contains("forbidden")
            }
            Self::Status { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
