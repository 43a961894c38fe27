//! Issue tracker collaborators.
//!
//! The migrator only talks to trackers through [`IssueSource`] and
//! [`IssueDestination`], so the orchestration logic never depends on a
//! concrete SDK.

mod error;
mod github;
mod gitlab;

pub use error::TrackerError;
pub use github::GitHubTracker;
pub use gitlab::{absolutize_upload_links, GitLabTracker};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported tracker platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    GitLab,
}

impl Platform {
    /// Human readable platform name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    /// Returns the state as a lowercase string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Platform-neutral view of a source issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerIssue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// Platform-neutral view of an issue comment.
#[derive(Debug, Clone)]
pub struct TrackerComment {
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Issue to create on the destination.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    /// Close the issue right after creating it.
    pub closed: bool,
}

/// An issue created on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub number: u64,
    pub url: String,
}

/// Read access to the tracker issues are migrated from.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Platform of this tracker.
    fn platform(&self) -> Platform;

    /// Fetches a single issue.
    async fn fetch_issue(&self, number: u64) -> Result<TrackerIssue, TrackerError>;

    /// Lists all user comments of an issue, oldest first.
    async fn list_comments(&self, number: u64) -> Result<Vec<TrackerComment>, TrackerError>;

    /// Lists all issues, open and closed.
    async fn list_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError>;
}

/// Write access to the tracker issues are migrated to.
#[async_trait]
pub trait IssueDestination: Send + Sync {
    /// Creates an issue.
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError>;

    /// Closes an issue.
    async fn close_issue(&self, number: u64) -> Result<(), TrackerError>;

    /// Adds a comment to an issue.
    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;
}
