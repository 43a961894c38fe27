//! GitLab REST API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct User {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Issue {
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub web_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Note {
    #[serde(default)]
    pub body: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// System notes record label changes, mentions and similar events.
    #[serde(default)]
    pub system: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateIssue<'a> {
    pub title: &'a str,
    pub description: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub labels: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateIssue {
    pub state_event: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateNote<'a> {
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedIssue {
    pub iid: u64,
    pub web_url: String,
}
