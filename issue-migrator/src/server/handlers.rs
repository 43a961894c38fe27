//! API handlers.

use super::{ApiError, AppState};
use crate::config::{GitHubListRequest, GitLabListRequest, MigrationRequest, PlatformConfig};
use crate::runner::{list_issues, run_migration};
use crate::summary::MigrationResult;
use crate::trackers::{Platform, TrackerIssue};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Issue as returned by the listing endpoints.
#[derive(Debug, Serialize)]
pub struct IssueView {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub state: &'static str,
    pub labels: Vec<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl From<TrackerIssue> for IssueView {
    fn from(issue: TrackerIssue) -> Self {
        Self {
            id: issue.number,
            title: issue.title,
            description: issue.body,
            state: issue.state.as_str(),
            labels: issue.labels,
            author: issue.author,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            url: issue.url,
        }
    }
}

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `POST /api/github/issues`
pub async fn list_github_issues(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GitHubListRequest>, JsonRejection>,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let Json(request) = payload?;
    list(&state, Platform::GitHub, request.into()).await
}

/// `POST /api/gitlab/issues`
pub async fn list_gitlab_issues(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GitLabListRequest>, JsonRejection>,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let Json(request) = payload?;
    list(&state, Platform::GitLab, request.into()).await
}

async fn list(
    state: &AppState,
    platform: Platform,
    config: PlatformConfig,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let issues = list_issues(platform, &config, &state.runner).await?;
    Ok(Json(issues.into_iter().map(IssueView::from).collect()))
}

/// `POST /api/migrate`
pub async fn migrate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MigrationRequest>, JsonRejection>,
) -> Result<Json<MigrationResult>, ApiError> {
    let Json(request) = payload?;
    let cancel = state.shutdown.child_token();
    let result = run_migration(&request, &state.runner, &cancel).await?;
    Ok(Json(result))
}
