//! GitLab tracker backed by the REST v4 API.

mod models;
mod urls;

pub use urls::absolutize_upload_links;

use super::{
    CreatedIssue, IssueDestination, IssueSource, IssueState, NewIssue, Platform, TrackerComment,
    TrackerError, TrackerIssue,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Results requested per page when listing.
const RESULTS_PER_PAGE: &str = "100";

/// A GitLab project's issue tracker.
#[derive(Clone)]
pub struct GitLabTracker {
    client: Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl GitLabTracker {
    /// Creates a tracker with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        project_id: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|source| TrackerError::Http {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self::with_client(client, base_url, project_id, token))
    }

    /// Creates a tracker around an existing client.
    #[must_use]
    pub fn with_client(
        client: Client,
        base_url: &str,
        project_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            token: token.into(),
        }
    }

    /// Returns the instance base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the project id or path.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v4/projects/{}{path}",
            self.base_url,
            urlencoding::encode(&self.project_id)
        )
    }

    fn absolutize(&self, body: &str) -> String {
        absolutize_upload_links(body, &self.base_url, &self.project_id)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<Response, TrackerError> {
        let request = if self.token.is_empty() {
            request
        } else {
            request.header("PRIVATE-TOKEN", self.token.as_str())
        };

        let response = request.send().await.map_err(|source| TrackerError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, TrackerError> {
        let text = response.text().await.map_err(|source| TrackerError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TrackerError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Fetches every page of a list endpoint, following `x-next-page`.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TrackerError> {
        let endpoint = self.endpoint(path);
        let mut items = Vec::new();
        let mut page = "1".to_string();

        loop {
            let request = self
                .client
                .get(&endpoint)
                .query(query)
                .query(&[("per_page", RESULTS_PER_PAGE), ("page", page.as_str())]);
            let response = self.execute(request, &endpoint).await?;

            let next = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let batch: Vec<T> = Self::decode(response, &endpoint).await?;
            debug!(endpoint = %endpoint, page = %page, count = batch.len(), "Fetched page");
            items.extend(batch);

            match next {
                Some(next) if next != page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }

    fn to_tracker_issue(&self, issue: models::Issue) -> TrackerIssue {
        let state = if issue.state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        };

        TrackerIssue {
            number: issue.iid,
            title: issue.title,
            body: self.absolutize(issue.description.as_deref().unwrap_or_default()),
            state,
            labels: issue.labels,
            author: issue.author.username,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            url: issue.web_url,
        }
    }
}

#[async_trait]
impl IssueSource for GitLabTracker {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn fetch_issue(&self, number: u64) -> Result<TrackerIssue, TrackerError> {
        let endpoint = self.endpoint(&format!("/issues/{number}"));
        debug!(endpoint = %endpoint, "Fetching GitLab issue");

        let response = self.execute(self.client.get(&endpoint), &endpoint).await?;
        let issue: models::Issue = Self::decode(response, &endpoint).await?;
        Ok(self.to_tracker_issue(issue))
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<TrackerComment>, TrackerError> {
        let notes: Vec<models::Note> = self
            .get_all(
                &format!("/issues/{number}/notes"),
                &[("sort", "asc"), ("order_by", "created_at")],
            )
            .await?;

        Ok(notes
            .into_iter()
            .filter(|note| !note.system)
            .map(|note| TrackerComment {
                author: note.author.username,
                body: self.absolutize(&note.body),
                created_at: note.created_at,
                updated_at: note.updated_at,
            })
            .collect())
    }

    async fn list_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError> {
        let issues: Vec<models::Issue> = self.get_all("/issues", &[("state", "all")]).await?;
        Ok(issues
            .into_iter()
            .map(|issue| self.to_tracker_issue(issue))
            .collect())
    }
}

#[async_trait]
impl IssueDestination for GitLabTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        let endpoint = self.endpoint("/issues");
        let payload = models::CreateIssue {
            title: &issue.title,
            description: &issue.body,
            labels: issue.labels.join(","),
        };

        let response = self
            .execute(self.client.post(&endpoint).json(&payload), &endpoint)
            .await?;
        let created: models::CreatedIssue = Self::decode(response, &endpoint).await?;

        info!(project = %self.project_id, number = created.iid, "Created GitLab issue");
        Ok(CreatedIssue {
            number: created.iid,
            url: created.web_url,
        })
    }

    async fn close_issue(&self, number: u64) -> Result<(), TrackerError> {
        let endpoint = self.endpoint(&format!("/issues/{number}"));
        let payload = models::UpdateIssue {
            state_event: "close",
        };
        self.execute(self.client.put(&endpoint).json(&payload), &endpoint)
            .await?;
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let endpoint = self.endpoint(&format!("/issues/{number}/notes"));
        self.execute(
            self.client
                .post(&endpoint)
                .json(&models::CreateNote { body }),
            &endpoint,
        )
        .await?;
        Ok(())
    }
}
