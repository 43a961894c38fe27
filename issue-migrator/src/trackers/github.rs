//! GitHub tracker backed by octocrab.

use super::{
    CreatedIssue, IssueDestination, IssueSource, IssueState, NewIssue, Platform, TrackerComment,
    TrackerError, TrackerIssue,
};
use crate::rate_limit::ensure_core_rate_limit;
use async_trait::async_trait;
use octocrab::models::issues::{Comment, Issue};
use octocrab::{params, Octocrab, Page};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Results requested per page when listing.
const RESULTS_PER_PAGE: u8 = 100;

/// A GitHub repository's issue tracker.
#[derive(Debug, Clone)]
pub struct GitHubTracker {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubTracker {
    /// Creates a tracker with a client authenticated by `token`.
    ///
    /// `api_base_url` overrides `https://api.github.com` (GitHub Enterprise,
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::GitHub`] if the client cannot be built.
    pub fn new(
        token: &str,
        api_base_url: Option<&str>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, TrackerError> {
        let mut builder = Octocrab::builder();
        if !token.is_empty() {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(base) = api_base_url {
            builder = builder.base_uri(base)?;
        }
        Ok(Self::from_client(builder.build()?, owner, repo))
    }

    /// Creates a tracker around an existing client.
    #[must_use]
    pub fn from_client(
        octocrab: Octocrab,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            octocrab,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &Octocrab {
        &self.octocrab
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn collect_pages<T: DeserializeOwned>(
        &self,
        mut page: Page<T>,
    ) -> Result<Vec<T>, TrackerError> {
        let mut items = page.take_items();
        while let Some(mut next) = self.octocrab.get_page::<T>(&page.next).await? {
            items.extend(next.take_items());
            page.next = next.next;
        }
        Ok(items)
    }
}

fn to_tracker_issue(issue: Issue) -> TrackerIssue {
    let state = match issue.state {
        octocrab::models::IssueState::Closed => IssueState::Closed,
        _ => IssueState::Open,
    };

    TrackerIssue {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        state,
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        author: issue.user.login,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        url: issue.html_url.to_string(),
    }
}

fn to_tracker_comment(comment: Comment) -> TrackerComment {
    TrackerComment {
        author: comment.user.login,
        body: comment.body.unwrap_or_default(),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

#[async_trait]
impl IssueSource for GitHubTracker {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn fetch_issue(&self, number: u64) -> Result<TrackerIssue, TrackerError> {
        debug!(repo = %self.full_name(), number, "Fetching GitHub issue");
        let issue = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .get(number)
            .await?;

        if issue.pull_request.is_some() {
            return Err(TrackerError::PullRequest { number });
        }
        Ok(to_tracker_issue(issue))
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<TrackerComment>, TrackerError> {
        let page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list_comments(number)
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;

        let comments = self.collect_pages(page).await?;
        Ok(comments.into_iter().map(to_tracker_comment).collect())
    }

    async fn list_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError> {
        let page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list()
            .state(params::State::All)
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;

        let issues = self.collect_pages(page).await?;
        Ok(issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(to_tracker_issue)
            .collect())
    }
}

#[async_trait]
impl IssueDestination for GitHubTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        ensure_core_rate_limit(&self.octocrab).await?;

        let handler = self.octocrab.issues(&self.owner, &self.repo);
        let mut builder = handler.create(&issue.title).body(&issue.body);
        if !issue.labels.is_empty() {
            builder = builder.labels(issue.labels.clone());
        }
        let created = builder.send().await?;

        info!(repo = %self.full_name(), number = created.number, "Created GitHub issue");
        Ok(CreatedIssue {
            number: created.number,
            url: created.html_url.to_string(),
        })
    }

    async fn close_issue(&self, number: u64) -> Result<(), TrackerError> {
        ensure_core_rate_limit(&self.octocrab).await?;
        self.octocrab
            .issues(&self.owner, &self.repo)
            .update(number)
            .state(octocrab::models::IssueState::Closed)
            .send()
            .await?;
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        ensure_core_rate_limit(&self.octocrab).await?;
        self.octocrab
            .issues(&self.owner, &self.repo)
            .create_comment(number, body)
            .await?;
        Ok(())
    }
}
