//! Per-request collaborator bundle.

use super::{RunnerConfig, RunnerError};
use crate::attachments::{AttachmentFetcher, SourceCredentials};
use crate::config::{Direction, PlatformConfig};
use crate::trackers::{GitHubTracker, GitLabTracker, IssueDestination, IssueSource, Platform};
use crate::uploads::{AttachmentUploader, GitHubSessionUploader, GitLabUploader};
use tracing::debug;

/// Default GitHub REST API root.
const GITHUB_API_URL: &str = "https://api.github.com";

/// Everything needed to migrate issues in one direction.
///
/// Built once per request from the request's own credentials.
pub struct MigrationContext {
    pub source: Box<dyn IssueSource>,
    pub destination: Box<dyn IssueDestination>,
    pub uploader: Box<dyn AttachmentUploader>,
    pub fetcher: AttachmentFetcher,
}

impl MigrationContext {
    /// Assembles a context from explicit collaborators.
    #[must_use]
    pub fn new(
        source: Box<dyn IssueSource>,
        destination: Box<dyn IssueDestination>,
        uploader: Box<dyn AttachmentUploader>,
        fetcher: AttachmentFetcher,
    ) -> Self {
        Self {
            source,
            destination,
            uploader,
            fetcher,
        }
    }

    /// Builds the clients for a validated direction.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if a client cannot be constructed.
    pub fn for_direction(
        direction: Direction,
        source: &PlatformConfig,
        target: &PlatformConfig,
        config: &RunnerConfig,
    ) -> Result<Self, RunnerError> {
        debug!(%direction, "Building migration clients");

        match direction {
            Direction::GitHubToGitLab => {
                let credentials = SourceCredentials::github(
                    source.token.as_str(),
                    source.github_api_url().unwrap_or(GITHUB_API_URL),
                );
                let destination = GitLabTracker::new(
                    &target.base_url,
                    target.project_id.as_str(),
                    target.token.as_str(),
                    config.request_timeout(),
                )?;
                let uploader = GitLabUploader::new(
                    &target.base_url,
                    target.project_id.as_str(),
                    target.token.as_str(),
                    config.upload_timeout(),
                )?;

                Ok(Self::new(
                    build_source(Platform::GitHub, source, config)?,
                    Box::new(destination),
                    Box::new(uploader),
                    AttachmentFetcher::new(credentials, config.download_timeout())?,
                ))
            }
            Direction::GitLabToGitHub => {
                let credentials = SourceCredentials::gitlab(
                    &source.base_url,
                    source.token.as_str(),
                    source.session().map(str::to_string),
                );
                let destination = GitHubTracker::new(
                    &target.token,
                    target.github_api_url(),
                    target.owner.as_str(),
                    target.repo.as_str(),
                )?;
                let uploader = GitHubSessionUploader::new(
                    destination.client().clone(),
                    target.owner.as_str(),
                    target.repo.as_str(),
                    target.session().map(str::to_string),
                    config.upload_timeout(),
                )?
                .with_web_url(config.github_web_url());

                Ok(Self::new(
                    build_source(Platform::GitLab, source, config)?,
                    Box::new(destination),
                    Box::new(uploader),
                    AttachmentFetcher::new(credentials, config.download_timeout())?,
                ))
            }
        }
    }
}

/// Builds a read-only tracker client for `platform`.
///
/// # Errors
///
/// Returns [`RunnerError`] if the client cannot be constructed.
pub fn build_source(
    platform: Platform,
    config: &PlatformConfig,
    runner: &RunnerConfig,
) -> Result<Box<dyn IssueSource>, RunnerError> {
    Ok(match platform {
        Platform::GitHub => Box::new(GitHubTracker::new(
            &config.token,
            config.github_api_url(),
            config.owner.as_str(),
            config.repo.as_str(),
        )?),
        Platform::GitLab => Box::new(GitLabTracker::new(
            &config.base_url,
            config.project_id.as_str(),
            config.token.as_str(),
            runner.request_timeout(),
        )?),
    })
}
