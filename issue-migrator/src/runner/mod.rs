//! Orchestrates issue migrations.
//!
//! Each requested issue is fetched from the source, its attachments are moved,
//! a provenance header is prepended and the issue is recreated on the
//! destination together with its comments. Failures stay inside the issue
//! they happened in and end up in the [`MigrationResult`].

mod config;
mod context;
mod error;

pub use config::RunnerConfig;
pub use context::{build_source, MigrationContext};
pub use error::RunnerError;

use crate::attachments::migrate_attachments;
use crate::config::{MigrationRequest, PlatformConfig};
use crate::summary::{MigrationResult, MigrationStatus};
use crate::templates::TemplateRenderer;
use crate::trackers::{IssueState, NewIssue, Platform, TrackerIssue};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

/// Migrates issues between two trackers.
pub struct Migrator {
    context: MigrationContext,
    renderer: TemplateRenderer,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl Migrator {
    /// Creates a migrator over a collaborator bundle.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if the header templates fail to compile.
    pub fn new(context: MigrationContext, config: &RunnerConfig) -> Result<Self, RunnerError> {
        Ok(Self {
            context,
            renderer: TemplateRenderer::new()?,
            concurrency: config.concurrency(),
            deadline: config.migration_timeout(),
        })
    }

    /// Migrates every id in `issue_ids`.
    ///
    /// Issues are started in request order, at most `concurrency` at a time.
    /// Once `cancel` fires or the deadline passes no further issue is started;
    /// issues already running finish and the remaining ids are recorded as
    /// failed. The ledger always holds exactly one entry per requested id, in
    /// request order.
    pub async fn migrate(&self, issue_ids: &[u64], cancel: &CancellationToken) -> MigrationResult {
        info!(
            count = issue_ids.len(),
            concurrency = self.concurrency,
            "Starting migration"
        );

        let deadline = self.deadline;
        let stop = async move {
            let expired = async {
                match deadline {
                    Some(timeout) => tokio::time::sleep(timeout).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                () = cancel.cancelled() => warn!("Migration cancelled"),
                () = expired => warn!("Migration deadline reached"),
            }
        };

        let mut finished: Vec<(usize, MigrationStatus)> =
            stream::iter(issue_ids.iter().copied().enumerate())
                .take_until(stop)
                .map(|(index, id)| async move { (index, self.migrate_issue(id).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        finished.sort_by_key(|(index, _)| *index);
        let mut finished = finished.into_iter().peekable();

        let mut result = MigrationResult::new();
        for (index, id) in issue_ids.iter().enumerate() {
            match finished.next_if(|(i, _)| *i == index) {
                Some((_, status)) => result.record(status),
                None => result.record(MigrationStatus::failed(
                    *id,
                    "migration cancelled before this issue was started",
                )),
            }
        }

        info!(
            success = result.success.len(),
            failed = result.failed.len(),
            "Migration completed"
        );
        result
    }

    /// Migrates a single issue with its comments.
    pub async fn migrate_issue(&self, id: u64) -> MigrationStatus {
        let span = info_span!("migrate_issue", issue = id);

        async {
            let source = &self.context.source;
            let issue = match source.fetch_issue(id).await {
                Ok(issue) => issue,
                Err(e) => {
                    error!(error = %e, "Failed to fetch issue");
                    return MigrationStatus::failed(id, format!("Failed to fetch issue: {e}"));
                }
            };

            let new_issue = match self.prepare_issue(source.platform(), &issue).await {
                Ok(new_issue) => new_issue,
                Err(e) => {
                    error!(error = %e, "Failed to render issue header");
                    return MigrationStatus::failed(id, format!("Failed to render issue: {e}"));
                }
            };

            let destination = &self.context.destination;
            let created = match destination.create_issue(&new_issue).await {
                Ok(created) => created,
                Err(e) => {
                    error!(error = %e, "Failed to create issue");
                    return MigrationStatus::failed(id, format!("Failed to create issue: {e}"));
                }
            };
            info!(new_issue = created.number, url = %created.url, "Created destination issue");

            if new_issue.closed {
                if let Err(e) = destination.close_issue(created.number).await {
                    warn!(new_issue = created.number, error = %e, "Failed to close issue");
                }
            }

            self.migrate_comments(id, created.number).await;

            MigrationStatus::migrated(id, created.number, created.url)
        }
        .instrument(span)
        .await
    }

    async fn prepare_issue(
        &self,
        platform: Platform,
        issue: &TrackerIssue,
    ) -> Result<NewIssue, RunnerError> {
        let migrated = migrate_attachments(
            &issue.body,
            &self.context.fetcher,
            self.context.uploader.as_ref(),
        )
        .await;
        let header = self.renderer.render_provenance(platform, issue)?;

        Ok(NewIssue {
            title: issue.title.clone(),
            body: format!("{header}{}", migrated.body),
            labels: issue.labels.clone(),
            closed: issue.state == IssueState::Closed,
        })
    }

    async fn migrate_comments(&self, id: u64, new_id: u64) {
        let comments = match self.context.source.list_comments(id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(error = %e, "Failed to list comments, skipping them");
                return;
            }
        };

        let total = comments.len();
        let mut posted = 0;
        for comment in &comments {
            let migrated = migrate_attachments(
                &comment.body,
                &self.context.fetcher,
                self.context.uploader.as_ref(),
            )
            .await;

            let body = match self.renderer.render_comment(comment, &migrated.body) {
                Ok(body) => body,
                Err(e) => {
                    warn!(author = %comment.author, error = %e, "Failed to render comment");
                    continue;
                }
            };

            match self.context.destination.create_comment(new_id, &body).await {
                Ok(()) => posted += 1,
                Err(e) => warn!(author = %comment.author, error = %e, "Failed to post comment"),
            }
        }

        if total > 0 {
            info!(posted, total, "Migrated comments");
        }
    }
}

/// Validates a request, builds its clients and runs the migration.
///
/// # Errors
///
/// Returns [`RunnerError`] if the request is invalid or a client cannot be
/// built. Per-issue failures are part of the returned result instead.
pub async fn run_migration(
    request: &MigrationRequest,
    config: &RunnerConfig,
    cancel: &CancellationToken,
) -> Result<MigrationResult, RunnerError> {
    let direction = request.validate()?;
    info!(%direction, issues = ?request.issue_ids, "Received migration request");

    let context =
        MigrationContext::for_direction(direction, &request.source, &request.target, config)?;
    let migrator = Migrator::new(context, config)?;
    Ok(migrator.migrate(&request.issue_ids, cancel).await)
}

/// Lists all issues of a tracker.
///
/// # Errors
///
/// Returns [`RunnerError`] if the configuration is incomplete or the tracker
/// cannot be queried.
pub async fn list_issues(
    platform: Platform,
    config: &PlatformConfig,
    runner: &RunnerConfig,
) -> Result<Vec<TrackerIssue>, RunnerError> {
    config.validate_for(platform, "source")?;
    let source = build_source(platform, config, runner)?;
    let issues = source.list_issues().await?;
    info!(%platform, count = issues.len(), "Listed issues");
    Ok(issues)
}
