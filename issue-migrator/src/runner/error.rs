//! Runner error types.

use crate::attachments::DownloadError;
use crate::config::ConfigError;
use crate::templates::TemplateError;
use crate::trackers::TrackerError;
use crate::uploads::UploadError;

/// Errors that prevent a migration request from starting.
///
/// Failures of individual issues never surface here; they are recorded in
/// the [`MigrationResult`](crate::summary::MigrationResult).
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Invalid request or configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tracker client initialization or listing errors.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Uploader initialization errors.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Download client initialization errors.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Header templates failed to compile.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl RunnerError {
    /// Returns true if the caller sent an invalid request.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::Config(ConfigError::InvalidDirection(_) | ConfigError::InvalidPlatform { .. })
        )
    }
}
