//! Attachment upload error types.

use thiserror::Error;

/// Errors that can occur while uploading an attachment to the destination.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request could not be built or sent.
    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The destination answered with an unexpected status.
    #[error("upload failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The GitLab token cannot write to the project.
    #[error(
        "upload failed with status 403 Forbidden - Check that your GitLab token has 'api' scope \
         and write access to project {project}: {body}"
    )]
    PermissionDenied { project: String, body: String },

    /// No GitHub browser session was supplied.
    #[error(
        "GitHub file upload requires browser session authentication; \
         provide the 'user_session' cookie value"
    )]
    SessionMissing,

    /// GitHub rejected the browser session.
    #[error("GitHub upload not available - session may be invalid or expired")]
    SessionRejected,

    /// The destination answered with something we do not understand.
    #[error("Unexpected upload response: {0}")]
    Protocol(String),
}

impl UploadError {
    /// Returns true for errors caused by missing destination permissions.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::SessionMissing | Self::SessionRejected
        )
    }
}
