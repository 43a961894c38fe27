//! Destination uploaders.
//!
//! Each destination platform stores re-uploaded attachments differently:
//! GitLab has a documented project upload endpoint, GitHub only offers the
//! browser-session protocol used by its web editor.

mod error;
mod github;
mod gitlab;

pub use error::UploadError;
pub use github::{GitHubSessionUploader, GITHUB_WEB_URL};
pub use gitlab::GitLabUploader;

use crate::attachments::LinkStyle;
use async_trait::async_trait;

/// Uploads attachment bytes to a destination platform.
#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    /// Uploads a file and returns the URL it is reachable at.
    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, UploadError>;

    /// Whether uploads can succeed at all; when false, nothing is downloaded.
    fn is_available(&self) -> bool {
        true
    }

    /// How returned URLs should be written into rewritten bodies.
    fn link_style(&self) -> LinkStyle {
        LinkStyle::Absolute
    }
}

/// Reads a response body for error reporting, never failing.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
