//! Attachment download error types.

use thiserror::Error;

/// Errors that can occur while downloading an attachment.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL could not be parsed.
    #[error("Invalid attachment URL '{url}'")]
    InvalidUrl { url: String },

    /// The request could not be sent.
    #[error("Failed to download '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with a non-200 status.
    #[error("Download of '{url}' failed with status {status}")]
    Status { url: String, status: u16 },

    /// The source refused access to the file.
    #[error("Download of '{url}' failed with status {status} - {hint}")]
    Inaccessible {
        url: String,
        status: u16,
        hint: &'static str,
    },

    /// The response body could not be read.
    #[error("Failed to read body of '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build download client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DownloadError {
    /// Returns the HTTP status if the source answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Inaccessible { status, .. } => Some(*status),
            _ => None,
        }
    }
}
