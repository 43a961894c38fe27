//! GitLab project upload endpoint.

use super::{error_body, AttachmentUploader, UploadError};
use crate::attachments::{content_type_for, LinkStyle};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Uploads attachments through `POST /api/v4/projects/{id}/uploads`.
#[derive(Clone)]
pub struct GitLabUploader {
    client: Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl GitLabUploader {
    /// Creates an uploader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Request`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        project_id: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, base_url, project_id, token))
    }

    /// Creates an uploader around an existing client.
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

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v4/projects/{}/uploads",
            self.base_url,
            urlencoding::encode(&self.project_id)
        )
    }
}

#[async_trait]
impl AttachmentUploader for GitLabUploader {
    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, UploadError> {
        debug!(filename, size = data.len(), "Uploading attachment to GitLab");

        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(&content_type_for(filename))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint())
            .header("PRIVATE-TOKEN", self.token.as_str())
            .multipart(form)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {}
            StatusCode::FORBIDDEN => {
                return Err(UploadError::PermissionDenied {
                    project: self.project_id.clone(),
                    body: error_body(response).await,
                });
            }
            status => {
                return Err(UploadError::Status {
                    status: status.as_u16(),
                    body: error_body(response).await,
                });
            }
        }

        let uploaded: UploadResponse = response.json().await?;
        let url = if uploaded.url.starts_with('/') {
            format!("{}{}", self.base_url, uploaded.url)
        } else {
            uploaded.url
        };

        info!(filename, url = %url, "Uploaded attachment to GitLab");
        Ok(url)
    }

    fn link_style(&self) -> LinkStyle {
        LinkStyle::RelativeUploads
    }
}
