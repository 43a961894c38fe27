//! GitHub attachment uploads through the web editor's session protocol.
//!
//! GitHub has no API for issue attachments. The web editor requests an upload
//! policy with the browser session cookie, posts the file to the storage URL
//! from that policy and then confirms the asset. None of this is documented,
//! so every step fails with a typed [`UploadError`] rather than assuming a
//! response shape.

use super::{error_body, AttachmentUploader, UploadError};
use crate::attachments::content_type_for;
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default GitHub web origin.
pub const GITHUB_WEB_URL: &str = "https://github.com";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Storage form fields, in the order the storage backend expects them.
const STORAGE_FORM_ORDER: &[&str] = &[
    "key",
    "acl",
    "policy",
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Date",
    "X-Amz-Signature",
    "Content-Type",
    "Cache-Control",
    "x-amz-meta-Surrogate-Control",
];

#[derive(Debug, Default, Deserialize)]
struct UploadPolicy {
    #[serde(default)]
    upload_url: String,
    #[serde(default)]
    header: HashMap<String, String>,
    #[serde(default)]
    asset: PolicyAsset,
    #[serde(default)]
    form: HashMap<String, String>,
    #[serde(default)]
    asset_upload_url: String,
    #[serde(default)]
    asset_upload_authenticity_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyAsset {
    id: Option<u64>,
    #[serde(default)]
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConfirmedAsset {
    #[serde(default)]
    href: String,
}

/// Uploads attachments to a GitHub repository using a browser session.
pub struct GitHubSessionUploader {
    client: Client,
    octocrab: Octocrab,
    owner: String,
    repo: String,
    web_url: String,
    session: Option<String>,
    repository_id: OnceCell<Option<String>>,
}

impl fmt::Debug for GitHubSessionUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSessionUploader")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("web_url", &self.web_url)
            .field("has_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl GitHubSessionUploader {
    /// Creates an uploader for `owner/repo`.
    ///
    /// An empty or missing session is accepted; uploads then fail with
    /// [`UploadError::SessionMissing`] without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Request`] if the HTTP client cannot be built.
    pub fn new(
        octocrab: Octocrab,
        owner: impl Into<String>,
        repo: impl Into<String>,
        session: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            octocrab,
            owner: owner.into(),
            repo: repo.into(),
            web_url: GITHUB_WEB_URL.to_string(),
            session: session.filter(|s| !s.is_empty()),
            repository_id: OnceCell::new(),
        })
    }

    /// Overrides the GitHub web origin (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_web_url(mut self, web_url: &str) -> Self {
        self.web_url = web_url.trim_end_matches('/').to_string();
        self
    }

    /// Uses a known repository id instead of looking it up.
    #[must_use]
    pub fn with_repository_id(self, id: u64) -> Self {
        let _ = self.repository_id.set(Some(id.to_string()));
        self
    }

    async fn repository_id(&self) -> Option<&str> {
        self.repository_id
            .get_or_init(|| async {
                match self.octocrab.repos(&self.owner, &self.repo).get().await {
                    Ok(repository) => Some(repository.id.to_string()),
                    Err(e) => {
                        warn!(
                            repo = %format!("{}/{}", self.owner, self.repo),
                            error = %e,
                            "Failed to look up repository id, uploading without it"
                        );
                        None
                    }
                }
            })
            .await
            .as_deref()
    }

    fn session_request(&self, request: RequestBuilder, session: &str) -> RequestBuilder {
        request
            .header(header::COOKIE, format!("user_session={session}; logged_in=yes"))
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ORIGIN, self.web_url.as_str())
            .header(header::REFERER, format!("{}/", self.web_url))
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Github-Verified-Fetch", "true")
    }

    async fn request_policy(
        &self,
        session: &str,
        filename: &str,
        size: usize,
    ) -> Result<UploadPolicy, UploadError> {
        let mut form = Form::new();
        if let Some(id) = self.repository_id().await {
            form = form.text("repository_id", id.to_string());
        }
        let form = form
            .text("name", filename.to_string())
            .text("size", size.to_string())
            .text("content_type", content_type_for(filename));

        let nonce = format!("v2:{}", uuid::Uuid::new_v4());
        let request = self
            .client
            .post(format!("{}/upload/policies/assets", self.web_url))
            .header("X-Fetch-Nonce", nonce)
            .multipart(form);

        let response = self.session_request(request, session).send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {}
            StatusCode::UNPROCESSABLE_ENTITY => return Err(UploadError::SessionRejected),
            status => {
                let body = error_body(response).await;
                if body.contains("browser did something unexpected") {
                    return Err(UploadError::SessionRejected);
                }
                return Err(UploadError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| UploadError::Protocol(format!("invalid upload policy: {e}")))
    }

    /// Posts the file to the storage URL from the policy.
    ///
    /// Returns the redirect target when the storage answers with one.
    async fn store(
        &self,
        policy: &UploadPolicy,
        data: &[u8],
        filename: &str,
    ) -> Result<Option<String>, UploadError> {
        if policy.upload_url.is_empty() {
            return Err(UploadError::Protocol(
                "upload policy has neither an asset URL nor an upload URL".to_string(),
            ));
        }

        let content_type = policy
            .form
            .get("Content-Type")
            .cloned()
            .unwrap_or_else(|| content_type_for(filename));

        let mut form = Form::new();
        for key in STORAGE_FORM_ORDER {
            if let Some(value) = policy.form.get(*key) {
                form = form.text(*key, value.clone());
            }
        }
        let mut extra: Vec<_> = policy
            .form
            .iter()
            .filter(|(key, _)| !STORAGE_FORM_ORDER.contains(&key.as_str()))
            .collect();
        extra.sort();
        for (key, value) in extra {
            form = form.text(key.clone(), value.clone());
        }
        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(&content_type)?;
        let form = form.part("file", part);

        let mut headers = HeaderMap::new();
        for (name, value) in &policy.header {
            match (
                header::HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!(header = %name, "Skipping invalid storage header"),
            }
        }

        let response = self
            .client
            .post(&policy.upload_url)
            .headers(headers)
            .header(header::ORIGIN, self.web_url.as_str())
            .header(header::REFERER, format!("{}/", self.web_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FOUND || status == StatusCode::SEE_OTHER {
            return Ok(response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string));
        }
        if status.is_success() {
            return Ok(None);
        }

        Err(UploadError::Status {
            status: status.as_u16(),
            body: error_body(response).await,
        })
    }

    /// Confirms the stored asset. Returns the asset URL when GitHub reports one.
    async fn confirm(
        &self,
        session: &str,
        policy: &UploadPolicy,
    ) -> Result<Option<String>, UploadError> {
        if policy.asset_upload_url.is_empty() {
            return Ok(None);
        }

        let url = if policy.asset_upload_url.starts_with("http") {
            policy.asset_upload_url.clone()
        } else {
            format!("{}{}", self.web_url, policy.asset_upload_url)
        };
        let form = Form::new().text(
            "authenticity_token",
            policy.asset_upload_authenticity_token.clone(),
        );

        let response = self
            .session_request(self.client.put(url), session)
            .multipart(form)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                let confirmed: ConfirmedAsset = serde_json::from_str(&text).unwrap_or_default();
                Ok(Some(confirmed.href).filter(|href| !href.is_empty()))
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!(asset_id = ?policy.asset.id, "Asset was already confirmed");
                Ok(None)
            }
            status => Err(UploadError::Status {
                status: status.as_u16(),
                body: error_body(response).await,
            }),
        }
    }
}

#[async_trait]
impl AttachmentUploader for GitHubSessionUploader {
    fn is_available(&self) -> bool {
        self.session.is_some()
    }

    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, UploadError> {
        let Some(session) = self.session.as_deref() else {
            return Err(UploadError::SessionMissing);
        };

        debug!(filename, size = data.len(), "Requesting GitHub upload policy");
        let policy = self.request_policy(session, filename, data.len()).await?;

        if !policy.asset.href.is_empty() {
            info!(filename, url = %policy.asset.href, "GitHub provided asset URL with policy");
            return Ok(policy.asset.href);
        }

        let location = self.store(&policy, data, filename).await?;
        let confirmed = self.confirm(session, &policy).await?;

        match confirmed.or(location) {
            Some(url) => {
                info!(filename, url = %url, "Uploaded attachment to GitHub");
                Ok(url)
            }
            None => Err(UploadError::Protocol(
                "upload completed without an asset URL".to_string(),
            )),
        }
    }
}
