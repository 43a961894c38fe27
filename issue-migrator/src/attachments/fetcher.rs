//! Attachment downloads from the source platform.

use super::error::DownloadError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const HINT_NO_SESSION: &str = "GitLab upload URLs of private projects need a browser session; \
     provide the '_gitlab_session' cookie or make the project public during the migration";

const HINT_SESSION_REJECTED: &str =
    "the GitLab session cookie was provided but rejected; it may be expired or invalid";

/// Credentials of the platform attachments are downloaded from.
///
/// Credentials are only attached to requests for hosts owned by that
/// platform. Everything else is fetched anonymously.
#[derive(Clone, Default)]
pub enum SourceCredentials {
    /// No credentials.
    #[default]
    Anonymous,

    /// GitHub personal access token, sent as a bearer token.
    GitHub {
        token: String,
        /// Authority (`host[:port]`) of the REST API.
        api_host: String,
    },

    /// GitLab token or browser session.
    GitLab {
        /// Authority (`host[:port]`) of the GitLab instance.
        host: String,
        token: String,
        session: Option<String>,
    },
}

impl SourceCredentials {
    /// Credentials for a GitHub source.
    #[must_use]
    pub fn github(token: impl Into<String>, api_base_url: &str) -> Self {
        Self::GitHub {
            token: token.into(),
            api_host: authority_of(api_base_url).unwrap_or_else(|| "api.github.com".to_string()),
        }
    }

    /// Credentials for a GitLab source.
    #[must_use]
    pub fn gitlab(base_url: &str, token: impl Into<String>, session: Option<String>) -> Self {
        Self::GitLab {
            host: authority_of(base_url).unwrap_or_default(),
            token: token.into(),
            session: session.filter(|s| !s.is_empty()),
        }
    }

    /// Returns true if the URL belongs to the source platform.
    #[must_use]
    pub fn owns(&self, url: &Url) -> bool {
        let Some(authority) = url_authority(url) else {
            return false;
        };
        match self {
            Self::Anonymous => false,
            Self::GitHub { api_host, .. } => {
                authority == "github.com"
                    || authority.ends_with(".github.com")
                    || authority == *api_host
            }
            Self::GitLab { host, .. } => !host.is_empty() && authority == *host,
        }
    }

    fn authorize(&self, request: RequestBuilder, url: &Url) -> RequestBuilder {
        if !self.owns(url) {
            return request;
        }
        match self {
            Self::Anonymous => request,
            Self::GitHub { token, .. } if token.is_empty() => request,
            Self::GitHub { token, .. } => request.header(AUTHORIZATION, format!("Bearer {token}")),
            Self::GitLab {
                session: Some(session),
                ..
            } => request.header(COOKIE, format!("_gitlab_session={session}")),
            Self::GitLab { token, .. } if token.is_empty() => request,
            Self::GitLab { token, .. } => request.header("PRIVATE-TOKEN", token.as_str()),
        }
    }
}

impl fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::GitHub { api_host, .. } => f
                .debug_struct("GitHub")
                .field("api_host", api_host)
                .finish_non_exhaustive(),
            Self::GitLab { host, session, .. } => f
                .debug_struct("GitLab")
                .field("host", host)
                .field("has_session", &session.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// A downloaded attachment.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Raw file contents.
    pub data: Vec<u8>,

    /// `Content-Type` reported by the source, if any.
    pub content_type: Option<String>,
}

/// Downloads attachment bytes, attaching source credentials where they apply.
#[derive(Debug, Clone)]
pub struct AttachmentFetcher {
    client: Client,
    credentials: SourceCredentials,
}

impl AttachmentFetcher {
    /// Creates a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new(credentials: SourceCredentials, timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(DownloadError::Client)?;
        Ok(Self::with_client(client, credentials))
    }

    /// Creates a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: Client, credentials: SourceCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Returns the credentials used by this fetcher.
    #[must_use]
    pub fn credentials(&self) -> &SourceCredentials {
        &self.credentials
    }

    /// Downloads a single attachment. No retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failures and non-200 answers.
    pub async fn fetch(&self, url: &str) -> Result<DownloadedFile, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::InvalidUrl {
            url: url.to_string(),
        })?;

        let request = self.credentials.authorize(self.client.get(parsed.clone()), &parsed);
        let response = request.send().await.map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(self.status_error(url, &parsed, status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|source| DownloadError::Body {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        debug!(url, size = data.len(), "Downloaded attachment");
        Ok(DownloadedFile { data, content_type })
    }

    fn status_error(&self, url: &str, parsed: &Url, status: StatusCode) -> DownloadError {
        let denied = matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        );

        if let SourceCredentials::GitLab { session, .. } = &self.credentials {
            if denied && self.credentials.owns(parsed) {
                let hint = if session.is_some() {
                    HINT_SESSION_REJECTED
                } else {
                    HINT_NO_SESSION
                };
                warn!(url, status = status.as_u16(), "GitLab attachment is not accessible");
                return DownloadError::Inaccessible {
                    url: url.to_string(),
                    status: status.as_u16(),
                    hint,
                };
            }
        }

        DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }
}

/// Returns `host[:port]` of a URL string.
pub(crate) fn authority_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(url_authority)
}

fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}
