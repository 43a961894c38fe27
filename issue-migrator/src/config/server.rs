//! Server configuration file.

use super::ConfigError;
use crate::uploads::GITHUB_WEB_URL;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Parsed contents of the optional server configuration file.
///
/// ```toml
/// bind = "0.0.0.0:8080"
/// cors-origins = ["http://localhost:3000"]
/// concurrency = 1
/// request-timeout-secs = 30
/// upload-timeout-secs = 60
/// download-timeout-secs = 120
/// github-web-url = "https://github.com"
/// migration-timeout-secs = 3600
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Issues migrated at once per request.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout for tracker API calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for attachment uploads.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Timeout for attachment downloads.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Web origin used for GitHub session uploads.
    #[serde(default = "default_github_web_url")]
    pub github_web_url: String,

    /// Deadline for a whole migration request.
    #[serde(default)]
    pub migration_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            github_web_url: default_github_web_url(),
            migration_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading server configuration");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;

        config.validate(path)?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::ValidationError {
            path: path.display().to_string(),
            message: message.to_string(),
        };

        if self.bind.parse::<SocketAddr>().is_err() {
            return Err(invalid("bind must be an address like '0.0.0.0:8080'"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1"));
        }
        if self.request_timeout_secs == 0
            || self.upload_timeout_secs == 0
            || self.download_timeout_secs == 0
        {
            return Err(invalid("timeouts must be at least 1 second"));
        }
        if self.migration_timeout_secs == Some(0) {
            return Err(invalid("migration-timeout-secs must be at least 1 second"));
        }
        if url::Url::parse(&self.github_web_url).is_err() {
            return Err(invalid("github-web-url must be an absolute URL"));
        }
        Ok(())
    }

    /// Replaces the port of the bind address.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        let ip = self
            .bind
            .parse::<SocketAddr>()
            .map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        self.bind = SocketAddr::new(ip, port).to_string();
        self
    }

    /// Timeout for tracker API calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timeout for attachment uploads.
    #[must_use]
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Timeout for attachment downloads.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Deadline for a whole migration request.
    #[must_use]
    pub fn migration_timeout(&self) -> Option<Duration> {
        self.migration_timeout_secs.map(Duration::from_secs)
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_concurrency() -> usize {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    60
}

fn default_download_timeout_secs() -> u64 {
    120
}

fn default_github_web_url() -> String {
    GITHUB_WEB_URL.to_string()
}
