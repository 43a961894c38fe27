//! Runner configuration.

use crate::config::ServerConfig;
use crate::uploads::GITHUB_WEB_URL;
use std::time::Duration;

/// Settings shared by every migration request.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Issues migrated at once.
    concurrency: usize,
    /// Timeout for tracker API calls.
    request_timeout: Duration,
    /// Timeout for attachment uploads.
    upload_timeout: Duration,
    /// Timeout for attachment downloads.
    download_timeout: Duration,
    /// Web origin used for GitHub session uploads.
    github_web_url: String,
    /// Deadline for a whole migration request.
    migration_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RunnerConfig {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(120),
            github_web_url: GITHUB_WEB_URL.to_string(),
            migration_timeout: None,
        }
    }

    /// Sets the tracker timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the upload timeout.
    #[must_use]
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Sets the attachment download timeout.
    #[must_use]
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Sets the GitHub web origin.
    #[must_use]
    pub fn with_github_web_url(mut self, url: impl Into<String>) -> Self {
        self.github_web_url = url.into();
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_migration_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.migration_timeout = timeout;
        self
    }

    /// Returns the number of issues migrated at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the tracker timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the upload timeout.
    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Returns the attachment download timeout.
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// Returns the GitHub web origin.
    pub fn github_web_url(&self) -> &str {
        &self.github_web_url
    }

    /// Returns the per-request deadline.
    pub fn migration_timeout(&self) -> Option<Duration> {
        self.migration_timeout
    }
}

impl From<&ServerConfig> for RunnerConfig {
    fn from(config: &ServerConfig) -> Self {
        Self::new(config.concurrency)
            .with_request_timeout(config.request_timeout())
            .with_upload_timeout(config.upload_timeout())
            .with_download_timeout(config.download_timeout())
            .with_github_web_url(config.github_web_url.clone())
            .with_migration_timeout(config.migration_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concurrency_means_sequential() {
        assert_eq!(RunnerConfig::new(0).concurrency(), 1);
    }

    #[test]
    fn downloads_outlast_tracker_calls_by_default() {
        let config = RunnerConfig::default();
        assert!(config.download_timeout() > config.request_timeout());
        assert!(config.download_timeout() >= config.upload_timeout());
    }

    #[test]
    fn can_build_from_server_config() {
        let server = ServerConfig {
            concurrency: 3,
            migration_timeout_secs: Some(90),
            download_timeout_secs: 240,
            ..Default::default()
        };
        let config = RunnerConfig::from(&server);

        assert_eq!(config.concurrency(), 3);
        assert_eq!(config.upload_timeout(), Duration::from_secs(60));
        assert_eq!(config.download_timeout(), Duration::from_secs(240));
        assert_eq!(config.migration_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.github_web_url(), "https://github.com");
    }
}
