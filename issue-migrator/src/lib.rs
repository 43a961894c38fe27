#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod attachments;
pub mod config;
pub mod rate_limit;
pub mod runner;
pub mod server;
pub mod summary;
pub mod templates;
pub mod trackers;
pub mod uploads;

pub use attachments::{
    migrate_attachments, rewrite_body, scan_attachments, sniff_extension, AttachmentFetcher,
    AttachmentReference, DownloadError, LinkStyle, MigratedBody, SourceCredentials, UploadedAsset,
};
pub use config::{ConfigError, Direction, MigrationRequest, PlatformConfig, ServerConfig};
pub use rate_limit::{
    check_core_rate_limit, ensure_core_rate_limit, wait_if_needed, RateLimitInfo,
};
pub use runner::{
    list_issues, run_migration, MigrationContext, Migrator, RunnerConfig, RunnerError,
};
pub use server::{router, serve, ApiError, AppState, ServerError};
pub use summary::{MigrationResult, MigrationStatus};
pub use templates::{create_handlebars_registry, TemplateError, TemplateRenderer};
pub use trackers::{
    GitHubTracker, GitLabTracker, IssueDestination, IssueSource, Platform, TrackerError,
    TrackerIssue,
};
pub use uploads::{AttachmentUploader, GitHubSessionUploader, GitLabUploader, UploadError};

/// User agent sent on API and download requests.
pub(crate) const USER_AGENT: &str = concat!("issue-migrator/", env!("CARGO_PKG_VERSION"));
