use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use issue_migrator::trackers::{CreatedIssue, IssueState, NewIssue, TrackerComment};
use issue_migrator::{
    AttachmentFetcher, AttachmentUploader, IssueDestination, IssueSource, MigrationContext,
    Migrator, Platform, RunnerConfig, SourceCredentials, TrackerError, TrackerIssue, UploadError,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

fn issue(number: u64, body: &str, state: IssueState) -> TrackerIssue {
    TrackerIssue {
        number,
        title: format!("Issue {number}"),
        body: body.to_string(),
        state,
        labels: vec!["bug".to_string()],
        author: "alice".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap(),
        closed_at: (state == IssueState::Closed)
            .then(|| Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()),
        url: format!("https://github.com/octo/hello/issues/{number}"),
    }
}

#[derive(Default)]
struct FakeSource {
    issues: HashMap<u64, TrackerIssue>,
    comments: HashMap<u64, Vec<TrackerComment>>,
    fetch_delay: Option<Duration>,
}

impl FakeSource {
    fn with_issue(mut self, issue: TrackerIssue) -> Self {
        self.issues.insert(issue.number, issue);
        self
    }

    fn with_comment(mut self, number: u64, author: &str, body: &str) -> Self {
        self.comments.entry(number).or_default().push(TrackerComment {
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 11, 0, 0).unwrap(),
            updated_at: None,
        });
        self
    }

    fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }
}

#[async_trait]
impl IssueSource for FakeSource {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn fetch_issue(&self, number: u64) -> Result<TrackerIssue, TrackerError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.issues
            .get(&number)
            .cloned()
            .ok_or_else(|| TrackerError::Status {
                endpoint: format!("/issues/{number}"),
                status: 404,
                body: "Not Found".to_string(),
            })
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<TrackerComment>, TrackerError> {
        Ok(self.comments.get(&number).cloned().unwrap_or_default())
    }

    async fn list_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError> {
        Ok(self.issues.values().cloned().collect())
    }
}

#[derive(Default)]
struct DestinationLog {
    created: Vec<NewIssue>,
    closed: Vec<u64>,
    comments: Vec<(u64, String)>,
}

#[derive(Clone, Default)]
struct FakeDestination {
    log: Arc<Mutex<DestinationLog>>,
    reject_title: Option<String>,
    reject_comments: bool,
}

fn rejected(endpoint: &str) -> TrackerError {
    TrackerError::Status {
        endpoint: endpoint.to_string(),
        status: 403,
        body: "Forbidden".to_string(),
    }
}

#[async_trait]
impl IssueDestination for FakeDestination {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        if self.reject_title.as_deref() == Some(issue.title.as_str()) {
            return Err(rejected("/issues"));
        }
        let mut log = self.log.lock().unwrap();
        log.created.push(issue.clone());
        let number = 100 + log.created.len() as u64;
        Ok(CreatedIssue {
            number,
            url: format!("https://gitlab.test/group/app/-/issues/{number}"),
        })
    }

    async fn close_issue(&self, number: u64) -> Result<(), TrackerError> {
        self.log.lock().unwrap().closed.push(number);
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        if self.reject_comments {
            return Err(rejected("/notes"));
        }
        self.log.lock().unwrap().comments.push((number, body.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeUploader {
    uploads: Arc<Mutex<Vec<String>>>,
    fail: bool,
    unavailable: bool,
}

#[async_trait]
impl AttachmentUploader for FakeUploader {
    async fn upload(&self, _data: &[u8], filename: &str) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Status {
                status: 500,
                body: "storage unavailable".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(filename.to_string());
        Ok(format!("https://dest.test/assets/{filename}"))
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }
}

fn migrator(
    source: FakeSource,
    destination: &FakeDestination,
    uploader: &FakeUploader,
    config: &RunnerConfig,
) -> Migrator {
    let fetcher =
        AttachmentFetcher::new(SourceCredentials::Anonymous, Duration::from_secs(5)).unwrap();
    let context = MigrationContext::new(
        Box::new(source),
        Box::new(destination.clone()),
        Box::new(uploader.clone()),
        fetcher,
    );
    Migrator::new(context, config).unwrap()
}

async fn image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/shot.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn failures_stay_inside_their_issue() {
    let source = FakeSource::default().with_issue(issue(1, "Body", IssueState::Open));
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[1, 2], &CancellationToken::new()).await;

    assert_eq!(result.success.len(), 1);
    assert_eq!(result.success[0].original_id, 1);
    assert_eq!(result.success[0].new_id, Some(101));
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].original_id, 2);
    assert!(result.failed[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("Failed to fetch issue:"));
}

#[tokio::test]
async fn created_issue_carries_header_and_migrated_attachments() {
    let server = image_server().await;
    let body = format!(
        "Broken layout\n\n<img width=\"300\" alt=\"Shot\" src=\"{}/files/shot.png\" />",
        server.uri()
    );
    let source = FakeSource::default().with_issue(issue(5, &body, IssueState::Open));
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[5], &CancellationToken::new()).await;
    assert!(result.all_success());

    let log = destination.log.lock().unwrap();
    let created = &log.created[0];
    assert_eq!(created.title, "Issue 5");
    assert_eq!(created.labels, vec!["bug"]);
    assert!(created.body.starts_with("### 🔄 Migrated from GitHub\n\n"));
    assert!(created
        .body
        .contains("**Original Issue:** https://github.com/octo/hello/issues/5"));
    assert!(created
        .body
        .ends_with("Broken layout\n\n![Shot](https://dest.test/assets/shot.png)"));
    assert_eq!(*uploader.uploads.lock().unwrap(), vec!["shot.png"]);
    assert!(log.closed.is_empty());
}

#[tokio::test]
async fn failed_uploads_leave_links_untouched() {
    let server = image_server().await;
    let body = format!("![shot]({}/files/shot.png)", server.uri());
    let source = FakeSource::default().with_issue(issue(5, &body, IssueState::Open));
    let destination = FakeDestination::default();
    let uploader = FakeUploader {
        fail: true,
        ..Default::default()
    };
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[5], &CancellationToken::new()).await;

    assert!(result.all_success());
    let log = destination.log.lock().unwrap();
    assert!(log.created[0].body.ends_with(&body));
}

#[tokio::test]
async fn closed_issues_are_closed_after_creation() {
    let source = FakeSource::default().with_issue(issue(3, "Done", IssueState::Closed));
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    migrator.migrate(&[3], &CancellationToken::new()).await;

    let log = destination.log.lock().unwrap();
    assert_eq!(log.closed, vec![101]);
    assert!(log.created[0].body.contains("**Closed:** 2024-01-17 09:00:00 UTC"));
    assert!(log.created[0].body.contains("**State:** closed"));
}

#[tokio::test]
async fn comments_are_posted_in_order_with_attribution() {
    let source = FakeSource::default()
        .with_issue(issue(4, "Body", IssueState::Open))
        .with_comment(4, "bob", "First")
        .with_comment(4, "carol", "Second");
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    migrator.migrate(&[4], &CancellationToken::new()).await;

    let log = destination.log.lock().unwrap();
    assert_eq!(log.comments.len(), 2);
    assert_eq!(log.comments[0].0, 101);
    assert_eq!(
        log.comments[0].1,
        "**@bob** commented on 2024-01-15 11:00:00 UTC\n\nFirst"
    );
    assert!(log.comments[1].1.starts_with("**@carol** commented on"));
}

#[tokio::test]
async fn cancelled_migration_records_every_issue_as_failed() {
    let source = FakeSource::default()
        .with_issue(issue(1, "Body", IssueState::Open))
        .with_issue(issue(2, "Body", IssueState::Open));
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = migrator.migrate(&[1, 2], &cancel).await;

    assert!(result.success.is_empty());
    let failed: Vec<u64> = result.failed.iter().map(|s| s.original_id).collect();
    assert_eq!(failed, vec![1, 2]);
    assert!(result.failed[0].error.as_deref().unwrap().contains("cancelled"));
    assert!(destination.log.lock().unwrap().created.is_empty());
}

#[tokio::test]
async fn concurrent_migration_keeps_request_order() {
    let mut source = FakeSource::default();
    for number in 1..=6 {
        source = source.with_issue(issue(number, "Body", IssueState::Open));
    }
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let config = RunnerConfig::new(3);
    let migrator = migrator(source, &destination, &uploader, &config);

    let result = migrator.migrate(&[6, 5, 4, 3, 2, 1], &CancellationToken::new()).await;

    let order: Vec<u64> = result.success.iter().map(|s| s.original_id).collect();
    assert_eq!(order, vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(destination.log.lock().unwrap().created.len(), 6);
}

#[tokio::test]
async fn unavailable_uploader_skips_attachment_downloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/shot.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
        .expect(0)
        .mount(&server)
        .await;
    let body = format!("![shot]({}/files/shot.png)", server.uri());
    let source = FakeSource::default().with_issue(issue(5, &body, IssueState::Open));
    let destination = FakeDestination::default();
    let uploader = FakeUploader {
        unavailable: true,
        ..Default::default()
    };
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[5], &CancellationToken::new()).await;

    assert!(result.all_success());
    assert!(destination.log.lock().unwrap().created[0].body.ends_with(&body));
    assert!(uploader.uploads.lock().unwrap().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn failed_comment_post_keeps_issue_migrated() {
    let source = FakeSource::default()
        .with_issue(issue(4, "Body", IssueState::Open))
        .with_comment(4, "bob", "First");
    let destination = FakeDestination {
        reject_comments: true,
        ..Default::default()
    };
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[4], &CancellationToken::new()).await;

    assert!(result.all_success());
    assert_eq!(result.success[0].new_id, Some(101));
    let log = destination.log.lock().unwrap();
    assert_eq!(log.created.len(), 1);
    assert!(log.comments.is_empty());
}

#[tokio::test]
async fn failed_issue_creation_is_reported_and_processing_continues() {
    let source = FakeSource::default()
        .with_issue(issue(1, "Body", IssueState::Open))
        .with_issue(issue(2, "Body", IssueState::Open))
        .with_issue(issue(3, "Body", IssueState::Open));
    let destination = FakeDestination {
        reject_title: Some("Issue 2".to_string()),
        ..Default::default()
    };
    let uploader = FakeUploader::default();
    let migrator = migrator(source, &destination, &uploader, &RunnerConfig::default());

    let result = migrator.migrate(&[1, 2, 3], &CancellationToken::new()).await;

    let migrated: Vec<u64> = result.success.iter().map(|s| s.original_id).collect();
    assert_eq!(migrated, vec![1, 3]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].original_id, 2);
    assert!(result.failed[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("Failed to create issue"));
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_stops_starting_new_issues() {
    let source = FakeSource::default()
        .with_issue(issue(1, "Body", IssueState::Open))
        .with_issue(issue(2, "Body", IssueState::Open))
        .with_issue(issue(3, "Body", IssueState::Open))
        .with_fetch_delay(Duration::from_secs(3));
    let destination = FakeDestination::default();
    let uploader = FakeUploader::default();
    let config = RunnerConfig::new(1).with_migration_timeout(Some(Duration::from_secs(5)));
    let migrator = migrator(source, &destination, &uploader, &config);

    let result = migrator.migrate(&[1, 2, 3], &CancellationToken::new()).await;

    // Issue 2 started before the deadline and is allowed to finish.
    let migrated: Vec<u64> = result.success.iter().map(|s| s.original_id).collect();
    assert_eq!(migrated, vec![1, 2]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].original_id, 3);
    assert!(result.failed[0].error.as_deref().unwrap().contains("cancelled"));
    assert_eq!(destination.log.lock().unwrap().created.len(), 2);
}
