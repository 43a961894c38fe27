use std::time::Duration;

use issue_migrator::trackers::{IssueState, NewIssue};
use issue_migrator::{GitLabTracker, IssueDestination, IssueSource, TrackerError};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker(server: &MockServer) -> GitLabTracker {
    GitLabTracker::new(&server.uri(), "42", "glpat", Duration::from_secs(5)).unwrap()
}

fn issue_json(iid: u64, state: &str, description: &str) -> Value {
    json!({
        "iid": iid,
        "title": format!("Issue {iid}"),
        "description": description,
        "state": state,
        "labels": ["bug"],
        "author": { "username": "alice" },
        "created_at": "2024-01-15T10:30:00Z",
        "updated_at": "2024-01-16T08:00:00Z",
        "closed_at": if state == "closed" { json!("2024-01-17T09:00:00Z") } else { Value::Null },
        "web_url": format!("https://gitlab.test/group/app/-/issues/{iid}")
    })
}

fn note_json(author: &str, body: &str, system: bool) -> Value {
    json!({
        "body": body,
        "author": { "username": author },
        "created_at": "2024-01-15T11:00:00Z",
        "updated_at": "2024-01-15T11:00:00Z",
        "system": system
    })
}

#[tokio::test]
async fn can_fetch_issue_with_absolute_upload_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues/3"))
        .and(header("PRIVATE-TOKEN", "glpat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(issue_json(3, "closed", "See ![log](/uploads/abc/log.png)")),
        )
        .mount(&server)
        .await;

    let issue = tracker(&server).fetch_issue(3).await.unwrap();

    assert_eq!(issue.number, 3);
    assert_eq!(issue.state, IssueState::Closed);
    assert!(issue.closed_at.is_some());
    assert_eq!(issue.author, "alice");
    assert_eq!(
        issue.body,
        format!("See ![log]({}/-/project/42/uploads/abc/log.png)", server.uri())
    );
}

#[tokio::test]
async fn missing_issue_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"404 Not found\"}"))
        .mount(&server)
        .await;

    let err = tracker(&server).fetch_issue(9).await.unwrap_err();

    assert!(matches!(err, TrackerError::Status { status: 404, .. }));
}

#[tokio::test]
async fn list_issues_follows_next_page_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues"))
        .and(query_param("state", "all"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", "2")
                .set_body_json(json!([issue_json(1, "opened", ""), issue_json(2, "opened", "")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", "")
                .set_body_json(json!([issue_json(3, "closed", "")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let issues = tracker(&server).list_issues().await.unwrap();

    let numbers: Vec<u64> = issues.iter().map(|issue| issue.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn system_notes_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues/3/notes"))
        .and(query_param("sort", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            note_json("alice", "First!", false),
            note_json("bot", "added ~bug label", true),
            note_json("bob", "Second", false)
        ])))
        .mount(&server)
        .await;

    let comments = tracker(&server).list_comments(3).await.unwrap();

    let authors: Vec<&str> = comments.iter().map(|c| c.author.as_str()).collect();
    assert_eq!(authors, vec!["alice", "bob"]);
}

#[tokio::test]
async fn can_create_close_and_comment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues"))
        .and(body_json(json!({
            "title": "Crash",
            "description": "body",
            "labels": "bug,ui"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "iid": 11,
            "web_url": "https://gitlab.test/group/app/-/issues/11"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v4/projects/42/issues/11"))
        .and(body_json(json!({ "state_event": "close" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues/11/notes"))
        .and(body_json(json!({ "body": "hello" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker(&server);
    let created = tracker
        .create_issue(&NewIssue {
            title: "Crash".to_string(),
            body: "body".to_string(),
            labels: vec!["bug".to_string(), "ui".to_string()],
            closed: true,
        })
        .await
        .unwrap();
    tracker.close_issue(created.number).await.unwrap();
    tracker.create_comment(created.number, "hello").await.unwrap();

    assert_eq!(created.number, 11);
    assert_eq!(created.url, "https://gitlab.test/group/app/-/issues/11");
}

#[tokio::test]
async fn forbidden_writes_are_permission_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = tracker(&server)
        .create_issue(&NewIssue {
            title: "t".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
}
