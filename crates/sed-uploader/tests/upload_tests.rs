//! Integration tests for sed-uploader
//!
//! Each test builds a summary tree in a temp directory, serves a mock upload
//! endpoint on an ephemeral port and runs the uploader against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use sed_uploader::testing::{CapturedLogs, MockEndpoint, TestServer};
use sed_uploader::{FailureKind, RunMode, Runner, UploaderConfig};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn write_summary(root: &Path, device: &str, date: &str, content: &[u8]) -> PathBuf {
    let dir = root.join(device).join(date).join("sed-summary");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("result.json");
    fs::write(&path, content).unwrap();
    path
}

fn summary_json(device: &str, date: &str) -> String {
    format!(
        r#"{{"device_id":"{}","date":"{}","summary":{{"speech":12,"music":3}}}}"#,
        device, date
    )
}

/// Three valid summaries for devA, devB and devC plus one malformed date dir
fn populate(root: &Path) {
    for device in ["devA", "devB", "devC"] {
        write_summary(
            root,
            device,
            "2024-01-01",
            summary_json(device, "2024-01-01").as_bytes(),
        );
    }
    write_summary(root, "devA", "not-a-date", b"{}");
}

fn runner(server: &TestServer, base_dir: &Path, timeout: Duration) -> Runner {
    let config = UploaderConfig::builder()
        .upload_url(server.upload_url())
        .base_dir(base_dir)
        .timeout(timeout)
        .build();
    Runner::from_config(&config).unwrap()
}

fn received_devices(endpoint: &MockEndpoint) -> Vec<String> {
    let mut devices: Vec<String> = endpoint
        .received()
        .into_iter()
        .map(|u| u.device_id)
        .collect();
    devices.sort();
    devices
}

// =============================================================================
// Batch runs
// =============================================================================

#[tokio::test]
async fn test_batch_uploads_all_files() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (3, 0, 3));
    assert_eq!(received_devices(&endpoint), vec!["devA", "devB", "devC"]);
}

#[tokio::test]
async fn test_multipart_fields() {
    let tmp = TempDir::new().unwrap();
    let content = summary_json("devA", "2024-01-01");
    write_summary(tmp.path(), "devA", "2024-01-01", content.as_bytes());
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;
    assert_eq!(result.success, 1);

    let received = endpoint.received();
    assert_eq!(received.len(), 1);
    let upload = &received[0];
    assert_eq!(upload.device_id, "devA");
    assert_eq!(upload.date, "2024-01-01");
    assert_eq!(upload.file_name.as_deref(), Some("result.json"));
    assert_eq!(upload.content_type.as_deref(), Some("application/json"));
    assert_eq!(upload.content, content);
}

#[tokio::test]
async fn test_batch_counts_server_errors() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new().respond_with("devB", 500, "database unavailable");
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (2, 1, 3));
    let failed: Vec<_> = result.outcomes.iter().filter(|o| !o.succeeded).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].device_id, "devB");
    let failure = failed[0].failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Protocol);
    assert!(failure.message.contains("500"));
    assert!(failure.message.contains("database unavailable"));
}

#[tokio::test]
async fn test_batch_with_one_timeout() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new().delay("devC", Duration::from_secs(5));
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_millis(500))
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (2, 1, 3));
    let timed_out = result
        .outcomes
        .iter()
        .find(|o| o.device_id == "devC")
        .unwrap();
    assert!(!timed_out.succeeded);
    assert_eq!(
        timed_out.failure.as_ref().unwrap().kind,
        FailureKind::Transport
    );
}

#[tokio::test]
async fn test_outcomes_follow_discovery_order() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new().delay("devA", Duration::from_millis(200));
    let server = TestServer::start(endpoint.router()).await.unwrap();
    let runner = runner(&server, tmp.path(), Duration::from_secs(5));

    let discovered: Vec<String> = runner
        .locator()
        .find_all()
        .into_iter()
        .map(|r| r.device_id)
        .collect();
    let result = runner.run(&RunMode::Batch).await;
    let reported: Vec<String> = result.outcomes.into_iter().map(|o| o.device_id).collect();

    assert_eq!(reported, discovered);
}

#[tokio::test]
async fn test_batch_without_files() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("devA/not-a-date/sed-summary")).unwrap();
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (0, 0, 0));
    assert!(endpoint.received().is_empty());
}

#[tokio::test]
async fn test_batch_missing_base_dir() {
    let tmp = TempDir::new().unwrap();
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, &tmp.path().join("missing"), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert_eq!(result.total, 0);
    assert!(endpoint.received().is_empty());
}

// =============================================================================
// Single-file runs
// =============================================================================

#[tokio::test]
async fn test_single_upload() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let mode = RunMode::from_args(Some("devB".into()), Some("2024-01-01".into())).unwrap();
    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&mode)
        .await;

    assert_eq!((result.success, result.failed, result.total), (1, 0, 1));
    assert_eq!(received_devices(&endpoint), vec!["devB"]);
}

#[tokio::test]
async fn test_single_missing_file() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let mode = RunMode::from_args(Some("devA".into()), Some("2024-02-01".into())).unwrap();
    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&mode)
        .await;

    assert_eq!((result.success, result.failed, result.total), (0, 1, 1));
    assert!(endpoint.received().is_empty());
}

#[tokio::test]
async fn test_non_200_success_status_is_failure() {
    let tmp = TempDir::new().unwrap();
    write_summary(tmp.path(), "devA", "2024-01-01", b"{}");
    let endpoint = MockEndpoint::new().respond_with("devA", 201, "created");
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .upload_specific("devA", "2024-01-01")
        .await;

    assert_eq!((result.success, result.failed, result.total), (0, 1, 1));
    assert_eq!(endpoint.received().len(), 1);
}

// =============================================================================
// Failure containment
// =============================================================================

#[tokio::test]
async fn test_undecodable_content_is_not_sent() {
    let tmp = TempDir::new().unwrap();
    write_summary(tmp.path(), "devA", "2024-01-01", &[0xff, 0xfe, 0x00, 0x80]);
    write_summary(tmp.path(), "devB", "2024-01-01", b"{}");
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (1, 1, 2));
    let bad = result
        .outcomes
        .iter()
        .find(|o| o.device_id == "devA")
        .unwrap();
    assert_eq!(bad.failure.as_ref().unwrap().kind, FailureKind::Content);
    assert_eq!(received_devices(&endpoint), vec!["devB"]);
}

#[tokio::test]
async fn test_connection_refused() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path());

    // Reserve a port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = UploaderConfig::builder()
        .upload_url(format!("http://{}/upload", addr))
        .base_dir(tmp.path())
        .timeout(Duration::from_secs(5))
        .build();
    let result = Runner::from_config(&config)
        .unwrap()
        .run(&RunMode::Batch)
        .await;

    assert_eq!((result.success, result.failed, result.total), (0, 3, 3));
    for outcome in &result.outcomes {
        assert_eq!(
            outcome.failure.as_ref().unwrap().kind,
            FailureKind::Transport
        );
    }
}

// =============================================================================
// Logging
// =============================================================================

#[tokio::test]
async fn test_logs_each_attempt() {
    let logs = CapturedLogs::new();
    let _guard = tracing::subscriber::set_default(logs.subscriber());

    let tmp = TempDir::new().unwrap();
    write_summary(tmp.path(), "devA", "2024-01-01", b"{}");
    write_summary(tmp.path(), "devB", "2024-01-01", b"{}");
    let endpoint = MockEndpoint::new().respond_with("devB", 503, "maintenance");
    let server = TestServer::start(endpoint.router()).await.unwrap();

    let result = runner(&server, tmp.path(), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;
    assert_eq!((result.success, result.failed), (1, 1));

    let output = logs.contents();
    assert_eq!(output.matches("Upload started").count(), 2);
    assert_eq!(output.matches("Upload succeeded").count(), 1);
    assert!(output.contains("Upload failed: server rejected upload"));
    assert!(output.contains("status=503"));
    assert!(output.contains("maintenance"));
    assert!(output.contains("Found 2 summary file(s)"));
}

#[tokio::test]
async fn test_logs_missing_base_dir_warning() {
    let logs = CapturedLogs::new();
    let _guard = tracing::subscriber::set_default(logs.subscriber());

    let tmp = TempDir::new().unwrap();
    let endpoint = MockEndpoint::new();
    let server = TestServer::start(endpoint.router()).await.unwrap();

    runner(&server, &tmp.path().join("missing"), Duration::from_secs(5))
        .run(&RunMode::Batch)
        .await;

    assert!(logs.contains("WARN"));
    assert!(logs.contains("Base directory does not exist"));
    assert!(logs.contains("No summary files to upload"));
}
