//! Test utilities for sed-uploader
//!
//! Provides a mock upload endpoint served on an ephemeral port and a log
//! capture subscriber.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;

/// Path served by [`MockEndpoint::router`]
pub const UPLOAD_PATH: &str = "/upload/analysis/sed-summary";

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum Router on 127.0.0.1 with an OS-assigned port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use sed_uploader::testing::{MockEndpoint, TestServer};
    ///
    /// let endpoint = MockEndpoint::new();
    /// let server = TestServer::start(endpoint.router()).await?;
    /// let client = UploadClient::new(&server.upload_url())?;
    /// ```
    pub async fn start(router: Router) -> io::Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the mock upload endpoint
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url(), UPLOAD_PATH)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One multipart upload as seen by the mock endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub device_id: String,
    pub date: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: String,
}

#[derive(Default)]
struct MockState {
    received: Mutex<Vec<ReceivedUpload>>,
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
}

/// Mock upload endpoint.
///
/// Answers 200 unless a response was scripted for the uploaded device id.
#[derive(Clone, Default)]
pub struct MockEndpoint {
    state: Arc<MockState>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer uploads for `device_id` with the given status and body
    pub fn respond_with(self, device_id: &str, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state
            .responses
            .lock()
            .insert(device_id.to_string(), (status, body.to_string()));
        self
    }

    /// Hold the response for uploads of `device_id`
    pub fn delay(self, device_id: &str, delay: Duration) -> Self {
        self.state.delays.lock().insert(device_id.to_string(), delay);
        self
    }

    /// Uploads received so far, in arrival order
    pub fn received(&self) -> Vec<ReceivedUpload> {
        self.state.received.lock().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(UPLOAD_PATH, post(handle_upload))
            .with_state(self.clone())
    }
}

async fn handle_upload(
    State(endpoint): State<MockEndpoint>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut upload = ReceivedUpload::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let text = field.text().await.unwrap_or_default();

        match name.as_str() {
            "file" => {
                upload.file_name = file_name;
                upload.content_type = content_type;
                upload.content = text;
            }
            "device_id" => upload.device_id = text,
            "date" => upload.date = text,
            _ => {}
        }
    }

    let delay = endpoint.state.delays.lock().get(&upload.device_id).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let response = endpoint
        .state
        .responses
        .lock()
        .get(&upload.device_id)
        .cloned()
        .unwrap_or_else(|| (StatusCode::OK, "uploaded".to_string()));

    endpoint.state.received.lock().push(upload);
    response
}

/// Collects formatted log output for assertions.
///
/// Install with `tracing::subscriber::set_default(logs.subscriber())` on the
/// thread running the code under test.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber writing every event at debug level and above into this buffer
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buf: Arc::clone(&self.buf),
        }
    }
}

/// Writer handed out by [`CapturedLogs`]
pub struct CapturedWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
