//! Multipart upload client

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::UploaderConfig;
use crate::discovery::SUMMARY_FILE;
use crate::error::{Result, UploadError};
use crate::types::{SummaryRecord, UploadFailure, UploadOutcome};

/// Connection timeout, independent of the total request timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const JSON_MIME: &str = "application/json";

/// HTTP client that posts summary files to the upload endpoint.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: Client,
    upload_url: Url,
    timeout: Duration,
}

impl UploadClient {
    /// Create a client for the given endpoint with default settings
    pub fn new(upload_url: &str) -> Result<Self> {
        Self::with_config(&UploaderConfig::builder().upload_url(upload_url).build())
    }

    /// Create a client from configuration
    pub fn with_config(config: &UploaderConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(DEFAULT_CONNECT_TIMEOUT);

        if !config.verify_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let client = builder.build()?;
        let upload_url = Url::parse(&config.upload_url)?;

        debug!(
            upload_url = %upload_url,
            verify_tls = config.verify_tls,
            "Upload client created"
        );

        Ok(Self {
            client,
            upload_url,
            timeout: config.timeout,
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upload one summary file.
    ///
    /// Sends a multipart form with `file`, `device_id` and `date` parts and
    /// succeeds only on HTTP 200.
    #[instrument(skip(self, record), fields(device_id = %record.device_id, date = %record.date))]
    pub async fn upload(&self, record: &SummaryRecord) -> std::result::Result<(), UploadError> {
        let bytes = tokio::fs::read(&record.path).await?;
        let content = String::from_utf8(bytes).map_err(|e| UploadError::Content(e.to_string()))?;
        debug!("Read {} bytes from {}", content.len(), record.path.display());

        let file_part = Part::text(content)
            .file_name(SUMMARY_FILE)
            .mime_str(JSON_MIME)?;
        let form = Form::new()
            .part("file", file_part)
            .text("device_id", record.device_id.clone())
            .text("date", record.date.clone());

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(UploadError::status(status.as_u16(), body))
        }
    }

    /// Upload one summary file and report the outcome.
    ///
    /// Never fails: every error, panics included, becomes a failed outcome so
    /// sibling uploads in a batch are unaffected.
    pub async fn upload_record(&self, record: &SummaryRecord) -> UploadOutcome {
        info!(device_id = %record.device_id, date = %record.date, "Upload started");

        match contain(self.upload(record)).await {
            Ok(()) => {
                info!(device_id = %record.device_id, date = %record.date, "Upload succeeded");
                UploadOutcome::success(&record.device_id, &record.date)
            }
            Err(err) => {
                log_failure(record, &err);
                UploadOutcome::failure(&record.device_id, &record.date, UploadFailure::from(&err))
            }
        }
    }
}

/// Run an upload future, turning a panic into [`UploadError::Unexpected`]
async fn contain<F>(upload: F) -> std::result::Result<(), UploadError>
where
    F: Future<Output = std::result::Result<(), UploadError>>,
{
    AssertUnwindSafe(upload)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(UploadError::Unexpected(panic_message(&*panic))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "upload task panicked".to_string()
    }
}

fn log_failure(record: &SummaryRecord, err: &UploadError) {
    let device_id = record.device_id.as_str();
    let date = record.date.as_str();
    let kind = err.category();

    match err {
        UploadError::Status { status, body } => {
            error!(device_id, date, %kind, status, body = %body, "Upload failed: server rejected upload");
        }
        UploadError::Timeout | UploadError::Transport(_) => {
            error!(device_id, date, %kind, error = %err, "Upload failed: connection error");
        }
        UploadError::Content(_) => {
            error!(device_id, date, %kind, error = %err, "Upload failed: content error");
        }
        UploadError::Io(_) => {
            error!(
                device_id,
                date,
                %kind,
                path = %record.path.display(),
                error = %err,
                "Upload failed: summary file unreadable"
            );
        }
        UploadError::Unexpected(_) => {
            error!(device_id, date, %kind, error = %err, "Upload failed: unexpected error");
        }
    }
}
