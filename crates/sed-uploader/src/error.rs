//! Error types for discovery, upload and run configuration

use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while building an [`UploadClient`](crate::UploadClient)
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid upload URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors from a single upload attempt.
///
/// Every variant is contained by [`UploadClient::upload_record`](crate::UploadClient::upload_record)
/// and turned into a failed [`UploadOutcome`](crate::UploadOutcome).
#[derive(Error, Debug)]
pub enum UploadError {
    /// Summary file missing or unreadable
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// File content could not be decoded as UTF-8 text
    #[error("Content error: {0}")]
    Content(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection, DNS or TLS failure
    #[error("Connection failed: {0}")]
    Transport(String),

    /// Server answered with something other than 200
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Anything else, including a panic inside the upload task
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl UploadError {
    /// Create a status error from code and response body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Short category name used in log lines and reports
    pub fn category(&self) -> FailureKind {
        match self {
            Self::Io(_) => FailureKind::File,
            Self::Content(_) => FailureKind::Content,
            Self::Timeout | Self::Transport(_) => FailureKind::Transport,
            Self::Status { .. } => FailureKind::Protocol,
            Self::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Transport(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Content(err.to_string())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

/// Failure categories reported for a failed upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Summary file missing or unreadable
    File,
    /// Content could not be decoded
    Content,
    /// Network, TLS or timeout failure
    Transport,
    /// Non-200 HTTP response
    Protocol,
    /// Anything else
    Unexpected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Content => "content",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// Invalid run arguments, reported before any I/O happens
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Only one of device id and date was supplied
    #[error("--device-id and --date must be given together")]
    PartialTarget,

    /// Date is not in YYYY-MM-DD format
    #[error("date must be in YYYY-MM-DD format, got '{0}'")]
    InvalidDate(String),
}
