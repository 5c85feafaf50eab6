//! Records, outcomes and run results

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{FailureKind, UploadError};

/// A summary file found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    pub device_id: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub path: PathBuf,
}

impl SummaryRecord {
    pub fn new(device_id: impl Into<String>, date: impl Into<String>, path: PathBuf) -> Self {
        Self {
            device_id: device_id.into(),
            date: date.into(),
            path,
        }
    }
}

/// Why an upload failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&UploadError> for UploadFailure {
    fn from(err: &UploadError) -> Self {
        Self {
            kind: err.category(),
            message: err.to_string(),
        }
    }
}

/// Result of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub device_id: String,
    pub date: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<UploadFailure>,
}

impl UploadOutcome {
    pub fn success(device_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            date: date.into(),
            succeeded: true,
            failure: None,
        }
    }

    pub fn failure(
        device_id: impl Into<String>,
        date: impl Into<String>,
        failure: UploadFailure,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            date: date.into(),
            succeeded: false,
            failure: Some(failure),
        }
    }
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// Per-file outcomes, in dispatch order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<UploadOutcome>,
}

impl RunResult {
    /// Aggregate a list of outcomes
    pub fn from_outcomes(outcomes: Vec<UploadOutcome>) -> Self {
        let success = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            success,
            failed: outcomes.len() - success,
            total: outcomes.len(),
            outcomes,
        }
    }

    /// Result of a single-file run whose file was never found
    pub fn missing_target(device_id: &str, date: &str) -> Self {
        Self::from_outcomes(vec![UploadOutcome::failure(
            device_id,
            date,
            UploadFailure {
                kind: FailureKind::File,
                message: "Summary file not found".to_string(),
            },
        )])
    }

    /// Success percentage, `None` when nothing was attempted
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.success as f64 / self.total as f64 * 100.0)
        }
    }

    pub fn verdict(&self) -> RunVerdict {
        if self.success > 0 {
            RunVerdict::Succeeded
        } else if self.total == 0 {
            RunVerdict::NoFiles
        } else {
            RunVerdict::AllFailed
        }
    }
}

/// Closing status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    /// At least one upload succeeded
    Succeeded,
    /// Nothing was found to upload
    NoFiles,
    /// Every attempted upload failed
    AllFailed,
}
