//! Run orchestration: single-file or batch uploads

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::client::UploadClient;
use crate::config::UploaderConfig;
use crate::discovery::{is_valid_date, SummaryLocator};
use crate::error::{ConfigError, Result};
use crate::types::{RunResult, SummaryRecord};

/// What a run should upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Every summary file under the base directory
    Batch,
    /// The summary file of one device on one date
    Single { device_id: String, date: String },
}

impl RunMode {
    /// Select the mode from optional command-line targets.
    ///
    /// Device id and date must be given together; the date must be a valid
    /// `YYYY-MM-DD` calendar date.
    pub fn from_args(
        device_id: Option<String>,
        date: Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        match (device_id, date) {
            (Some(device_id), Some(date)) => {
                if !is_valid_date(&date) {
                    return Err(ConfigError::InvalidDate(date));
                }
                Ok(Self::Single { device_id, date })
            }
            (None, None) => Ok(Self::Batch),
            _ => Err(ConfigError::PartialTarget),
        }
    }
}

/// Discovers summary files and uploads them over one shared client
#[derive(Debug, Clone)]
pub struct Runner {
    locator: SummaryLocator,
    client: UploadClient,
}

impl Runner {
    pub fn new(locator: SummaryLocator, client: UploadClient) -> Self {
        Self { locator, client }
    }

    /// Build a runner from configuration
    pub fn from_config(config: &UploaderConfig) -> Result<Self> {
        let client = UploadClient::with_config(config)?;
        Ok(Self::new(SummaryLocator::new(&config.base_dir), client))
    }

    pub fn locator(&self) -> &SummaryLocator {
        &self.locator
    }

    pub fn client(&self) -> &UploadClient {
        &self.client
    }

    /// Execute a run in the given mode
    pub async fn run(&self, mode: &RunMode) -> RunResult {
        info!("SED summary upload started");

        match mode {
            RunMode::Single { device_id, date } => {
                info!(device_id = %device_id, date = %date, "Uploading single summary");
                self.upload_specific(device_id, date).await
            }
            RunMode::Batch => {
                info!("Uploading all summaries");
                self.upload_all().await
            }
        }
    }

    /// Upload every discovered summary file concurrently.
    ///
    /// Discovery finishes before the first request is sent. Outcomes keep
    /// discovery order.
    pub async fn upload_all(&self) -> RunResult {
        let records = self.locator.find_all();

        if records.is_empty() {
            warn!("No summary files to upload");
            return RunResult::default();
        }

        self.upload_records(&records).await
    }

    /// Upload a list of records concurrently over the shared client
    pub async fn upload_records(&self, records: &[SummaryRecord]) -> RunResult {
        let uploads = records
            .iter()
            .map(|record| self.client.upload_record(record));
        let outcomes = join_all(uploads).await;

        let result = RunResult::from_outcomes(outcomes);
        info!(
            success = result.success,
            failed = result.failed,
            total = result.total,
            "Batch upload finished"
        );
        result
    }

    /// Upload the summary file of one device and date
    pub async fn upload_specific(&self, device_id: &str, date: &str) -> RunResult {
        let Some(path) = self.locator.find_one(device_id, date) else {
            error!(device_id, date, "Summary file not found");
            return RunResult::missing_target(device_id, date);
        };

        let record = SummaryRecord::new(device_id, date, path);
        let outcome = self.client.upload_record(&record).await;
        RunResult::from_outcomes(vec![outcome])
    }
}
