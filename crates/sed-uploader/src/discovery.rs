//! Summary file discovery
//!
//! Expected layout under the base directory:
//!
//! ```text
//! {base_dir}/{device_id}/{YYYY-MM-DD}/sed-summary/result.json
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::types::SummaryRecord;

/// Directory holding the summary below each date directory
pub const SUMMARY_DIR: &str = "sed-summary";
/// Summary file name, also used as the multipart filename
pub const SUMMARY_FILE: &str = "result.json";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Check whether a string is a valid `YYYY-MM-DD` calendar date
pub fn is_valid_date(date: &str) -> bool {
    parse_date(date).is_some()
}

/// Locates summary files below a base directory
#[derive(Debug, Clone)]
pub struct SummaryLocator {
    base_dir: PathBuf,
}

impl SummaryLocator {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Expected summary path for a device and date
    pub fn summary_path(&self, device_id: &str, date: &str) -> PathBuf {
        self.base_dir
            .join(device_id)
            .join(date)
            .join(SUMMARY_DIR)
            .join(SUMMARY_FILE)
    }

    /// Find every summary file under the base directory.
    ///
    /// Date directories whose name is not a valid date are skipped. A missing
    /// base directory yields an empty list.
    pub fn find_all(&self) -> Vec<SummaryRecord> {
        if !self.base_dir.exists() {
            warn!(base_dir = %self.base_dir.display(), "Base directory does not exist");
            return Vec::new();
        }

        let mut records = Vec::new();

        // Depth 1 is the device directory, depth 2 the date directory
        let date_dirs = WalkDir::new(&self.base_dir)
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir());

        for entry in date_dirs {
            let Some(date) = entry.file_name().to_str() else {
                continue;
            };
            if !is_valid_date(date) {
                continue;
            }
            let Some(device_id) = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .and_then(|name| name.to_str())
            else {
                continue;
            };

            let path = entry.path().join(SUMMARY_DIR).join(SUMMARY_FILE);
            if path.exists() {
                debug!(device_id, date, path = %path.display(), "Found summary file");
                records.push(SummaryRecord::new(device_id, date, path));
            }
        }

        info!("Found {} summary file(s)", records.len());
        records
    }

    /// Look up the summary file for one device and date
    pub fn find_one(&self, device_id: &str, date: &str) -> Option<PathBuf> {
        let path = self.summary_path(device_id, date);
        if path.exists() {
            Some(path)
        } else {
            warn!(path = %path.display(), "Summary file does not exist");
            None
        }
    }
}
