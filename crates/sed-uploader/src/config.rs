//! Uploader configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default upload endpoint
pub const DEFAULT_UPLOAD_URL: &str = "https://api.hey-watch.me/upload/analysis/sed-summary";
/// Default total timeout per upload request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default base directory for summary files, relative to the working directory
pub const DEFAULT_BASE_DIR: &str = "data_accounts";

/// Uploader configuration
///
/// Construct with [`UploaderConfig::builder`] or deserialize from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Endpoint receiving the multipart POST
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Root of the `{device_id}/{date}/sed-summary/result.json` tree
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Total timeout per request
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Verify TLS certificates and hostnames
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BASE_DIR)
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_verify_tls() -> bool {
    true
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
            base_dir: default_base_dir(),
            timeout: default_timeout(),
            verify_tls: default_verify_tls(),
        }
    }
}

impl UploaderConfig {
    /// Start a builder from the defaults
    pub fn builder() -> UploaderConfigBuilder {
        UploaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`UploaderConfig`]
#[derive(Debug, Clone)]
pub struct UploaderConfigBuilder {
    config: UploaderConfig,
}

impl UploaderConfigBuilder {
    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.upload_url = url.into();
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Disable certificate and hostname verification.
    ///
    /// Only for self-signed or test endpoints.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.config.verify_tls = !insecure;
        self
    }

    pub fn build(self) -> UploaderConfig {
        self.config
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
