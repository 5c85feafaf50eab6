//! Configuration file handling for sed-upload

use anyhow::{Context, Result};
use sed_uploader::UploaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upload endpoint URL
    pub upload_url: Option<String>,
    /// Root of the summary tree
    pub base_dir: Option<PathBuf>,
    /// Skip TLS verification
    pub insecure: Option<bool>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Values taken from the command line, all optional
#[derive(Debug, Clone, Default)]
pub struct ArgOverrides<'a> {
    pub upload_url: Option<&'a str>,
    pub base_dir: Option<&'a Path>,
    pub insecure: bool,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("sed-upload");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: &ArgOverrides<'_>) -> UploaderConfig {
        let mut builder = UploaderConfig::builder()
            .insecure(args.insecure || self.insecure.unwrap_or(false));

        if let Some(url) = args.upload_url.map(String::from).or_else(|| self.upload_url.clone()) {
            builder = builder.upload_url(url);
        }
        if let Some(dir) = args
            .base_dir
            .map(Path::to_path_buf)
            .or_else(|| self.base_dir.clone())
        {
            builder = builder.base_dir(dir);
        }
        if let Some(secs) = args.timeout_secs.or(self.timeout_secs) {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}
