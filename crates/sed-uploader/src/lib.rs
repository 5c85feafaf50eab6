//! SED Summary Uploader
//!
//! Finds per-device, per-date SED summary files on disk and uploads them to an
//! HTTP endpoint as multipart forms.
//!
//! # Example
//!
//! ```rust,no_run
//! use sed_uploader::{RunMode, Runner, UploaderConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = UploaderConfig::builder()
//!         .base_dir("/srv/data_accounts")
//!         .build();
//!     let runner = Runner::from_config(&config)?;
//!
//!     // Upload everything found under the base directory
//!     let result = runner.run(&RunMode::Batch).await;
//!     println!("{} of {} uploaded", result.success, result.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a mock endpoint and log capture:
//!
//! ```rust,ignore
//! use sed_uploader::testing::{MockEndpoint, TestServer};
//!
//! let endpoint = MockEndpoint::new().respond_with("devB", 500, "boom");
//! let server = TestServer::start(endpoint.router()).await?;
//! ```

mod client;
mod config;
pub mod discovery;
mod error;
mod runner;
pub mod testing;
mod types;

pub use client::UploadClient;
pub use config::{
    UploaderConfig, UploaderConfigBuilder, DEFAULT_BASE_DIR, DEFAULT_TIMEOUT, DEFAULT_UPLOAD_URL,
};
pub use discovery::SummaryLocator;
pub use error::{ClientError, ConfigError, FailureKind, Result, UploadError};
pub use runner::{RunMode, Runner};
pub use types::*;
