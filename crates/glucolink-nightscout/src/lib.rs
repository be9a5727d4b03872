//! GlucoLink Nightscout - downstream entry sink
//!
//! Two interchangeable implementations of the `IEntrySink` port:
//!
//! - [`v1::NightscoutV1Client`] - API v1, `api-secret` header, batch upload,
//!   an empty store is reported as `None`
//! - [`v3::NightscoutV3Client`] - API v3, per-call JWT, one request per
//!   entry, an empty store is an error
//!
//! The variant is chosen once from configuration by [`build_sink`].

pub mod models;
pub mod v1;
pub mod v3;

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::info;

use glucolink_core::config::NightscoutConfig;
use glucolink_core::ports::IEntrySink;

/// User agent sent to Nightscout
pub const NIGHTSCOUT_USER_AGENT: &str = "FreeStyle LibreLink Up NightScout Uploader";

/// Errors that can occur when talking to a Nightscout site
#[derive(Debug, Error)]
pub enum NightscoutError {
    /// Unexpected HTTP status
    #[error("{endpoint} returned HTTP {status}, expected {expected}")]
    Http {
        /// Request path
        endpoint: String,
        /// Received status code
        status: u16,
        /// Required status code
        expected: u16,
    },

    /// The authorization endpoint returned no token
    #[error("No JWT token in authorization response")]
    MissingToken,

    /// The v3 entries query returned no result
    #[error("Last entry not found in response data")]
    EmptyStore,

    /// Upload called without entries
    #[error("No entries to upload")]
    EmptyBatch,

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Builds the sink variant selected by `config.api_v3`
pub fn build_sink(config: &NightscoutConfig) -> Result<Arc<dyn IEntrySink + Send + Sync>> {
    let sink: Arc<dyn IEntrySink + Send + Sync> = if config.api_v3 {
        Arc::new(v3::NightscoutV3Client::from_config(config)?)
    } else {
        Arc::new(v1::NightscoutV1Client::from_config(config)?)
    };
    info!(api = sink.name(), url = %config.base_url(), "Nightscout sink configured");
    Ok(sink)
}

/// Shared `reqwest` client setup
pub(crate) fn http_client() -> Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .user_agent(NIGHTSCOUT_USER_AGENT)
        .build()
        .context("Failed to build Nightscout HTTP client")
}
