//! GlucoLink LibreLink - LibreLink Up API client
//!
//! Provides async client for:
//! - Login with regional redirect detection
//! - Listing the patient connections of a follower account
//! - Fetching the current reading and recent history of one patient
//!
//! ## Modules
//!
//! - [`client`] - LibreLink Up HTTP client
//! - [`models`] - Wire types and their conversion into domain types
//! - [`provider`] - `IUpstreamClient` port implementation

pub mod client;
pub(crate) mod models;
pub mod provider;

pub use client::LibreLinkClient;

use thiserror::Error;

/// Errors that can occur when communicating with the LibreLink Up API
#[derive(Debug, Error)]
pub enum LibreLinkError {
    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}")]
    Http {
        /// Request path
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// Body carried a non-zero status code
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Request path
        endpoint: String,
        /// Upstream status code
        status: i64,
    },

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
