//! Domain error types
//!
//! This module defines error types specific to domain operations
//! (parsing and validation failures) and the per-tick relay error
//! taxonomy used by the use cases and the sync engine.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Upstream timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Unknown regional endpoint code
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Invalid patient identifier
    #[error("Invalid patient ID: {0}")]
    InvalidPatientId(String),
}

/// Failure of a single relay tick
///
/// Each variant decides whether the held upstream session survives the
/// failure; see [`RelayError::invalidates_session`].
#[derive(Debug, Error)]
pub enum RelayError {
    /// Login transport failure, non-zero status body or missing ticket
    #[error("LibreLink Up login failed: {0}")]
    Credential(String),

    /// The account is homed in another regional endpoint
    #[error("LibreLink Up account belongs to region '{region}', switch to '{region}'")]
    RegionMismatch {
        /// Correct region code, upper case
        region: String,
    },

    /// No usable patient connection
    #[error("Connection resolution failed: {0}")]
    ConnectionResolution(#[from] crate::usecases::resolve_connection::ResolutionError),

    /// Upstream transport failure while listing connections or fetching readings
    #[error("Upstream request failed: {0:#}")]
    Transport(anyhow::Error),

    /// Downstream sink failure (query, token or upload)
    #[error("Sink request failed: {0:#}")]
    Sink(anyhow::Error),

    /// Upstream payload could not be converted into entries
    #[error("Invalid upstream data: {0}")]
    InvalidData(#[from] DomainError),
}

impl RelayError {
    /// Whether the upstream session must be dropped after this failure
    ///
    /// Everything except a connection-resolution failure forces a fresh
    /// login on the next tick; resolution failures are data conditions.
    pub fn invalidates_session(&self) -> bool {
        !matches!(self, RelayError::ConnectionResolution(_))
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Credential(_) => "credential",
            RelayError::RegionMismatch { .. } => "region_mismatch",
            RelayError::ConnectionResolution(_) => "connection_resolution",
            RelayError::Transport(_) => "transport",
            RelayError::Sink(_) => "sink",
            RelayError::InvalidData(_) => "invalid_data",
        }
    }
}
