//! Upstream CGM API port (driven/secondary port)
//!
//! This module defines the interface for talking to the LibreLink Up API.
//! The adapter in `glucolink-librelink` implements it over HTTP; use case
//! tests implement it in memory.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors at port boundaries are
//!   adapter-specific; the use cases classify them into `RelayError`.
//! - Login outcomes that arrive over a successful transport (non-zero
//!   status, regional redirect) are values of [`LoginOutcome`], not errors.

use crate::domain::{AuthHeaders, AuthTicket, Connection, MeasurementPayload, PatientId};

/// Account credentials for the upstream login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail address
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Creates new credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a login handshake that completed at the transport level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Login accepted
    Authenticated {
        /// Issued ticket
        ticket: AuthTicket,
        /// Upstream user id, hashed into the `account-id` header
        user_id: String,
    },
    /// Response body carried a non-zero status code
    Rejected {
        /// Upstream status code
        status: i64,
        /// Upstream message, if any
        message: Option<String>,
    },
    /// The account lives in another regional endpoint
    WrongRegion {
        /// Region code as reported upstream
        region: String,
    },
    /// Status 0 but no usable ticket in the body
    MissingTicket,
}

/// Port trait for the upstream CGM API
#[async_trait::async_trait]
pub trait IUpstreamClient: Send + Sync {
    /// Performs the login handshake
    async fn login(&self, credentials: &Credentials) -> anyhow::Result<LoginOutcome>;

    /// Lists the patient connections visible to the account, upstream order
    async fn list_connections(&self, auth: &AuthHeaders) -> anyhow::Result<Vec<Connection>>;

    /// Fetches the current reading and history for one patient
    async fn fetch_graph(
        &self,
        auth: &AuthHeaders,
        patient_id: &PatientId,
    ) -> anyhow::Result<MeasurementPayload>;
}
