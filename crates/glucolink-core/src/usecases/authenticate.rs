//! Authentication use case
//!
//! Keeps the upstream [`AuthSession`] usable: checks validity at the start
//! of every tick and, when the held ticket is missing or expired, drops it
//! and performs a fresh login through the upstream port.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    domain::{AuthHeaders, AuthSession, AuthTicket, RelayError},
    ports::{Credentials, IUpstreamClient, LoginOutcome},
};

/// Use case for upstream login and session renewal
pub struct AuthenticateUseCase {
    upstream: Arc<dyn IUpstreamClient + Send + Sync>,
    credentials: Credentials,
}

impl AuthenticateUseCase {
    /// Creates a new AuthenticateUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `upstream` - Upstream API client used for the login handshake
    /// * `credentials` - Account e-mail and password
    pub fn new(upstream: Arc<dyn IUpstreamClient + Send + Sync>, credentials: Credentials) -> Self {
        Self {
            upstream,
            credentials,
        }
    }

    /// Performs the login handshake and classifies its outcome
    ///
    /// # Returns
    ///
    /// The issued ticket and the upstream user id
    ///
    /// # Errors
    ///
    /// - [`RelayError::Credential`] on transport failure, a non-zero status
    ///   body or a response without a ticket
    /// - [`RelayError::RegionMismatch`] when the account is homed elsewhere
    pub async fn login(&self) -> Result<(AuthTicket, String), RelayError> {
        let outcome = self
            .upstream
            .login(&self.credentials)
            .await
            .map_err(|e| RelayError::Credential(format!("{e:#}")))?;

        match outcome {
            LoginOutcome::Authenticated { ticket, user_id } => {
                info!("Logged in to LibreLink Up");
                Ok((ticket, user_id))
            }
            LoginOutcome::Rejected { status, message } => {
                let detail = match message {
                    Some(msg) => format!("status {status}: {msg}"),
                    None => format!("status {status}"),
                };
                Err(RelayError::Credential(detail))
            }
            LoginOutcome::WrongRegion { region } => Err(RelayError::RegionMismatch {
                region: region.to_uppercase(),
            }),
            LoginOutcome::MissingTicket => Err(RelayError::Credential(
                "response carried no authentication ticket".to_string(),
            )),
        }
    }

    /// Makes sure `session` holds a valid ticket, logging in if needed
    ///
    /// On failure the session is left empty so the next tick retries.
    ///
    /// # Returns
    ///
    /// Headers for authenticated upstream requests
    pub async fn ensure_session(
        &self,
        session: &mut AuthSession,
    ) -> Result<AuthHeaders, RelayError> {
        if session.is_valid() {
            debug!("Reusing valid LibreLink Up session");
        } else {
            info!("renew token");
            session.invalidate();

            let (ticket, user_id) = self.login().await.map_err(|e| {
                warn!(error = %e, "LibreLink Up login failed");
                e
            })?;
            session.establish(ticket, user_id);
        }

        session.auth_headers().ok_or_else(|| {
            session.invalidate();
            RelayError::Credential("session holds no usable token".to_string())
        })
    }
}
