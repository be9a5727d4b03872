//! Measurement fetch use case
//!
//! Orchestrates one upstream round trip: valid session, connection list,
//! connection resolution, graph fetch. Transport errors at the list or
//! fetch step drop the session; there is no retry within a call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    domain::{AuthSession, MeasurementPayload, PatientId, RelayError},
    ports::IUpstreamClient,
    usecases::{authenticate::AuthenticateUseCase, resolve_connection::resolve_connection},
};

/// Use case for retrieving the latest readings of the selected patient
pub struct FetchMeasurementsUseCase {
    upstream: Arc<dyn IUpstreamClient + Send + Sync>,
    authenticate: AuthenticateUseCase,
    preferred: Option<PatientId>,
}

impl FetchMeasurementsUseCase {
    /// Creates a new FetchMeasurementsUseCase
    ///
    /// # Arguments
    ///
    /// * `upstream` - Upstream API client
    /// * `authenticate` - Session renewal use case
    /// * `preferred` - Patient id to pin when several connections exist
    pub fn new(
        upstream: Arc<dyn IUpstreamClient + Send + Sync>,
        authenticate: AuthenticateUseCase,
        preferred: Option<PatientId>,
    ) -> Self {
        Self {
            upstream,
            authenticate,
            preferred,
        }
    }

    /// Fetches the measurement payload for the resolved connection
    ///
    /// # Errors
    ///
    /// - Login failures from [`AuthenticateUseCase::ensure_session`]
    /// - [`RelayError::ConnectionResolution`] (session kept)
    /// - [`RelayError::Transport`] (session invalidated)
    pub async fn fetch(&self, session: &mut AuthSession) -> Result<MeasurementPayload, RelayError> {
        let headers = self.authenticate.ensure_session(session).await?;

        let connections = match self.upstream.list_connections(&headers).await {
            Ok(connections) => connections,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Listing connections failed, dropping session");
                session.invalidate();
                return Err(RelayError::Transport(e));
            }
        };

        let patient_id = resolve_connection(&connections, self.preferred.as_ref())?
            .patient_id
            .clone();

        match self.upstream.fetch_graph(&headers, &patient_id).await {
            Ok(payload) => {
                debug!(
                    patient_id = %patient_id,
                    history = payload.history.len(),
                    "Fetched glucose measurements"
                );
                Ok(payload)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Fetching graph data failed, dropping session");
                session.invalidate();
                Err(RelayError::Transport(e))
            }
        }
    }
}
