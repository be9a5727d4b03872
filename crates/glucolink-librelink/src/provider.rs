//! IUpstreamClient implementation for the LibreLink Up API
//!
//! Delegates every port call to the matching [`LibreLinkClient`] method.
//! The client needs no interior mutability: the cookie jar lives inside
//! `reqwest` and the ticket is owned by the caller's `AuthSession`.

use anyhow::Result;

use glucolink_core::domain::{AuthHeaders, Connection, MeasurementPayload, PatientId};
use glucolink_core::ports::{Credentials, IUpstreamClient, LoginOutcome};

use crate::client::LibreLinkClient;

#[async_trait::async_trait]
impl IUpstreamClient for LibreLinkClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        self.post_login(credentials).await
    }

    async fn list_connections(&self, auth: &AuthHeaders) -> Result<Vec<Connection>> {
        self.get_connections(auth).await
    }

    async fn fetch_graph(
        &self,
        auth: &AuthHeaders,
        patient_id: &PatientId,
    ) -> Result<MeasurementPayload> {
        self.get_graph(auth, patient_id).await
    }
}
