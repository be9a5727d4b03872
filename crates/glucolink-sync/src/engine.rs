//! Relay engine
//!
//! The [`RelayEngine`] runs one tick of the relay: fetch the latest readings
//! from LibreLink Up, read the watermark from the Nightscout sink, diff, and
//! upload whatever is new.
//!
//! ## Tick Flow
//!
//! 1. **Fetch**: renew the session if needed, resolve the connection, read
//!    the graph (see [`FetchMeasurementsUseCase`])
//! 2. **Watermark**: ask the sink for its newest entry (skipped when all
//!    data is resent)
//! 3. **Diff**: keep readings strictly newer than the watermark
//! 4. **Upload**: send the batch, or log that nothing is new
//!
//! Any failure aborts the tick. Every failure except a connection
//! resolution problem also drops the upstream session so the next tick
//! starts with a fresh login. There are no retries inside a tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use glucolink_core::config::Config;
use glucolink_core::domain::{AuthSession, DomainError, PatientId, RelayError};
use glucolink_core::ports::{Credentials, IEntrySink, IUpstreamClient};
use glucolink_core::usecases::{AuthenticateUseCase, FetchMeasurementsUseCase, IncrementalDiff};
use glucolink_telemetry::MetricsRegistry;

// ============================================================================
// TickReport
// ============================================================================

/// Summary of a successful tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Patient whose readings were relayed
    pub patient_id: PatientId,
    /// Readings in the fetched payload (current plus history)
    pub fetched: usize,
    /// Entries accepted by the sink
    pub uploaded: usize,
    /// Sink watermark the diff was computed against
    pub watermark: Option<DateTime<Utc>>,
}

// ============================================================================
// RelayEngine
// ============================================================================

/// Tick orchestrator owning the single upstream session
///
/// The session sits behind an async mutex that is held for the whole tick,
/// so concurrent calls to [`tick`](RelayEngine::tick) run one after the
/// other.
pub struct RelayEngine {
    fetcher: FetchMeasurementsUseCase,
    sink: Arc<dyn IEntrySink + Send + Sync>,
    diff: IncrementalDiff,
    session: Mutex<AuthSession>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl RelayEngine {
    /// Creates a new engine with an empty session
    ///
    /// # Arguments
    /// * `upstream` - LibreLink Up client
    /// * `sink` - Nightscout sink variant
    /// * `credentials` - LibreLink Up account
    /// * `preferred` - Patient id to pin when several connections exist
    /// * `all_data` - Ignore the sink watermark and resend everything
    pub fn new(
        upstream: Arc<dyn IUpstreamClient + Send + Sync>,
        sink: Arc<dyn IEntrySink + Send + Sync>,
        credentials: Credentials,
        preferred: Option<PatientId>,
        all_data: bool,
    ) -> Self {
        let authenticate = AuthenticateUseCase::new(Arc::clone(&upstream), credentials);
        Self {
            fetcher: FetchMeasurementsUseCase::new(upstream, authenticate, preferred),
            sink,
            diff: IncrementalDiff::new(all_data),
            session: Mutex::new(AuthSession::new()),
            metrics: None,
        }
    }

    /// Creates an engine from the loaded configuration
    ///
    /// # Errors
    /// Returns [`DomainError`] if the configured patient id is malformed.
    pub fn from_config(
        config: &Config,
        upstream: Arc<dyn IUpstreamClient + Send + Sync>,
        sink: Arc<dyn IEntrySink + Send + Sync>,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(
            upstream,
            sink,
            config.librelink.credentials(),
            config.librelink.preferred_patient()?,
            config.sync.all_data,
        ))
    }

    /// Attaches a metrics registry updated on every tick
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether the held upstream session is currently usable
    pub async fn has_valid_session(&self) -> bool {
        self.session.lock().await.is_valid()
    }

    /// Runs one fetch-diff-upload cycle
    ///
    /// # Errors
    /// Returns the [`RelayError`] of the first failing step. The error has
    /// already been applied to the session when this returns.
    #[tracing::instrument(skip(self), fields(sink = self.sink.name()))]
    pub async fn tick(&self) -> Result<TickReport, RelayError> {
        let mut session = self.session.lock().await;

        let result = self.run_tick(&mut session).await;

        match &result {
            Ok(report) => {
                self.record_outcome("success");
                debug!(
                    patient_id = %report.patient_id,
                    fetched = report.fetched,
                    uploaded = report.uploaded,
                    "Tick completed"
                );
            }
            Err(e) => {
                if e.invalidates_session() {
                    session.invalidate();
                }
                self.record_outcome(e.kind());
            }
        }

        result
    }

    async fn run_tick(&self, session: &mut AuthSession) -> Result<TickReport, RelayError> {
        let payload = self.fetcher.fetch(session).await?;

        if let Some(metrics) = &self.metrics {
            metrics.observe_reading(&payload.current);
        }

        let watermark = self.watermark().await?;
        let entries = self.diff.diff(&payload, watermark)?;

        let report = TickReport {
            patient_id: payload.patient_id.clone(),
            fetched: payload.history.len() + 1,
            uploaded: entries.len(),
            watermark,
        };

        if entries.is_empty() {
            info!("No new measurements to upload");
            return Ok(report);
        }

        info!(
            "Trying to upload {} glucose measurement items to Nightscout",
            entries.len()
        );
        self.sink.upload_entries(&entries).await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Nightscout upload failed");
            RelayError::Sink(e)
        })?;
        info!(
            "Upload of {} measurements to Nightscout succeeded",
            entries.len()
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_uploaded(entries.len());
        }

        Ok(report)
    }

    /// Queries the sink's newest entry unless everything is resent
    async fn watermark(&self) -> Result<Option<DateTime<Utc>>, RelayError> {
        if self.diff.all_data {
            debug!("Resending all data, sink watermark not queried");
            return Ok(None);
        }

        let last = self.sink.last_entry().await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Reading the last Nightscout entry failed");
            RelayError::Sink(e)
        })?;

        match &last {
            Some(entry) => debug!(date = %entry.date, "Sink watermark"),
            None => debug!("Sink holds no entries"),
        }
        Ok(last.map(|entry| entry.date))
    }

    fn record_outcome(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_tick(outcome);
        }
    }
}
