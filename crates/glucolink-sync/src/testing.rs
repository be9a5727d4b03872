//! In-memory ports used by the engine and scheduler tests

use std::sync::Mutex;

use async_trait::async_trait;

use glucolink_core::domain::{
    AuthHeaders, AuthTicket, Connection, GlucoseReading, MeasurementPayload, PatientId,
    StoredEntry, SyncEntry,
};
use glucolink_core::ports::{Credentials, IEntrySink, IUpstreamClient, LoginOutcome};

/// Upstream that always logs in and returns a fixed three-reading payload
pub(crate) struct MockUpstream {
    connections: Vec<Connection>,
    graph_fails: bool,
    calls: Mutex<Vec<String>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            connections: vec![connection("patient-a")],
            graph_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_failing_graph(mut self) -> Self {
        self.graph_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl IUpstreamClient for MockUpstream {
    async fn login(&self, _credentials: &Credentials) -> anyhow::Result<LoginOutcome> {
        self.record("login");
        Ok(LoginOutcome::Authenticated {
            ticket: AuthTicket::new("mock-token", i64::MAX, 1000),
            user_id: "user-1".to_string(),
        })
    }

    async fn list_connections(&self, _auth: &AuthHeaders) -> anyhow::Result<Vec<Connection>> {
        self.record("list_connections");
        Ok(self.connections.clone())
    }

    async fn fetch_graph(
        &self,
        _auth: &AuthHeaders,
        patient_id: &PatientId,
    ) -> anyhow::Result<MeasurementPayload> {
        self.record("fetch_graph");
        if self.graph_fails {
            anyhow::bail!("connection reset by peer");
        }
        Ok(MeasurementPayload {
            patient_id: patient_id.clone(),
            current: reading("12/30/2022 4:47:40 PM", 115, Some(3)),
            history: vec![
                reading("12/30/2022 4:30:40 PM", 120, None),
                reading("12/30/2022 4:15:40 PM", 125, None),
            ],
        })
    }
}

/// Sink with a fixed watermark that records uploaded batches
pub(crate) struct MockSink {
    last: Option<StoredEntry>,
    last_entry_fails: bool,
    upload_fails: bool,
    last_entry_calls: Mutex<usize>,
    uploads: Mutex<Vec<Vec<SyncEntry>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            last: None,
            last_entry_fails: false,
            upload_fails: false,
            last_entry_calls: Mutex::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_last_entry(mut self, last: Option<StoredEntry>) -> Self {
        self.last = last;
        self
    }

    pub fn with_failing_last_entry(mut self) -> Self {
        self.last_entry_fails = true;
        self
    }

    pub fn with_failing_upload(mut self) -> Self {
        self.upload_fails = true;
        self
    }

    pub fn last_entry_calls(&self) -> usize {
        *self.last_entry_calls.lock().unwrap()
    }

    pub fn uploads(&self) -> Vec<Vec<SyncEntry>> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl IEntrySink for MockSink {
    async fn last_entry(&self) -> anyhow::Result<Option<StoredEntry>> {
        *self.last_entry_calls.lock().unwrap() += 1;
        if self.last_entry_fails {
            anyhow::bail!("/api/v1/entries returned HTTP 500, expected 200");
        }
        Ok(self.last.clone())
    }

    async fn upload_entries(&self, entries: &[SyncEntry]) -> anyhow::Result<()> {
        if self.upload_fails {
            anyhow::bail!("/api/v1/entries returned HTTP 401, expected 200");
        }
        self.uploads.lock().unwrap().push(entries.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn connection(patient_id: &str) -> Connection {
    Connection {
        id: format!("conn-{patient_id}"),
        patient_id: PatientId::new(patient_id).unwrap(),
        first_name: "Test".to_string(),
        last_name: "Patient".to_string(),
        status: 2,
    }
}

fn reading(timestamp: &str, value_mg_dl: i32, trend: Option<i64>) -> GlucoseReading {
    GlucoseReading {
        factory_timestamp: timestamp.to_string(),
        value_mg_dl,
        value: f64::from(value_mg_dl) / 18.0,
        trend_arrow: trend,
        is_high: false,
        is_low: false,
    }
}
