//! Patient connection entity
//!
//! A connection links the logged-in follower account to one patient whose
//! sensor readings can be fetched. Connections are a per-tick snapshot and
//! are never persisted.

use serde::{Deserialize, Serialize};

use super::newtypes::PatientId;

/// A linked patient connection as reported by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier
    pub id: String,
    /// Stable patient identifier used in upstream URLs
    pub patient_id: PatientId,
    /// Patient first name
    pub first_name: String,
    /// Patient last name
    pub last_name: String,
    /// Upstream connection status code
    pub status: i64,
}

impl Connection {
    /// Human-readable label, e.g. `Jane Doe (Patient-ID: 7ad6...)`
    pub fn label(&self) -> String {
        format!(
            "{} {} (Patient-ID: {})",
            self.first_name, self.last_name, self.patient_id
        )
    }
}
