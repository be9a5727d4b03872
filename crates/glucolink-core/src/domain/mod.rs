//! Domain entities and business logic
//!
//! This module contains the core domain types for GlucoLink:
//! - Newtypes for patient identifiers and regional endpoints
//! - The upstream authentication ticket and session
//! - Patient connections
//! - Raw measurements and the timestamp conversion
//! - Downstream entries and trend directions
//! - Domain-specific error types

pub mod connection;
pub mod entry;
pub mod errors;
pub mod measurement;
pub mod newtypes;
pub mod session;

// Re-export commonly used types
pub use connection::Connection;
pub use entry::{Direction, StoredEntry, SyncEntry};
pub use errors::{DomainError, RelayError};
pub use measurement::{factory_timestamp_to_utc, GlucoseReading, MeasurementPayload};
pub use newtypes::{PatientId, Region};
pub use session::{AuthHeaders, AuthSession, AuthTicket};
