//! Raw glucose measurements from the upstream API
//!
//! Upstream timestamps are naive local-time strings such as
//! `12/30/2022 4:42:41 PM`. [`factory_timestamp_to_utc`] is the single place
//! that turns them into absolute instants.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::PatientId;

/// Format of upstream `FactoryTimestamp` values
pub const FACTORY_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// A single glucose reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    /// Naive sensor timestamp, upstream encoding
    pub factory_timestamp: String,
    /// Glucose value in mg/dL
    pub value_mg_dl: i32,
    /// Glucose value in the account's display unit
    pub value: f64,
    /// Raw trend arrow code (only meaningful on the current reading)
    pub trend_arrow: Option<i64>,
    /// Upstream high flag
    pub is_high: bool,
    /// Upstream low flag
    pub is_low: bool,
}

impl GlucoseReading {
    /// Absolute instant of this reading
    pub fn instant(&self) -> Result<DateTime<Utc>, DomainError> {
        factory_timestamp_to_utc(&self.factory_timestamp)
    }
}

/// Payload fetched per tick: the current reading plus recent history
///
/// History order is whatever upstream returned; consumers must not assume
/// it is sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPayload {
    /// Patient the readings belong to
    pub patient_id: PatientId,
    /// Latest reading, carries the trend arrow
    pub current: GlucoseReading,
    /// Prior readings
    pub history: Vec<GlucoseReading>,
}

/// Converts an upstream timestamp into a UTC instant
///
/// The string is read as local time of the running process and then
/// shifted by the host's UTC offset at that instant. Upstream encodes the
/// sensor time without a zone, and the shift makes the result independent
/// of the host zone.
pub fn factory_timestamp_to_utc(timestamp: &str) -> Result<DateTime<Utc>, DomainError> {
    let naive = NaiveDateTime::parse_from_str(timestamp.trim(), FACTORY_TIMESTAMP_FORMAT)
        .map_err(|e| DomainError::InvalidTimestamp(format!("{timestamp}: {e}")))?;

    Ok(naive_to_utc_in(&naive, &Local))
}

/// Reads `naive` as a wall-clock time of `zone` and adds the zone offset back
///
/// A time inside a DST gap has no local instant; it is taken as UTC, which
/// is what the shift yields everywhere else.
fn naive_to_utc_in<Tz: TimeZone>(naive: &NaiveDateTime, zone: &Tz) -> DateTime<Utc> {
    match zone.from_local_datetime(naive).earliest() {
        Some(local) => shift_by_local_offset(local),
        None => Utc.from_utc_datetime(naive),
    }
}

/// Adds the zone's UTC offset back onto an instant
fn shift_by_local_offset<Tz: TimeZone>(local: DateTime<Tz>) -> DateTime<Utc> {
    let offset_secs = local.offset().fix().local_minus_utc();
    local.with_timezone(&Utc) + Duration::seconds(i64::from(offset_secs))
}
