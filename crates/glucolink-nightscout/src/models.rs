//! Nightscout wire types

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use glucolink_core::domain::{StoredEntry, SyncEntry};

use crate::NightscoutError;

/// Entry type for sensor glucose values
pub const SGV_TYPE: &str = "sgv";

/// Upload body for `POST /api/v1/entries` (one element of the array)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryV1<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sgv: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'static str>,
    pub device: &'a str,
    /// Epoch milliseconds
    pub date: i64,
    /// ISO-8601 with milliseconds and `Z`
    pub date_string: String,
}

impl<'a> EntryV1<'a> {
    pub fn new(entry: &SyncEntry, device: &'a str) -> Self {
        Self {
            kind: SGV_TYPE,
            sgv: entry.sgv,
            direction: entry.direction.map(|d| d.as_str()),
            device,
            date: entry.date.timestamp_millis(),
            date_string: entry.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Upload body for `POST /api/v3/entries`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryV3<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sgv: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'static str>,
    pub device: &'a str,
    /// Epoch milliseconds
    pub date: i64,
    pub app: &'a str,
}

impl<'a> EntryV3<'a> {
    pub fn new(entry: &SyncEntry, device: &'a str, app: &'a str) -> Self {
        Self {
            kind: SGV_TYPE,
            sgv: entry.sgv,
            direction: entry.direction.map(|d| d.as_str()),
            device,
            date: entry.date.timestamp_millis(),
            app,
        }
    }
}

/// A stored entry as returned by either API version
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntryDto {
    /// Epoch milliseconds
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub date_string: Option<String>,
    #[serde(default)]
    pub sgv: Option<f64>,
    #[serde(default)]
    pub direction: Option<String>,
}

impl TryFrom<StoredEntryDto> for StoredEntry {
    type Error = NightscoutError;

    fn try_from(dto: StoredEntryDto) -> Result<Self, Self::Error> {
        let date = match (dto.date, dto.date_string.as_deref()) {
            (Some(ms), _) => Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
                NightscoutError::InvalidResponse(format!("entry date out of range: {ms}"))
            })?,
            (None, Some(s)) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| NightscoutError::InvalidResponse(format!("entry dateString {s}: {e}")))?,
            (None, None) => {
                return Err(NightscoutError::InvalidResponse(
                    "entry has neither date nor dateString".to_string(),
                ))
            }
        };

        Ok(StoredEntry {
            date,
            sgv: dto.sgv,
            direction: dto.direction,
        })
    }
}

/// Response envelope of API v3 reads
#[derive(Debug, Deserialize)]
pub struct V3Envelope<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

/// Response of `GET /api/v2/authorization/request/{token}`
#[derive(Debug, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub token: Option<String>,
}
