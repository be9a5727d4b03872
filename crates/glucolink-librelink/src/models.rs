//! LibreLink Up wire types
//!
//! Only the fields the relay reads are modelled; everything else in the
//! (large) upstream bodies is ignored by serde.

use serde::{Deserialize, Serialize};

use glucolink_core::domain::{AuthTicket, Connection, DomainError, GlucoseReading, PatientId};

// ============================================================================
// Login
// ============================================================================

/// Body of `POST /llu/auth/login`
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from the login endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    /// 0 on success
    pub status: i64,
    #[serde(default)]
    pub data: Option<LoginData>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginData {
    #[serde(default)]
    pub user: Option<UserDto>,
    #[serde(default)]
    pub auth_ticket: Option<AuthTicketDto>,
    /// Set when the account lives in another region
    #[serde(default)]
    pub redirect: Option<bool>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthTicketDto {
    pub token: String,
    pub expires: i64,
    #[serde(default)]
    pub duration: i64,
}

impl From<AuthTicketDto> for AuthTicket {
    fn from(dto: AuthTicketDto) -> Self {
        AuthTicket::new(dto.token, dto.expires, dto.duration)
    }
}

// ============================================================================
// Connections
// ============================================================================

/// Response from `GET /llu/connections`
#[derive(Debug, Deserialize)]
pub(crate) struct ConnectionsResponse {
    pub status: i64,
    #[serde(default)]
    pub data: Vec<ConnectionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionDto {
    #[serde(default)]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub status: i64,
}

impl TryFrom<ConnectionDto> for Connection {
    type Error = DomainError;

    fn try_from(dto: ConnectionDto) -> Result<Self, Self::Error> {
        Ok(Connection {
            id: dto.id,
            patient_id: PatientId::new(dto.patient_id)?,
            first_name: dto.first_name,
            last_name: dto.last_name,
            status: dto.status,
        })
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Response from `GET /llu/connections/{patientId}/graph`
#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse {
    pub status: i64,
    pub data: GraphData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphData {
    pub connection: GraphConnection,
    #[serde(default)]
    pub graph_data: Vec<GlucoseItemDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphConnection {
    pub patient_id: String,
    pub glucose_measurement: GlucoseItemDto,
}

/// A single reading, as upstream spells it
#[derive(Debug, Deserialize)]
pub(crate) struct GlucoseItemDto {
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: String,
    #[serde(rename = "ValueInMgPerDl")]
    pub value_in_mg_per_dl: i32,
    #[serde(rename = "Value", default)]
    pub value: f64,
    #[serde(rename = "TrendArrow", default)]
    pub trend_arrow: Option<i64>,
    #[serde(rename = "isHigh", default)]
    pub is_high: bool,
    #[serde(rename = "isLow", default)]
    pub is_low: bool,
}

impl From<GlucoseItemDto> for GlucoseReading {
    fn from(dto: GlucoseItemDto) -> Self {
        GlucoseReading {
            factory_timestamp: dto.factory_timestamp,
            value_mg_dl: dto.value_in_mg_per_dl,
            value: dto.value,
            trend_arrow: dto.trend_arrow,
            is_high: dto.is_high,
            is_low: dto.is_low,
        }
    }
}
