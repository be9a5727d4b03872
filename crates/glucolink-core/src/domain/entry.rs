//! Downstream-bound glucose entries
//!
//! [`SyncEntry`] is what the relay forwards to the sink; [`StoredEntry`] is
//! what the sink reports back as its most recent record (the watermark).

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trend direction label in the sink's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "SingleDown")]
    SingleDown,
    #[serde(rename = "FortyFiveDown")]
    FortyFiveDown,
    #[serde(rename = "Flat")]
    Flat,
    #[serde(rename = "FortyFiveUp")]
    FortyFiveUp,
    #[serde(rename = "SingleUp")]
    SingleUp,
    #[serde(rename = "NOT COMPUTABLE")]
    NotComputable,
}

impl Direction {
    /// Maps an upstream trend arrow code onto a direction
    ///
    /// Codes 1 through 5 go from falling to rising; anything else is
    /// not computable.
    pub fn from_trend_arrow(code: i64) -> Self {
        match code {
            1 => Direction::SingleDown,
            2 => Direction::FortyFiveDown,
            3 => Direction::Flat,
            4 => Direction::FortyFiveUp,
            5 => Direction::SingleUp,
            _ => Direction::NotComputable,
        }
    }

    /// Same as [`Direction::from_trend_arrow`], with a missing code mapping
    /// to [`Direction::NotComputable`]
    pub fn from_optional_trend_arrow(code: Option<i64>) -> Self {
        code.map_or(Direction::NotComputable, Self::from_trend_arrow)
    }

    /// Wire label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::SingleDown => "SingleDown",
            Direction::FortyFiveDown => "FortyFiveDown",
            Direction::Flat => "Flat",
            Direction::FortyFiveUp => "FortyFiveUp",
            Direction::SingleUp => "SingleUp",
            Direction::NotComputable => "NOT COMPUTABLE",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry to be forwarded to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Absolute instant of the reading
    pub date: DateTime<Utc>,
    /// Glucose value in mg/dL
    pub sgv: i32,
    /// Present only on the current reading
    pub direction: Option<Direction>,
}

/// Most recent entry reported by the sink
///
/// Other uploaders may store fractional values, so `sgv` is kept as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Instant of the stored record
    pub date: DateTime<Utc>,
    /// Stored glucose value, if the sink returned one
    pub sgv: Option<f64>,
    /// Stored direction label, verbatim
    pub direction: Option<String>,
}
