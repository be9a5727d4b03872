//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// PatientId
// ============================================================================

/// Identifier of a patient connection, as used in upstream URLs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Create a new PatientId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidPatientId(
                "patient id must not be empty".to_string(),
            ));
        }
        if trimmed.contains('/') {
            return Err(DomainError::InvalidPatientId(format!(
                "patient id must not contain '/': {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PatientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// Region
// ============================================================================

/// Regional LibreLink Up endpoint an account is homed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    Ae,
    Ap,
    Au,
    Ca,
    De,
    Eu,
    Eu2,
    Fr,
    Jp,
    Us,
}

impl Region {
    /// All known regions, in display order
    pub const ALL: [Region; 10] = [
        Region::Ae,
        Region::Ap,
        Region::Au,
        Region::Ca,
        Region::De,
        Region::Eu,
        Region::Eu2,
        Region::Fr,
        Region::Jp,
        Region::Us,
    ];

    /// Upper-case region code (e.g. `EU2`)
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Region::Ae => "AE",
            Region::Ap => "AP",
            Region::Au => "AU",
            Region::Ca => "CA",
            Region::De => "DE",
            Region::Eu => "EU",
            Region::Eu2 => "EU2",
            Region::Fr => "FR",
            Region::Jp => "JP",
            Region::Us => "US",
        }
    }

    /// API host for this region (e.g. `api-eu.libreview.io`)
    #[must_use]
    pub fn host(&self) -> String {
        format!("api-{}.libreview.io", self.code().to_ascii_lowercase())
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Eu
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| DomainError::InvalidRegion(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.code().to_string()
    }
}
