//! Connection resolution
//!
//! Picks exactly one patient connection out of the list returned upstream:
//!
//! | connections | preference | result |
//! |---|---|---|
//! | 0 | any | [`ResolutionError::NoConnections`] |
//! | 1 | any | that connection (preference ignored) |
//! | n > 1 | none | the first one, with a warning |
//! | n > 1 | `id` | the one whose patient id is `id`, else [`ResolutionError::PreferredNotFound`] |
//!
//! Pure function over the upstream ordering; no I/O.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{Connection, PatientId};

/// Why no connection could be picked
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The account has no linked patients
    #[error("No LibreLink Up connection found")]
    NoConnections,

    /// The configured patient id is not among the linked patients
    #[error("The specified Patient-ID was not found: {0}")]
    PreferredNotFound(PatientId),
}

/// Selects the connection to relay readings for
pub fn resolve_connection<'a>(
    connections: &'a [Connection],
    preferred: Option<&PatientId>,
) -> Result<&'a Connection, ResolutionError> {
    let picked = match connections {
        [] => {
            error!("No LibreLink Up connection found");
            return Err(ResolutionError::NoConnections);
        }
        [only] => {
            info!("Found 1 LibreLink Up connection");
            only
        }
        [first, ..] => {
            debug!(count = connections.len(), "Found LibreLink Up connections");
            for (index, conn) in connections.iter().enumerate() {
                debug!("[{}] {}", index + 1, conn.label());
            }

            match preferred {
                None => {
                    warn!(
                        "No Patient-ID configured (LINK_UP_CONNECTION); \
                         using the first connection"
                    );
                    first
                }
                Some(wanted) => match connections.iter().find(|c| &c.patient_id == wanted) {
                    Some(conn) => conn,
                    None => {
                        error!(patient_id = %wanted, "The specified Patient-ID was not found");
                        return Err(ResolutionError::PreferredNotFound(wanted.clone()));
                    }
                },
            }
        }
    };

    info!("-> The following connection will be used: {}", picked.label());
    Ok(picked)
}
