//! Incremental entry computation
//!
//! Turns a [`MeasurementPayload`] into the ordered list of entries the sink
//! has not seen yet. Pure: the watermark is supplied by the caller.
//!
//! ## Ordering
//!
//! The current reading comes first (with its trend direction), followed by
//! the history readings in payload order. Each reading is compared to the
//! watermark on its own; the history is not assumed to be sorted, so the
//! scan never stops early.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Direction, DomainError, MeasurementPayload, SyncEntry};

/// Diff of upstream readings against the sink watermark
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalDiff {
    /// Ignore the watermark and resend everything
    pub all_data: bool,
}

impl IncrementalDiff {
    /// Creates a diff, optionally in resend-everything mode
    pub fn new(all_data: bool) -> Self {
        Self { all_data }
    }

    /// Computes the entries strictly newer than `watermark`
    ///
    /// # Arguments
    ///
    /// * `payload` - Current reading and history from upstream
    /// * `watermark` - Instant of the newest entry the sink already holds
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if any timestamp cannot be converted.
    pub fn diff(
        &self,
        payload: &MeasurementPayload,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<SyncEntry>, DomainError> {
        let watermark = if self.all_data { None } else { watermark };
        let is_new = |instant: DateTime<Utc>| watermark.map_or(true, |w| instant > w);

        let mut entries = Vec::with_capacity(payload.history.len() + 1);

        let current = &payload.current;
        let current_instant = current.instant()?;
        if is_new(current_instant) {
            entries.push(SyncEntry {
                date: current_instant,
                sgv: current.value_mg_dl,
                direction: Some(Direction::from_optional_trend_arrow(current.trend_arrow)),
            });
        }

        for reading in &payload.history {
            let instant = reading.instant()?;
            if is_new(instant) {
                entries.push(SyncEntry {
                    date: instant,
                    sgv: reading.value_mg_dl,
                    direction: None,
                });
            }
        }

        debug!(
            candidates = payload.history.len() + 1,
            selected = entries.len(),
            watermark = ?watermark,
            "Computed new entries"
        );
        Ok(entries)
    }
}
