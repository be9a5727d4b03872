//! Downstream sink port (driven/secondary port)
//!
//! The sink stores converted entries and is the durable source of truth for
//! what has already been delivered: the relay re-queries its most recent
//! entry on every tick instead of caching a watermark locally.
//!
//! Implementations differ in how they report an empty store. The v1 adapter
//! returns `Ok(None)`; the v3 adapter returns an error. Callers treat both
//! as documented behavior of the selected backend.

use crate::domain::{StoredEntry, SyncEntry};

/// Port trait for the downstream time-series sink
#[async_trait::async_trait]
pub trait IEntrySink: Send + Sync {
    /// Returns the most recently stored entry
    async fn last_entry(&self) -> anyhow::Result<Option<StoredEntry>>;

    /// Stores a batch of entries; any failure fails the whole batch
    async fn upload_entries(&self, entries: &[SyncEntry]) -> anyhow::Result<()>;

    /// Short name of the backend variant, for logs
    fn name(&self) -> &'static str;
}
