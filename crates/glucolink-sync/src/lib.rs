//! GlucoLink Sync - LibreLink Up to Nightscout relay loop
//!
//! Provides:
//! - One-shot relay ticks (fetch, diff against the sink watermark, upload)
//! - A fixed-period scheduler with graceful shutdown
//!
//! ## Modules
//!
//! - [`engine`] - Tick orchestrator owning the upstream session
//! - [`scheduler`] - Periodic driver for the engine

pub mod engine;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{RelayEngine, TickReport};
pub use scheduler::TickScheduler;
