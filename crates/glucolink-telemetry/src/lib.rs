//! GlucoLink Telemetry - Prometheus metrics for the relay
//!
//! Provides:
//! - `MetricsRegistry`: gauges for the latest glucose reading and counters
//!   for tick outcomes and uploaded entries
//! - `MetricsServer`: HTTP server for Prometheus scraping

pub mod metrics;
pub mod server;

pub use metrics::MetricsRegistry;
pub use server::MetricsServer;
