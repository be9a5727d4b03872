//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IUpstreamClient`] - LibreLink Up login, connections and graph data
//! - [`IEntrySink`] - Nightscout last-entry query and entry upload

pub mod sink;
pub mod upstream;

pub use sink::IEntrySink;
pub use upstream::{Credentials, IUpstreamClient, LoginOutcome};
