//! Use cases (interactors) for GlucoLink
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AuthenticateUseCase`] - Session validity check and upstream login
//! - [`resolve_connection`] - Picks one patient connection
//! - [`FetchMeasurementsUseCase`] - Session, connections, graph payload
//! - [`IncrementalDiff`] - Entries newer than the sink watermark

pub mod authenticate;
pub mod compute_entries;
pub mod fetch_measurements;
pub mod resolve_connection;


pub use authenticate::AuthenticateUseCase;
pub use compute_entries::IncrementalDiff;
pub use fetch_measurements::FetchMeasurementsUseCase;
pub use resolve_connection::{resolve_connection, ResolutionError};
