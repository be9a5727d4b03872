//! GlucoLink Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `AuthSession`, `Connection`, `MeasurementPayload`, `SyncEntry`
//! - **Use cases** - `AuthenticateUseCase`, `FetchMeasurementsUseCase`, `IncrementalDiff`
//! - **Port definitions** - Traits for adapters: `IUpstreamClient`, `IEntrySink`
//! - **Configuration** - YAML file plus environment overrides
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
