//! Tick scheduler - runs the relay engine on a fixed period
//!
//! The first tick fires immediately, then one every `interval_minutes`.
//! Ticks never overlap: the next one is scheduled only after the previous
//! one finished, and a tick that overruns the period delays the schedule
//! instead of bursting to catch up.
//!
//! A failed tick is logged and the loop carries on. The fixed period is the
//! only throttle; there is no backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use glucolink_core::domain::RelayError;

use crate::engine::{RelayEngine, TickReport};

/// Drives [`RelayEngine::tick`] periodically until shutdown
pub struct TickScheduler {
    engine: Arc<RelayEngine>,
    period: Duration,
}

impl TickScheduler {
    /// Creates a new `TickScheduler`
    ///
    /// # Arguments
    /// * `engine` - The relay engine to drive
    /// * `period` - Time between tick starts
    pub fn new(engine: Arc<RelayEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Creates a scheduler with a period given in minutes
    pub fn every_minutes(engine: Arc<RelayEngine>, minutes: u64) -> Self {
        Self::new(engine, Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Time between tick starts
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs a single tick and logs its failure
    pub async fn run_once(&self) -> Result<TickReport, RelayError> {
        self.engine.tick().await.map_err(|e| {
            error!(kind = e.kind(), error = %e, "Tick failed");
            e
        })
    }

    /// Ticks until `shutdown` is cancelled
    ///
    /// A tick in flight when shutdown arrives is dropped.
    ///
    /// # Returns
    /// The number of ticks that ran to completion, failed ones included.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0u64;

        info!(period_secs = self.period.as_secs(), "Relay scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested during a tick");
                    break;
                }
                _ = self.run_once() => completed += 1,
            }
        }

        info!(ticks = completed, "Relay scheduler stopped");
        completed
    }
}
