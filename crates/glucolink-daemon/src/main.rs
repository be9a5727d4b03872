//! GlucoLink Daemon - LibreLink Up to Nightscout relay
//!
//! This binary handles:
//! - Configuration loading (YAML file plus environment overrides)
//! - Periodic relay ticks, or a single one with `--once`
//! - The optional Prometheus `/metrics` endpoint
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the LibreLink Up client and the configured Nightscout
//! sink into a `RelayEngine`, then hands it to a `TickScheduler`. The loop
//! is controlled by a `CancellationToken` that is triggered on receipt of
//! SIGTERM or SIGINT.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use glucolink_core::config::Config;
use glucolink_librelink::LibreLinkClient;
use glucolink_sync::{RelayEngine, TickScheduler};
use glucolink_telemetry::{MetricsRegistry, MetricsServer};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "glucolinkd",
    version,
    about = "Relay LibreLink Up glucose readings to Nightscout"
)]
struct Cli {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Filter directive used when `RUST_LOG` is unset
fn filter_directive(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Loads the configuration and applies environment overrides
///
/// An explicit `--config` path must exist. The default path may be absent,
/// in which case built-in defaults are used.
///
/// # Errors
/// Fails on unreadable or malformed YAML, on unparsable environment values
/// and on any validation problem; all problems are listed in the error.
fn load_config<F>(explicit: Option<&Path>, lookup: F) -> Result<(Config, PathBuf)>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, path) = match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, path.to_path_buf())
        }
        None => {
            let path = Config::default_path();
            let config = if path.exists() {
                Config::load(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            } else {
                Config::default()
            };
            (config, path)
        }
    };

    let mut problems = config.apply_overrides(lookup);
    problems.extend(config.validate());

    if !problems.is_empty() {
        let listing = problems
            .iter()
            .map(|p| format!("  - {p}"))
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::bail!("Invalid configuration:\n{listing}");
    }

    Ok((config, path))
}

// ============================================================================
// DaemonService
// ============================================================================

/// Wired relay ready to run
struct DaemonService {
    config: Config,
    engine: Arc<RelayEngine>,
    metrics: Option<Arc<MetricsRegistry>>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Builds the upstream client, the sink and the engine from `config`
    fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let region = config.librelink.region()?;
        let upstream = LibreLinkClient::new(region)?;
        info!(region = %region, "LibreLink Up endpoint {}", region.host());

        let sink = glucolink_nightscout::build_sink(&config.nightscout)?;

        let metrics = if config.metrics.enabled {
            Some(Arc::new(MetricsRegistry::new()?))
        } else {
            None
        };

        let mut engine = RelayEngine::from_config(&config, Arc::new(upstream), sink)?;
        if let Some(metrics) = &metrics {
            engine = engine.with_metrics(Arc::clone(metrics));
        }

        Ok(Self {
            config,
            engine: Arc::new(engine),
            metrics,
            shutdown,
        })
    }

    /// Runs one tick, or the periodic loop until shutdown
    async fn run(&self, once: bool) -> Result<()> {
        let scheduler =
            TickScheduler::every_minutes(Arc::clone(&self.engine), self.config.sync.interval_minutes);

        if once || self.config.sync.single_shot {
            info!("Single-shot mode, running one tick");
            scheduler.run_once().await?;
            return Ok(());
        }

        if let Some(metrics) = &self.metrics {
            self.spawn_metrics_server(Arc::clone(metrics))?;
        }

        scheduler.run(self.shutdown.clone()).await;
        Ok(())
    }

    fn spawn_metrics_server(&self, metrics: Arc<MetricsRegistry>) -> Result<()> {
        let server = MetricsServer::new(metrics, &self.config.metrics.endpoint)
            .context("Invalid metrics endpoint")?;
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = server.run(shutdown).await {
                warn!(error = %e, "Metrics server stopped");
            }
        });
        Ok(())
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = load_config(cli.config.as_deref(), |key| std::env::var(key).ok())?;

    let directive = filter_directive(cli.verbose, &config.logging.level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!(
        config_path = %config_path.display(),
        interval_minutes = config.sync.interval_minutes,
        "GlucoLink relay starting (glucolinkd)"
    );

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token)?;
    let result = service.run(cli.once).await;

    match &result {
        Ok(()) => info!("GlucoLink relay shut down gracefully"),
        Err(e) => error!(error = %e, "GlucoLink relay exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
