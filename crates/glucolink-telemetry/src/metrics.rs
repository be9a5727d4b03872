//! Prometheus metrics registry for GlucoLink
//!
//! Every metric name carries the `glucolink_` prefix. The glucose gauges
//! mirror the current reading of the most recent payload; the counters
//! accumulate over the lifetime of the process.

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use glucolink_core::domain::GlucoseReading;

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Gauge: current glucose value in the account's display unit
    pub glucose_value: Gauge,
    /// Gauge: raw upstream trend arrow code
    pub glucose_trend: Gauge,
    /// Gauge: 1.0 when upstream flags the reading as high
    pub glucose_high: Gauge,
    /// Gauge: 1.0 when upstream flags the reading as low
    pub glucose_low: Gauge,
    /// Counter: completed ticks by outcome (`success` or an error kind)
    pub ticks_total: IntCounterVec,
    /// Counter: entries accepted by the sink
    pub entries_uploaded_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("glucolink".to_string()), None)?;

        let glucose_value = Gauge::new("glucose_value", "Current glucose value")?;
        registry.register(Box::new(glucose_value.clone()))?;

        let glucose_trend = Gauge::new("glucose_trend", "Current trend arrow code")?;
        registry.register(Box::new(glucose_trend.clone()))?;

        let glucose_high = Gauge::new("glucose_high", "Current reading flagged high")?;
        registry.register(Box::new(glucose_high.clone()))?;

        let glucose_low = Gauge::new("glucose_low", "Current reading flagged low")?;
        registry.register(Box::new(glucose_low.clone()))?;

        let ticks_total = IntCounterVec::new(
            Opts::new("ticks_total", "Relay ticks by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(ticks_total.clone()))?;

        let entries_uploaded_total = IntCounter::new(
            "entries_uploaded_total",
            "Entries accepted by the Nightscout sink",
        )?;
        registry.register(Box::new(entries_uploaded_total.clone()))?;

        Ok(Self {
            registry,
            glucose_value,
            glucose_trend,
            glucose_high,
            glucose_low,
            ticks_total,
            entries_uploaded_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Mirror the current reading onto the glucose gauges.
    ///
    /// A missing trend code leaves the trend gauge at its previous value.
    pub fn observe_reading(&self, reading: &GlucoseReading) {
        self.glucose_value.set(reading.value);
        if let Some(code) = reading.trend_arrow {
            self.glucose_trend.set(code as f64);
        }
        self.glucose_high.set(flag(reading.is_high));
        self.glucose_low.set(flag(reading.is_low));
    }

    /// Record a tick outcome.
    pub fn record_tick(&self, outcome: &str) {
        self.ticks_total.with_label_values(&[outcome]).inc();
    }

    /// Record entries accepted by the sink.
    pub fn record_uploaded(&self, count: usize) {
        self.entries_uploaded_total.inc_by(count as u64);
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
