//! Metrics collection and registry.

use crate::capture::CaptureStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of capture totals for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames stored successfully.
    pub frames_captured: u64,
    /// Captures that saw no frame before the deadline.
    pub timeouts: u64,
    /// Captures that failed during drain, decode or storage.
    pub failures: u64,
    /// Total bytes clocked out of the FIFO.
    pub bytes_drained: u64,
    /// Line edges counted in the most recent frame.
    pub last_line_count: u32,
    /// Duration of the most recent capture in seconds.
    pub last_capture_seconds: Option<f64>,
}

impl From<&CaptureStats> for MetricsSnapshot {
    fn from(stats: &CaptureStats) -> Self {
        Self {
            frames_captured: stats.frames_captured,
            timeouts: stats.timeouts,
            failures: stats.failures,
            bytes_drained: stats.bytes_drained,
            last_line_count: stats.last_line_count,
            last_capture_seconds: stats.last_duration.map(|d| d.as_secs_f64()),
        }
    }
}

/// Prometheus metrics registry for capture monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    frames_captured: IntCounter,
    timeouts: IntCounter,
    failures: IntCounter,
    bytes_drained: IntCounter,

    last_line_count: IntGauge,
    last_capture_seconds: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_captured = IntCounter::new(
            "ov7670_frames_captured_total",
            "Frames drained, decoded and stored",
        )?;
        let timeouts = IntCounter::new(
            "ov7670_capture_timeouts_total",
            "Captures with no frame before the deadline",
        )?;
        let failures = IntCounter::new(
            "ov7670_capture_failures_total",
            "Captures that failed after the frame was ready",
        )?;
        let bytes_drained = IntCounter::new(
            "ov7670_fifo_bytes_drained_total",
            "Bytes clocked out of the FIFO",
        )?;
        let last_line_count = IntGauge::new(
            "ov7670_last_line_count",
            "Line edges counted in the most recent frame",
        )?;
        let last_capture_seconds = Gauge::new(
            "ov7670_last_capture_seconds",
            "Duration of the most recent capture",
        )?;

        registry.register(Box::new(frames_captured.clone()))?;
        registry.register(Box::new(timeouts.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(bytes_drained.clone()))?;
        registry.register(Box::new(last_line_count.clone()))?;
        registry.register(Box::new(last_capture_seconds.clone()))?;

        Ok(Self {
            registry,
            frames_captured,
            timeouts,
            failures,
            bytes_drained,
            last_line_count,
            last_capture_seconds,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference.
        advance(&self.frames_captured, snapshot.frames_captured);
        advance(&self.timeouts, snapshot.timeouts);
        advance(&self.failures, snapshot.failures);
        advance(&self.bytes_drained, snapshot.bytes_drained);

        self.last_line_count.set(i64::from(snapshot.last_line_count));
        if let Some(seconds) = snapshot.last_capture_seconds {
            self.last_capture_seconds.set(seconds);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
