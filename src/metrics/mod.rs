//! Prometheus metrics for capture monitoring.
//!
//! # Metrics Exposed
//!
//! - `ov7670_frames_captured_total` - Frames drained, decoded and stored
//! - `ov7670_capture_timeouts_total` - Captures with no frame before the deadline
//! - `ov7670_capture_failures_total` - Captures that failed after the frame was ready
//! - `ov7670_fifo_bytes_drained_total` - Bytes clocked out of the FIFO
//! - `ov7670_last_line_count` - Line edges counted in the most recent frame
//! - `ov7670_last_capture_seconds` - Duration of the most recent capture
//!
//! The HTTP exporter needs the `metrics` feature.
//!
//! # Example
//!
//! ```no_run
//! use ov7670_fifo::capture::CaptureStats;
//! use ov7670_fifo::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let stats = CaptureStats::default();
//! registry.update(&MetricsSnapshot::from(&stats));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
