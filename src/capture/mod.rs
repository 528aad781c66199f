//! Frame capture: configuration and the request/drain/decode session.
//!
//! A session owns the FIFO channel and shares the edge synchronizer with
//! whatever services the VSYNC and HREF interrupts. Frames go to any
//! [`FrameSink`](crate::sink::FrameSink).

mod config;
mod session;

pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig, FIFO_CAPACITY};
pub use session::{CaptureError, CaptureReport, CaptureSession, CaptureStats};
