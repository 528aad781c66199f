//! OV7670 + AL422 FIFO camera capture library
//!
//! Captures frames from an OV7670 image sensor whose parallel output is
//! buffered in an AL422 frame FIFO, decodes them to RGB888 and hands the
//! scanlines to a sink.
//!
//! # Architecture
//!
//! ```text
//! VSYNC/HREF edges → sync ─┐
//!                          ├→ capture session → fifo drain → decode → sink
//! sensor (SCCB config) ────┘
//! ```
//!
//! The edge handlers only touch [`sync::EdgeSynchronizer`], a lock-free
//! state record. Everything else runs in the foreground loop: wait for a
//! completed frame, clock it out of the FIFO byte by byte, decode one
//! scanline at a time.
//!
//! # Example
//!
//! ```no_run
//! use ov7670_fifo::{
//!     capture::{CaptureConfig, CaptureSession},
//!     decode::PixelFormat,
//!     fifo::{FifoChannel, FifoPins, FifoTiming},
//!     sensor::Resolution,
//!     sim::{NoDelay, SimFifo, SimSensor},
//!     sink::MemorySink,
//!     sync::EdgeSynchronizer,
//! };
//!
//! let sync = EdgeSynchronizer::new();
//! let fifo = SimFifo::new();
//! let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Rgb565, 320, 240);
//!
//! let pins = FifoPins { rrst: fifo.rrst(), oe: fifo.oe(), rclk: fifo.rclk() };
//! let channel = FifoChannel::new(pins, fifo.data_bus(), NoDelay, FifoTiming::default()).unwrap();
//! let config = CaptureConfig::new(PixelFormat::Rgb565, Resolution::Qvga320x240);
//! let mut session = CaptureSession::new(&sync, channel, config).unwrap();
//!
//! // Normally the interrupt side drives these edges.
//! session.arm();
//! sensor.run_frame(&sync);
//! sensor.frame_edge(&sync);
//!
//! let mut sink = MemorySink::new();
//! session.wait_ready().unwrap();
//! session.drain_frame(&mut sink).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod decode;
pub mod fifo;
pub mod metrics;
pub mod sensor;
pub mod sim;
pub mod sink;
pub mod sync;

// Re-export commonly used types at crate root
pub use capture::{CaptureConfig, CaptureError, CaptureReport, CaptureSession, FileConfig};
pub use decode::{PixelDecoder, PixelFormat, Rgb8};
pub use fifo::{FifoChannel, FifoPins, FifoTiming};
pub use sensor::{Ov7670, Resolution, Sccb};
pub use sink::{BmpFileSink, FrameSink, MemorySink};
pub use sync::{CaptureState, EdgeSynchronizer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
