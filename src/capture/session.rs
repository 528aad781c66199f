//! One capture, end to end.
//!
//! ```text
//! request_capture → poll until Ready → begin_drain
//!     → (read row → decode → sink) × height → end_drain
//! ```

use super::config::{CaptureConfig, ConfigError};
use crate::decode::{DecodeError, PixelDecoder, PixelFormat, Rgb8};
use crate::fifo::{DataBus, FifoChannel, FifoError};
use crate::sensor::SensorError;
use crate::sink::{FrameSink, SinkError};
use crate::sync::EdgeSynchronizer;
use chrono::{DateTime, Local};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur during a capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("FIFO error: {0}")]
    Fifo(#[from] FifoError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),
    #[error("no frame within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("capture aborted")]
    Aborted,
    #[error("could not allocate {bytes} bytes of scanline buffers")]
    Allocation { bytes: usize },
}

/// Summary of one captured frame.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    /// 1-based frame number within the session.
    pub sequence: u64,
    /// Pixel format the frame was captured in.
    pub format: PixelFormat,
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Bytes clocked out of the FIFO.
    pub bytes_drained: usize,
    /// Scanlines handed to the sink.
    pub rows_written: usize,
    /// Line edges counted during the stored frame.
    pub line_count: u32,
    /// From the capture request to the end of the drain.
    pub elapsed: Duration,
    /// Wall-clock time the frame was stored.
    pub captured_at: DateTime<Local>,
}

/// Running totals for a session.
#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    /// Frames stored successfully.
    pub frames_captured: u64,
    /// Captures that saw no frame before the deadline.
    pub timeouts: u64,
    /// Captures that failed after the frame was ready.
    pub failures: u64,
    /// Bytes clocked out of the FIFO by successful captures.
    pub bytes_drained: u64,
    /// Line edges counted in the most recent stored frame.
    pub last_line_count: u32,
    /// Duration of the most recent successful capture.
    pub last_duration: Option<Duration>,
}

/// Captures frames from the FIFO into a [`FrameSink`].
///
/// Owns the FIFO channel and the decode buffers; borrows the edge
/// synchronizer, which the interrupt side shares.
pub struct CaptureSession<'a, Rrst, Oe, Rclk, B, D> {
    sync: &'a EdgeSynchronizer,
    fifo: FifoChannel<Rrst, Oe, Rclk, B, D>,
    config: CaptureConfig,
    decoder: PixelDecoder,
    raw: Vec<u8>,
    row: Vec<Rgb8>,
    abort: Option<Arc<AtomicBool>>,
    sequence: u64,
    stats: CaptureStats,
}

impl<'a, Rrst, Oe, Rclk, B, D> CaptureSession<'a, Rrst, Oe, Rclk, B, D>
where
    Rrst: OutputPin,
    Oe: OutputPin,
    Rclk: OutputPin,
    B: DataBus,
    D: DelayNs,
{
    /// Validates `config` and allocates one raw and one decoded row.
    pub fn new(
        sync: &'a EdgeSynchronizer,
        fifo: FifoChannel<Rrst, Oe, Rclk, B, D>,
        config: CaptureConfig,
    ) -> Result<Self, CaptureError> {
        config.validate()?;
        let (width, height) = config.dimensions();
        let decoder = PixelDecoder::new(config.format, width, height)?;

        let mut raw = Vec::new();
        raw.try_reserve_exact(decoder.row_bytes())
            .map_err(|_| CaptureError::Allocation {
                bytes: decoder.row_bytes(),
            })?;
        raw.resize(decoder.row_bytes(), 0);

        let mut row = Vec::new();
        row.try_reserve_exact(width)
            .map_err(|_| CaptureError::Allocation {
                bytes: width * std::mem::size_of::<Rgb8>(),
            })?;
        row.resize(width, Rgb8::BLACK);

        Ok(Self {
            sync,
            fifo,
            config,
            decoder,
            raw,
            row,
            abort: None,
            sequence: 0,
            stats: CaptureStats::default(),
        })
    }

    /// Stops waiting for a frame once `flag` is set.
    pub fn with_abort(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Running totals.
    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Requests the next frame. Returns false if one is already pending.
    pub fn arm(&self) -> bool {
        let armed = self.sync.request_capture();
        if !armed {
            tracing::debug!(state = ?self.sync.state(), "capture already pending");
        }
        armed
    }

    /// Polls until a requested frame is in the FIFO.
    ///
    /// Returns the number of lines the sensor produced for it.
    pub fn wait_ready(&mut self) -> Result<u32, CaptureError> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let interval = Duration::from_micros(self.config.poll_interval_us);
        let deadline = Instant::now() + timeout;

        loop {
            if self.sync.poll_capture_done() {
                return Ok(self.sync.captured_line_count());
            }
            if self.is_aborted() {
                return Err(CaptureError::Aborted);
            }
            if Instant::now() >= deadline {
                self.stats.timeouts += 1;
                tracing::warn!(
                    timeout_ms = self.config.timeout_ms,
                    state = ?self.sync.state(),
                    "no frame before deadline"
                );
                return Err(CaptureError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                });
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
    }

    /// Drains the frame now in the FIFO into `sink`.
    ///
    /// The FIFO lines are restored even if decoding or the sink fails, and
    /// a frame that cannot be completed is discarded from the sink.
    /// Returns the number of scanlines written.
    pub fn drain_frame<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<usize, CaptureError> {
        self.fifo.begin_drain(self.decoder.frame_bytes())?;
        let streamed = self.stream_rows(sink);
        let ended = self.fifo.end_drain();
        if streamed.is_err() {
            self.decoder.reset();
            sink.abort();
        }
        let rows = streamed?;
        ended?;
        Ok(rows)
    }

    fn stream_rows<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<usize, CaptureError> {
        sink.begin_frame(self.decoder.width(), self.decoder.height())?;
        let mut rows = 0;
        for _ in 0..self.decoder.height() {
            self.fifo.read_into(&mut self.raw)?;
            if self.decoder.decode_scanline(&self.raw, &mut self.row)? {
                sink.write_scanline(&self.row)?;
                rows += 1;
            }
        }
        if self.decoder.finish(&mut self.row)? {
            sink.write_scanline(&self.row)?;
            rows += 1;
        }
        sink.finish()?;
        Ok(rows)
    }

    /// Requests, waits for, and stores one frame.
    pub fn capture<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<CaptureReport, CaptureError> {
        let started = Instant::now();
        self.arm();
        let line_count = self.wait_ready()?;

        let (width, height) = self.config.dimensions();
        if line_count as usize != height {
            tracing::warn!(
                observed = line_count,
                expected = height,
                "line count differs from configured height"
            );
        }

        let rows_written = match self.drain_frame(sink) {
            Ok(rows) => rows,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };

        self.sequence += 1;
        let report = CaptureReport {
            sequence: self.sequence,
            format: self.config.format,
            width,
            height,
            bytes_drained: self.decoder.frame_bytes(),
            rows_written,
            line_count,
            elapsed: started.elapsed(),
            captured_at: Local::now(),
        };

        self.stats.frames_captured += 1;
        self.stats.bytes_drained += report.bytes_drained as u64;
        self.stats.last_line_count = line_count;
        self.stats.last_duration = Some(report.elapsed);

        tracing::info!(
            sequence = report.sequence,
            format = %report.format,
            width,
            height,
            bytes = report.bytes_drained,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "frame captured"
        );
        Ok(report)
    }

    fn is_aborted(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Returns the FIFO channel.
    pub fn into_fifo(self) -> FifoChannel<Rrst, Oe, Rclk, B, D> {
        self.fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo::{FifoPins, FifoTiming};
    use crate::sensor::Resolution;
    use crate::sim::{bar_color, NoDelay, OutputDisabled, SimBus, SimFifo, SimPin, SimSensor};
    use crate::sink::{BmpFileSink, MemorySink};

    type SimSession<'a> = CaptureSession<'a, SimPin, SimPin, SimPin, SimBus, NoDelay>;

    fn session<'a>(
        sync: &'a EdgeSynchronizer,
        fifo: &SimFifo,
        config: CaptureConfig,
    ) -> SimSession<'a> {
        let pins = FifoPins {
            rrst: fifo.rrst(),
            oe: fifo.oe(),
            rclk: fifo.rclk(),
        };
        let channel = FifoChannel::new(pins, fifo.data_bus(), NoDelay, FifoTiming::default()).unwrap();
        CaptureSession::new(sync, channel, config).unwrap()
    }

    fn quick(format: PixelFormat) -> CaptureConfig {
        CaptureConfig {
            timeout_ms: 20,
            poll_interval_us: 0,
            ..CaptureConfig::new(format, Resolution::Qqvga160x120)
        }
    }

    #[test]
    fn test_stepwise_capture() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Rgb565, 160, 120);
        let mut session = session(&sync, &fifo, quick(PixelFormat::Rgb565));
        let mut sink = MemorySink::new();

        assert!(session.arm());
        assert!(!session.arm());
        sensor.run_frame(&sync);
        sensor.frame_edge(&sync);

        assert_eq!(session.wait_ready().unwrap(), 120);
        assert_eq!(session.drain_frame(&mut sink).unwrap(), 120);

        let image = sink.take_last().unwrap();
        assert_eq!(image.height(), 120);
        // The stored frame was the sensor's first one.
        assert_eq!(image.pixel(0, 0), Some(Rgb8::new(0xF8, 0xFC, 0xF8)));
        assert_eq!(image.pixel(159, 119), Some(bar_color(159, 160, 0)));
    }

    #[test]
    fn test_late_poll_reports_stored_frame_lines() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Rgb565, 160, 120);
        let mut session = session(&sync, &fifo, quick(PixelFormat::Rgb565));

        session.arm();
        sensor.run_frame(&sync);
        sensor.frame_edge(&sync);
        // A short idle frame completes before the poll.
        for _ in 0..7 {
            sync.on_line_edge();
        }
        sync.on_frame_edge();
        assert_eq!(sync.last_line_count(), 7);

        assert_eq!(session.wait_ready().unwrap(), 120);
    }

    #[test]
    fn test_timeout_without_frames() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut session = session(&sync, &fifo, quick(PixelFormat::Yuv422));

        let result = session.capture(&mut MemorySink::new());
        assert!(matches!(result, Err(CaptureError::Timeout { timeout_ms: 20 })));
        assert_eq!(session.stats().timeouts, 1);
        assert_eq!(fifo.clock_edges(), 0);
    }

    #[test]
    fn test_abort_flag() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let abort = Arc::new(AtomicBool::new(true));
        let config = CaptureConfig {
            timeout_ms: 60_000,
            ..quick(PixelFormat::Rgb444)
        };
        let mut session = session(&sync, &fifo, config).with_abort(abort);
        assert!(matches!(
            session.capture(&mut MemorySink::new()),
            Err(CaptureError::Aborted)
        ));
    }

    #[test]
    fn test_sink_failure_restores_fifo_lines() {
        struct FailingSink;
        impl FrameSink for FailingSink {
            fn begin_frame(&mut self, _: usize, _: usize) -> Result<(), SinkError> {
                Ok(())
            }
            fn write_scanline(&mut self, _: &[Rgb8]) -> Result<(), SinkError> {
                Err(SinkError::NoFrame)
            }
            fn finish(&mut self) -> Result<(), SinkError> {
                Ok(())
            }
            fn abort(&mut self) {}
        }

        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Bayer, 160, 120);
        let mut session = session(&sync, &fifo, quick(PixelFormat::Bayer));

        session.arm();
        sensor.run_frame(&sync);
        sensor.frame_edge(&sync);
        session.wait_ready().unwrap();
        assert!(matches!(
            session.drain_frame(&mut FailingSink),
            Err(CaptureError::Sink(SinkError::NoFrame))
        ));

        // The channel is idle again and the next frame drains normally.
        session.arm();
        sensor.run_frame(&sync);
        sensor.frame_edge(&sync);
        let mut sink = MemorySink::new();
        session.wait_ready().unwrap();
        assert_eq!(session.drain_frame(&mut sink).unwrap(), 120);
        assert!(session.into_fifo().release().1.sample().is_err());
    }

    /// Bus that stops answering after a number of samples.
    struct FailingBus {
        inner: SimBus,
        remaining: usize,
    }

    impl embedded_hal::digital::ErrorType for FailingBus {
        type Error = OutputDisabled;
    }

    impl DataBus for FailingBus {
        fn sample(&mut self) -> Result<u8, Self::Error> {
            if self.remaining == 0 {
                return Err(OutputDisabled);
            }
            self.remaining -= 1;
            self.inner.sample()
        }
    }

    #[test]
    fn test_bus_failure_discards_stored_frame() {
        let dir = tempfile::tempdir().unwrap();
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Rgb565, 160, 120);
        let pins = FifoPins {
            rrst: fifo.rrst(),
            oe: fifo.oe(),
            rclk: fifo.rclk(),
        };
        // Ten rows arrive, then the bus fails.
        let bus = FailingBus {
            inner: fifo.data_bus(),
            remaining: 10 * 160 * 2,
        };
        let channel = FifoChannel::new(pins, bus, NoDelay, FifoTiming::default()).unwrap();
        let mut session = CaptureSession::new(&sync, channel, quick(PixelFormat::Rgb565)).unwrap();
        let mut sink = BmpFileSink::new(dir.path()).unwrap();

        session.arm();
        sensor.run_frame(&sync);
        sensor.frame_edge(&sync);
        session.wait_ready().unwrap();
        assert!(matches!(
            session.drain_frame(&mut sink),
            Err(CaptureError::Fifo(FifoError::Bus(_)))
        ));

        assert!(sink.written().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(!session.fifo.is_draining());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let pins = FifoPins {
            rrst: fifo.rrst(),
            oe: fifo.oe(),
            rclk: fifo.rclk(),
        };
        let channel = FifoChannel::new(pins, fifo.data_bus(), NoDelay, FifoTiming::default()).unwrap();
        let config = CaptureConfig::new(PixelFormat::Rgb565, Resolution::Vga640x480);
        assert!(matches!(
            CaptureSession::new(&sync, channel, config),
            Err(CaptureError::Config(ConfigError::ExceedsFifo { .. }))
        ));
    }
}
