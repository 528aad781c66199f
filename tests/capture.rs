//! End-to-end captures against the simulated camera module.

use ov7670_fifo::capture::{CaptureConfig, CaptureSession};
use ov7670_fifo::decode::{decode_scanline, PixelFormat, Rgb8};
use ov7670_fifo::fifo::{FifoChannel, FifoPins, FifoTiming};
use ov7670_fifo::sensor::Resolution;
use ov7670_fifo::sim::{bar_color, encode_row, NoDelay, SimBus, SimFifo, SimPin, SimSensor};
use ov7670_fifo::sink::{BmpFileSink, MemorySink};
use ov7670_fifo::sync::{CaptureState, EdgeSynchronizer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn channel(fifo: &SimFifo) -> FifoChannel<SimPin, SimPin, SimPin, SimBus, NoDelay> {
    let pins = FifoPins {
        rrst: fifo.rrst(),
        oe: fifo.oe(),
        rclk: fifo.rclk(),
    };
    FifoChannel::new(pins, fifo.data_bus(), NoDelay, FifoTiming::default()).unwrap()
}

fn config(format: PixelFormat, resolution: Resolution) -> CaptureConfig {
    CaptureConfig {
        timeout_ms: 5_000,
        poll_interval_us: 50,
        ..CaptureConfig::new(format, resolution)
    }
}

#[test]
fn test_threaded_capture_every_format() {
    for format in PixelFormat::ALL {
        let resolution = Resolution::Qqvga160x120;
        let (width, height) = resolution.dimensions();

        let sync = Arc::new(EdgeSynchronizer::new());
        let fifo = SimFifo::new();
        let stop = Arc::new(AtomicBool::new(false));
        let module = SimSensor::new(fifo.clone(), format, width, height).spawn(
            Arc::clone(&sync),
            Duration::from_millis(1),
            Arc::clone(&stop),
        );

        let mut session = CaptureSession::new(&sync, channel(&fifo), config(format, resolution))
            .unwrap();
        let mut sink = MemorySink::new();
        let first = session.capture(&mut sink).unwrap();
        let second = session.capture(&mut sink).unwrap();

        stop.store(true, Ordering::Relaxed);
        module.join().unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.rows_written, height, "{format}");
        assert_eq!(first.line_count as usize, height, "{format}");
        assert_eq!(first.bytes_drained, format.row_bytes(width) * height);
        assert_eq!(session.stats().frames_captured, 2);
        assert_eq!(sync.state(), CaptureState::Idle);

        let frames = sink.frames();
        assert_eq!(frames.len(), 2);
        for image in frames {
            assert_eq!((image.width(), image.height()), (width, height));
            // Every row of a frame shows the same bars.
            assert_eq!(image.row(0), image.row(height / 2), "{format}");
        }
    }
}

#[test]
fn test_packed_frame_matches_sensor_output() {
    let format = PixelFormat::Rgb555;
    let (width, height) = Resolution::Qvga320x240.dimensions();

    let sync = EdgeSynchronizer::new();
    let fifo = SimFifo::new();
    let mut sensor = SimSensor::new(fifo.clone(), format, width, height);
    let mut session =
        CaptureSession::new(&sync, channel(&fifo), config(format, Resolution::Qvga320x240))
            .unwrap();

    // Two idle frames first: the stored frame must be the one after the request.
    sensor.run_frame(&sync);
    sensor.run_frame(&sync);
    session.arm();
    let pattern_frame = sensor.frames();
    sensor.run_frame(&sync);
    sensor.run_frame(&sync);

    let mut sink = MemorySink::new();
    assert_eq!(session.wait_ready().unwrap(), height as u32);
    session.drain_frame(&mut sink).unwrap();
    let image = sink.take_last().unwrap();

    let expected = decode_scanline(&encode_row(format, width, 0, pattern_frame), format, width)
        .unwrap();
    for y in [0, 1, height - 1] {
        assert_eq!(image.row(y).unwrap(), expected.as_slice());
    }
}

#[test]
fn test_bayer_vga_frame_to_bmp_file() {
    let format = PixelFormat::Bayer;
    let resolution = Resolution::Vga640x480;
    let (width, height) = resolution.dimensions();
    let dir = tempfile::tempdir().unwrap();

    let sync = EdgeSynchronizer::new();
    let fifo = SimFifo::new();
    let mut sensor = SimSensor::new(fifo.clone(), format, width, height);
    let mut session =
        CaptureSession::new(&sync, channel(&fifo), config(format, resolution)).unwrap();
    let mut sink = BmpFileSink::new(dir.path()).unwrap();

    session.arm();
    sensor.run_frame(&sync);
    sensor.frame_edge(&sync);
    session.wait_ready().unwrap();
    assert_eq!(session.drain_frame(&mut sink).unwrap(), height);

    let bytes = std::fs::read(sink.last_path().unwrap()).unwrap();
    let stride = width * 3;
    assert_eq!(bytes.len(), 54 + stride * height);

    // Interior of the first bar is white; the last column is black.
    let row = &bytes[54 + stride * 10..54 + stride * 11];
    assert_eq!(&row[30..33], &[255, 255, 255]);
    assert_eq!(bar_color(10, width, 0), Rgb8::new(255, 255, 255));
    assert_eq!(&row[stride - 3..], &[0, 0, 0]);
}

#[test]
fn test_stalled_sensor_times_out() {
    let format = PixelFormat::Rgb565;
    let sync = EdgeSynchronizer::new();
    let fifo = SimFifo::new();
    let mut session = CaptureSession::new(
        &sync,
        channel(&fifo),
        CaptureConfig {
            timeout_ms: 10,
            ..config(format, Resolution::Qqvga160x120)
        },
    )
    .unwrap();

    assert!(session.capture(&mut MemorySink::new()).is_err());
    assert_eq!(session.stats().timeouts, 1);
    // The request stays pending for the next frame.
    assert_eq!(sync.state(), CaptureState::Armed);
}
