//! Simulated OV7670: timing generator and register file.

use super::fifo::{SimFifo, SimPin};
use super::pattern::encode_row;
use crate::decode::PixelFormat;
use crate::sensor::registers::{COM7_RESET, REG_COM7};
use crate::sensor::{ControlBus, SensorError};
use crate::sync::EdgeSynchronizer;
use embedded_hal::digital::{OutputPin, PinState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Drives VSYNC/HREF edges and writes pixel rows into a [`SimFifo`].
///
/// Each call to [`run_frame`](Self::run_frame) is one full frame period:
/// a frame edge, then `height` line edges each followed by that line's
/// bytes, which the FIFO keeps only while the write gate is open.
#[derive(Debug)]
pub struct SimSensor {
    fifo: SimFifo,
    wen: SimPin,
    format: PixelFormat,
    width: usize,
    height: usize,
    frames: u64,
}

impl SimSensor {
    /// Creates a sensor writing `width` x `height` frames of `format` into `fifo`.
    pub fn new(fifo: SimFifo, format: PixelFormat, width: usize, height: usize) -> Self {
        let wen = fifo.wen();
        Self {
            fifo,
            wen,
            format,
            width,
            height,
            frames: 0,
        }
    }

    /// Frames emitted so far; also the pattern offset of the next frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Emits one frame period.
    pub fn run_frame(&mut self, sync: &EdgeSynchronizer) {
        self.frame_edge(sync);
        for y in 0..self.height {
            sync.on_line_edge();
            let row = encode_row(self.format, self.width, y, self.frames);
            self.fifo.write(&row);
        }
        self.frames += 1;
    }

    /// Emits a frame edge with no lines after it, as a stalled sensor would.
    pub fn frame_edge(&mut self, sync: &EdgeSynchronizer) {
        let gate = sync.on_frame_edge();
        // SimPin cannot fail.
        let _ = self.wen.set_state(PinState::from(gate.is_open()));
        self.fifo.reset_write_pointer();
        tracing::trace!(gate = ?gate, "frame edge");
    }

    /// Runs frames on a background thread until `stop` is set.
    pub fn spawn(
        mut self,
        sync: Arc<EdgeSynchronizer>,
        frame_period: Duration,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<Self> {
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                self.run_frame(&sync);
                thread::sleep(frame_period);
            }
            self
        })
    }
}

/// Register file answering like the sensor's control port.
///
/// A write of the reset bit to COM7 restores the identification
/// registers and clears everything else.
#[derive(Debug, Clone)]
pub struct SimRegisters {
    regs: [u8; 256],
    writes: usize,
}

impl Default for SimRegisters {
    fn default() -> Self {
        let mut regs = Self {
            regs: [0; 256],
            writes: 0,
        };
        regs.power_on();
        regs
    }
}

impl SimRegisters {
    /// Creates a register file in its power-on state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register writes received.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn power_on(&mut self) {
        self.regs = [0; 256];
        // PID, VER, MIDH, MIDL
        self.regs[0x0a] = 0x76;
        self.regs[0x0b] = 0x73;
        self.regs[0x1c] = 0x7f;
        self.regs[0x1d] = 0xa2;
    }
}

impl ControlBus for SimRegisters {
    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
        self.writes += 1;
        if addr == REG_COM7 && value & COM7_RESET != 0 {
            self.power_on();
            return Ok(());
        }
        self.regs[usize::from(addr)] = value;
        Ok(())
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, SensorError> {
        Ok(self.regs[usize::from(addr)])
    }

    fn wait_ms(&mut self, _ms: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Ov7670, Resolution};
    use crate::sync::CaptureState;

    #[test]
    fn test_frames_only_stored_when_armed() {
        let sync = EdgeSynchronizer::new();
        let fifo = SimFifo::new();
        let mut sensor = SimSensor::new(fifo.clone(), PixelFormat::Bayer, 4, 2);

        sensor.run_frame(&sync);
        assert!(!fifo.write_enabled());
        assert_eq!(fifo.contents(0, 8), vec![0; 8]);

        assert!(sync.request_capture());
        sensor.run_frame(&sync);
        assert_eq!(sync.state(), CaptureState::Capturing);
        assert_eq!(fifo.write_pointer(), 8);

        sensor.frame_edge(&sync);
        assert_eq!(sync.state(), CaptureState::Ready);
        assert!(!fifo.write_enabled());
        assert_eq!(sync.last_line_count(), 2);
        assert_eq!(fifo.contents(0, 4), encode_row(PixelFormat::Bayer, 4, 0, 1));
    }

    #[test]
    fn test_background_thread_produces_frames() {
        let sync = Arc::new(EdgeSynchronizer::new());
        let stop = Arc::new(AtomicBool::new(false));
        let sensor = SimSensor::new(SimFifo::new(), PixelFormat::Rgb565, 8, 4);
        let handle = sensor.spawn(Arc::clone(&sync), Duration::from_millis(1), Arc::clone(&stop));

        while sync.frames_observed() < 3 {
            thread::yield_now();
        }
        stop.store(true, Ordering::Relaxed);
        let sensor = handle.join().unwrap();
        assert!(sensor.frames() >= 3);
    }

    #[test]
    fn test_register_file_reset_and_configure() {
        let mut sensor = Ov7670::new(SimRegisters::new());
        sensor.bus_mut().write_reg(0x55, 0x12).unwrap();
        sensor
            .configure(PixelFormat::Yuv422, Resolution::Qqvga160x120)
            .unwrap();
        let dump = sensor.dump_registers().unwrap();
        assert_eq!(dump.get(0x0a), Some(0x76));
        assert_eq!(dump.get(0x1d), Some(0xa2));
        // Cleared by the reset.
        assert_eq!(dump.get(0x55), Some(0x00));
        // COM14 from the QQVGA window table.
        assert_eq!(dump.get(0x3e), Some(0x1a));
    }
}
