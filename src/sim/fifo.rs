//! AL422B FIFO model.
//!
//! Writes land at the write pointer while WEN is high. The read pointer
//! moves on each rising edge of RCLK, or returns to zero when RRST is low
//! at that edge. Data is only driven while /OE is low.

use crate::capture::FIFO_CAPACITY;
use crate::fifo::DataBus;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct FifoModel {
    memory: Vec<u8>,
    write_ptr: usize,
    read_ptr: usize,
    write_enabled: bool,
    rrst_low: bool,
    oe_low: bool,
    rclk_high: bool,
    rclk_edges: u64,
}

impl FifoModel {
    fn new() -> Self {
        Self {
            memory: vec![0; FIFO_CAPACITY],
            write_ptr: 0,
            read_ptr: 0,
            write_enabled: false,
            rrst_low: false,
            oe_low: false,
            rclk_high: true,
            rclk_edges: 0,
        }
    }

    fn set_rclk(&mut self, high: bool) {
        if high && !self.rclk_high {
            self.rclk_edges += 1;
            if self.rrst_low {
                self.read_ptr = 0;
            } else {
                self.read_ptr = (self.read_ptr + 1) % self.memory.len();
            }
        }
        self.rclk_high = high;
    }
}

/// Shared handle to a simulated FIFO.
#[derive(Debug, Clone)]
pub struct SimFifo {
    model: Arc<Mutex<FifoModel>>,
}

impl Default for SimFifo {
    fn default() -> Self {
        Self::new()
    }
}

impl SimFifo {
    /// Creates an empty FIFO with writes disabled and the read lines idle.
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(FifoModel::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FifoModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the write pointer to the start, as VSYNC does on /WRST.
    pub fn reset_write_pointer(&self) {
        self.lock().write_ptr = 0;
    }

    /// Stores `bytes` if the write gate is open. Returns the bytes stored.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let mut model = self.lock();
        if !model.write_enabled {
            return 0;
        }
        let len = model.memory.len();
        for &byte in bytes {
            let at = model.write_ptr;
            model.memory[at] = byte;
            model.write_ptr = (at + 1) % len;
        }
        bytes.len()
    }

    /// Level of the write gate.
    pub fn write_enabled(&self) -> bool {
        self.lock().write_enabled
    }

    /// Next write position.
    pub fn write_pointer(&self) -> usize {
        self.lock().write_ptr
    }

    /// Next read position.
    pub fn read_pointer(&self) -> usize {
        self.lock().read_ptr
    }

    /// Rising RCLK edges seen so far.
    pub fn clock_edges(&self) -> u64 {
        self.lock().rclk_edges
    }

    /// Copy of `len` stored bytes starting at `offset`.
    pub fn contents(&self, offset: usize, len: usize) -> Vec<u8> {
        let model = self.lock();
        let end = (offset + len).min(model.memory.len());
        model.memory[offset.min(end)..end].to_vec()
    }

    /// Write-enable line, driven by the sensor side.
    pub fn wen(&self) -> SimPin {
        self.pin(Line::Wen)
    }

    /// Read-reset line.
    pub fn rrst(&self) -> SimPin {
        self.pin(Line::Rrst)
    }

    /// Output-enable line, active low.
    pub fn oe(&self) -> SimPin {
        self.pin(Line::Oe)
    }

    /// Read clock.
    pub fn rclk(&self) -> SimPin {
        self.pin(Line::Rclk)
    }

    /// The D0..D7 output bus.
    pub fn data_bus(&self) -> SimBus {
        SimBus { fifo: self.clone() }
    }

    fn pin(&self, line: Line) -> SimPin {
        SimPin {
            fifo: self.clone(),
            line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Wen,
    Rrst,
    Oe,
    Rclk,
}

/// One control input of the simulated FIFO.
#[derive(Debug, Clone)]
pub struct SimPin {
    fifo: SimFifo,
    line: Line,
}

impl SimPin {
    fn drive(&mut self, high: bool) {
        let mut model = self.fifo.lock();
        match self.line {
            Line::Wen => model.write_enabled = high,
            Line::Rrst => model.rrst_low = !high,
            Line::Oe => model.oe_low = !high,
            Line::Rclk => model.set_rclk(high),
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Sampling the bus while /OE is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("FIFO output is disabled")]
pub struct OutputDisabled;

impl embedded_hal::digital::Error for OutputDisabled {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Data outputs of the simulated FIFO.
#[derive(Debug, Clone)]
pub struct SimBus {
    fifo: SimFifo,
}

impl ErrorType for SimBus {
    type Error = OutputDisabled;
}

impl DataBus for SimBus {
    fn sample(&mut self) -> Result<u8, Self::Error> {
        let model = self.fifo.lock();
        if !model.oe_low {
            return Err(OutputDisabled);
        }
        Ok(model.memory[model.read_ptr])
    }
}
