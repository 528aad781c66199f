//! Read clock generation and the drain sequence.

use super::bus::DataBus;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorKind, OutputPin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the FIFO channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FifoError {
    #[error("no drain in progress")]
    NotDraining,
    #[error("a drain is already in progress")]
    AlreadyDraining,
    #[error("read past the end of the frame ({expected} bytes)")]
    Overrun { expected: usize },
    #[error("drain ended after {read} of {expected} bytes")]
    Underrun { read: usize, expected: usize },
    #[error("control line error: {0:?}")]
    Pin(ErrorKind),
    #[error("data bus error: {0:?}")]
    Bus(ErrorKind),
}

/// Settling delays for the drain sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FifoTiming {
    /// Delay between transitions of the read-reset sequence, in ns.
    pub settle_ns: u32,
    /// Extra hold time with the clock high before sampling, in ns.
    pub sample_ns: u32,
}

impl Default for FifoTiming {
    fn default() -> Self {
        Self {
            settle_ns: 1_000,
            sample_ns: 0,
        }
    }
}

/// The FIFO control lines driven by the host.
///
/// All three are active low at the FIFO except the clock.
#[derive(Debug)]
pub struct FifoPins<Rrst, Oe, Rclk> {
    /// Read reset (/RRST).
    pub rrst: Rrst,
    /// Output enable (/OE).
    pub oe: Oe,
    /// Read clock (RCK).
    pub rclk: Rclk,
}

/// Position within the current drain.
#[derive(Debug, Clone, Copy)]
struct ByteCursor {
    position: usize,
    len: usize,
}

/// Drains a captured frame out of the FIFO one byte at a time.
///
/// Call [`begin_drain`](Self::begin_drain) only after the edge
/// synchronizer reported a completed frame, then
/// [`read_byte`](Self::read_byte) exactly `byte_count` times, then
/// [`end_drain`](Self::end_drain). Bytes come out in strictly increasing
/// FIFO order; nothing is buffered.
pub struct FifoChannel<Rrst, Oe, Rclk, B, D> {
    pins: FifoPins<Rrst, Oe, Rclk>,
    bus: B,
    delay: D,
    timing: FifoTiming,
    cursor: Option<ByteCursor>,
}

impl<Rrst, Oe, Rclk, B, D> FifoChannel<Rrst, Oe, Rclk, B, D>
where
    Rrst: OutputPin,
    Oe: OutputPin,
    Rclk: OutputPin,
    B: DataBus,
    D: DelayNs,
{
    /// Takes ownership of the lines and parks them at their idle levels
    /// (reset released, output disabled, clock high).
    pub fn new(
        mut pins: FifoPins<Rrst, Oe, Rclk>,
        bus: B,
        delay: D,
        timing: FifoTiming,
    ) -> Result<Self, FifoError> {
        pins.rrst.set_high().map_err(pin_error)?;
        pins.oe.set_high().map_err(pin_error)?;
        pins.rclk.set_high().map_err(pin_error)?;
        Ok(Self {
            pins,
            bus,
            delay,
            timing,
            cursor: None,
        })
    }

    /// Realigns the FIFO read pointer to the first byte of the frame and
    /// opens a drain window of exactly `byte_count` bytes.
    pub fn begin_drain(&mut self, byte_count: usize) -> Result<(), FifoError> {
        if self.cursor.is_some() {
            return Err(FifoError::AlreadyDraining);
        }

        self.pins.rrst.set_low().map_err(pin_error)?;
        self.pins.oe.set_low().map_err(pin_error)?;
        self.delay.delay_ns(self.timing.settle_ns);
        self.pins.rclk.set_low().map_err(pin_error)?;
        self.delay.delay_ns(self.timing.settle_ns);
        // Rising edge with RRST low resets the read pointer.
        self.pins.rclk.set_high().map_err(pin_error)?;
        self.delay.delay_ns(self.timing.settle_ns);
        self.pins.rrst.set_high().map_err(pin_error)?;

        self.cursor = Some(ByteCursor {
            position: 0,
            len: byte_count,
        });
        tracing::debug!(byte_count, "FIFO drain started");
        Ok(())
    }

    /// Clocks out the next byte.
    pub fn read_byte(&mut self) -> Result<u8, FifoError> {
        let cursor = self.cursor.as_mut().ok_or(FifoError::NotDraining)?;
        if cursor.position >= cursor.len {
            return Err(FifoError::Overrun {
                expected: cursor.len,
            });
        }

        self.pins.rclk.set_high().map_err(pin_error)?;
        if self.timing.sample_ns > 0 {
            self.delay.delay_ns(self.timing.sample_ns);
        }
        let byte = self.bus.sample().map_err(|e| FifoError::Bus(e.kind()))?;
        self.pins.rclk.set_low().map_err(pin_error)?;

        cursor.position += 1;
        Ok(byte)
    }

    /// Fills `buf` with the next `buf.len()` bytes.
    ///
    /// Fails up front, without clocking, if the buffer would run past the
    /// end of the drain window.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), FifoError> {
        let cursor = self.cursor.as_ref().ok_or(FifoError::NotDraining)?;
        if buf.len() > cursor.len - cursor.position {
            return Err(FifoError::Overrun {
                expected: cursor.len,
            });
        }
        for slot in buf.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Disables the output, leaves the bus idle and closes the drain.
    ///
    /// The lines are restored even when the drain was short; the shortfall
    /// is then reported as [`FifoError::Underrun`] and the FIFO contents
    /// for this frame should be discarded.
    pub fn end_drain(&mut self) -> Result<(), FifoError> {
        let cursor = self.cursor.take().ok_or(FifoError::NotDraining)?;

        self.pins.oe.set_high().map_err(pin_error)?;
        self.pins.rclk.set_high().map_err(pin_error)?;
        self.pins.rclk.set_low().map_err(pin_error)?;
        self.pins.rclk.set_high().map_err(pin_error)?;

        tracing::debug!(read = cursor.position, expected = cursor.len, "FIFO drain ended");
        if cursor.position < cursor.len {
            return Err(FifoError::Underrun {
                read: cursor.position,
                expected: cursor.len,
            });
        }
        Ok(())
    }

    /// Returns true while a drain window is open.
    #[inline]
    pub fn is_draining(&self) -> bool {
        self.cursor.is_some()
    }

    /// Bytes still expected in the current drain, zero when idle.
    pub fn remaining(&self) -> usize {
        self.cursor.map_or(0, |c| c.len - c.position)
    }

    /// Returns the timing in use.
    pub fn timing(&self) -> FifoTiming {
        self.timing
    }

    /// Releases the owned hardware.
    pub fn release(self) -> (FifoPins<Rrst, Oe, Rclk>, B, D) {
        (self.pins, self.bus, self.delay)
    }
}

fn pin_error<E: embedded_hal::digital::Error>(e: E) -> FifoError {
    FifoError::Pin(e.kind())
}
