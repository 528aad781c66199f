//! SCCB control channel.
//!
//! SCCB is an I2C-compatible two-wire bus. The OV7670 answers at 0x42
//! (write) / 0x43 (read), i.e. 7-bit address 0x21. Reads are a write of
//! the register address, a stop, then a one-byte read; the sensor does
//! not support repeated start.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use thiserror::Error;

/// 7-bit bus address of the OV7670.
pub const OV7670_ADDRESS: u8 = 0x42 >> 1;

/// Minimum pause between bus phases, in microseconds.
pub const PHASE_DELAY_US: u32 = 20;

/// Errors from the control channel or the sensor behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("control bus error: {0:?}")]
    Bus(ErrorKind),
    #[error("register {addr:#04x} reads {actual:#04x}, expected {expected:#04x}")]
    Verify { addr: u8, expected: u8, actual: u8 },
}

/// Register-level access to the sensor.
pub trait ControlBus {
    /// Writes one register.
    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError>;

    /// Reads one register.
    fn read_reg(&mut self, addr: u8) -> Result<u8, SensorError>;

    /// Blocks for at least `ms` milliseconds.
    fn wait_ms(&mut self, ms: u32);
}

impl<T: ControlBus + ?Sized> ControlBus for &mut T {
    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
        T::write_reg(self, addr, value)
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, SensorError> {
        T::read_reg(self, addr)
    }

    fn wait_ms(&mut self, ms: u32) {
        T::wait_ms(self, ms)
    }
}

/// SCCB master over an I2C peripheral.
///
/// Every transaction is followed by [`PHASE_DELAY_US`]; register access
/// is never treated as instantaneous.
#[derive(Debug)]
pub struct Sccb<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Sccb<I, D> {
    /// Creates a channel to the sensor at its default address.
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, OV7670_ADDRESS)
    }

    /// Creates a channel to a sensor at a non-default 7-bit address.
    pub fn with_address(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Releases the bus and delay.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

impl<I: I2c, D: DelayNs> ControlBus for Sccb<I, D> {
    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[addr, value])
            .map_err(|e| SensorError::Bus(e.kind()))?;
        self.delay.delay_us(PHASE_DELAY_US);
        Ok(())
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, SensorError> {
        self.i2c
            .write(self.address, &[addr])
            .map_err(|e| SensorError::Bus(e.kind()))?;
        self.delay.delay_us(PHASE_DELAY_US);

        let mut value = [0u8];
        self.i2c
            .read(self.address, &mut value)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        self.delay.delay_us(PHASE_DELAY_US);
        Ok(value[0])
    }

    fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::i2c::{ErrorType, Operation};

    struct FakeI2c {
        regs: [u8; 256],
        pointer: u8,
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl Default for FakeI2c {
        fn default() -> Self {
            Self {
                regs: [0; 256],
                pointer: 0,
                writes: Vec::new(),
            }
        }
    }

    impl ErrorType for FakeI2c {
        type Error = Infallible;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.writes.push((address, bytes.to_vec()));
                        self.pointer = bytes[0];
                        if let Some(&value) = bytes.get(1) {
                            self.regs[usize::from(self.pointer)] = value;
                        }
                    }
                    Operation::Read(buf) => {
                        for slot in buf.iter_mut() {
                            *slot = self.regs[usize::from(self.pointer)];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_write_then_read() {
        let mut sccb = Sccb::new(FakeI2c::default(), CountingDelay::default());
        sccb.write_reg(0x12, 0x80).unwrap();
        assert_eq!(sccb.read_reg(0x12).unwrap(), 0x80);

        let (i2c, delay) = sccb.release();
        assert_eq!(i2c.writes[0], (0x21, vec![0x12, 0x80]));
        assert_eq!(i2c.writes[1], (0x21, vec![0x12]));
        // One phase delay after the write, two around the read.
        assert_eq!(delay.total_ns, 3 * 20_000);
    }
}
