use super::registers::REG_MAX;
use super::sccb::{ControlBus, SensorError};
use super::tables::{
    apply_table, format_table, Resolution, COLOR_BAR, DEFAULTS, FIFO_WRITE_RESET, RESET,
};
use crate::decode::PixelFormat;
use std::fmt::Write as _;

/// Settling time after a software reset.
pub const RESET_DELAY_MS: u32 = 200;

/// Snapshot of registers `0x00..REG_MAX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump {
    values: Vec<u8>,
}

impl RegisterDump {
    /// Value of register `addr`, if it was read.
    pub fn get(&self, addr: u8) -> Option<u8> {
        self.values.get(usize::from(addr)).copied()
    }

    /// Number of registers read.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was read.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Hex table, sixteen registers per line, prefixed by the first address.
    pub fn to_hex_table(&self) -> String {
        let mut out = String::new();
        for (row, chunk) in self.values.chunks(16).enumerate() {
            let _ = write!(out, "{:02x}:", row * 16);
            for value in chunk {
                let _ = write!(out, " {value:02x}");
            }
            out.push('\n');
        }
        out
    }
}

/// OV7670 configuration driver.
#[derive(Debug)]
pub struct Ov7670<C> {
    bus: C,
}

impl<C: ControlBus> Ov7670<C> {
    /// Wraps a control bus. No registers are touched.
    pub fn new(bus: C) -> Self {
        Self { bus }
    }

    /// Software reset. All registers return to their power-on values.
    pub fn reset(&mut self) -> Result<(), SensorError> {
        apply_table(&mut self.bus, RESET)?;
        self.bus.wait_ms(RESET_DELAY_MS);
        tracing::debug!("sensor reset");
        Ok(())
    }

    /// Resets the sensor and loads format, window and tuning tables.
    pub fn configure(
        &mut self,
        format: PixelFormat,
        resolution: Resolution,
    ) -> Result<(), SensorError> {
        self.reset()?;
        apply_table(&mut self.bus, format_table(format))?;
        apply_table(&mut self.bus, resolution.table())?;
        apply_table(&mut self.bus, DEFAULTS)?;
        tracing::info!(%format, %resolution, "sensor configured");
        Ok(())
    }

    /// Makes VSYNC reset the FIFO write pointer at each frame start.
    pub fn enable_fifo_write_reset(&mut self) -> Result<(), SensorError> {
        apply_table(&mut self.bus, FIFO_WRITE_RESET)
    }

    /// Overlays the colour bar test pattern.
    pub fn enable_color_bar(&mut self) -> Result<(), SensorError> {
        apply_table(&mut self.bus, COLOR_BAR)
    }

    /// Reads every register from `0x00` up to `REG_MAX`.
    pub fn dump_registers(&mut self) -> Result<RegisterDump, SensorError> {
        let values = (0..REG_MAX)
            .map(|addr| self.bus.read_reg(addr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RegisterDump { values })
    }

    /// Writes `value` and reads it back.
    pub fn write_verified(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
        self.bus.write_reg(addr, value)?;
        let actual = self.bus.read_reg(addr)?;
        if actual != value {
            return Err(SensorError::Verify {
                addr,
                expected: value,
                actual,
            });
        }
        Ok(())
    }

    /// Gives direct access to the control bus.
    pub fn bus_mut(&mut self) -> &mut C {
        &mut self.bus
    }

    /// Returns the control bus.
    pub fn release(self) -> C {
        self.bus
    }
}
