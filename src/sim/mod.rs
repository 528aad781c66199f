//! Software model of the camera module.
//!
//! Stands in for the sensor and FIFO so the capture pipeline can run
//! without hardware. The FIFO exposes embedded-hal pin handles and a
//! [`DataBus`](crate::fifo::DataBus), so the same [`FifoChannel`]
//! code drains it.
//!
//! [`FifoChannel`]: crate::fifo::FifoChannel

mod fifo;
mod pattern;
mod sensor;

pub use fifo::{OutputDisabled, SimBus, SimFifo, SimPin};
pub use pattern::{bar_color, encode_row, BARS};
pub use sensor::{SimRegisters, SimSensor};

/// Delay provider that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
