//! OV7670 configuration over the SCCB control channel.
//!
//! The sensor is configured once, before capture: software reset, then the
//! pixel format table, the window table and the tuning defaults. Each
//! table is a static list of [`RegOp`]s applied by [`apply_table`].

mod ov7670;
pub mod registers;
mod sccb;
mod tables;

pub use ov7670::{Ov7670, RegisterDump, RESET_DELAY_MS};
pub use sccb::{ControlBus, Sccb, SensorError, OV7670_ADDRESS, PHASE_DELAY_US};
pub use tables::{
    apply_table, format_table, RegOp, Resolution, COLOR_BAR, DEFAULTS, FIFO_WRITE_RESET, RESET,
};
