//! FIFO read channel.
//!
//! The AL422 FIFO on the camera module holds one frame. Reading it back
//! needs a host-generated read clock (RCLK) plus read-reset (RRST) and
//! output-enable (OE) lines; there is no acknowledgment from the FIFO,
//! so the order and spacing of every transition is what keeps the byte
//! stream aligned.

mod bus;
mod channel;

pub use bus::{DataBus, PinBus};
pub use channel::{FifoChannel, FifoError, FifoPins, FifoTiming};
