//! Frame and line edge synchronization.
//!
//! The sensor and the host share no clock. Frame boundaries are only
//! visible as two asynchronous edges (VSYNC and HREF), so the capture
//! request has to be arbitrated against free-running frame delivery
//! from inside the edge handlers.

mod edge;
mod state;

pub use edge::{EdgeSynchronizer, SyncSnapshot};
pub use state::{CaptureState, WriteGate};
