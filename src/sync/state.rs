//! Capture state record shared between edge handlers and the main loop.

use serde::Serialize;

/// Where a capture request is in its lifecycle.
///
/// ```text
/// Idle --request--> Armed --frame edge--> Capturing --frame edge--> Ready
///  ^                                                                  |
///  +------------------------ poll_capture_done ----------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum CaptureState {
    /// No capture requested.
    Idle = 0,
    /// Requested; waiting for the next frame-start edge.
    Armed = 1,
    /// The FIFO write gate is open for the current frame.
    Capturing = 2,
    /// One full frame sits in the FIFO, waiting to be drained.
    Ready = 3,
}

impl CaptureState {
    #[inline]
    pub(crate) const fn as_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Armed,
            2 => Self::Capturing,
            3 => Self::Ready,
            _ => Self::Idle,
        }
    }

    /// State reached after a frame-start edge, and the write gate level
    /// for the frame that edge begins.
    ///
    /// Ready is never advanced here: an unread frame must not be
    /// overwritten by the next one.
    #[inline]
    pub(crate) const fn on_frame_edge(self) -> (Self, WriteGate) {
        match self {
            Self::Armed => (Self::Capturing, WriteGate::Open),
            Self::Capturing => (Self::Ready, WriteGate::Closed),
            other => (other, WriteGate::Closed),
        }
    }
}

/// Level of the FIFO write-enable line (WEN) for the frame that just began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteGate {
    /// The sensor writes this frame into the FIFO.
    Open,
    /// The FIFO keeps its contents.
    Closed,
}

impl WriteGate {
    /// Returns true if the write-enable line must be driven high.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, WriteGate::Open)
    }
}
