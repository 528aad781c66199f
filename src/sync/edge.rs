//! Edge handlers and the capture request/poll accessors.

use super::state::{CaptureState, WriteGate};
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use serde::Serialize;

/// Arbitrates capture requests against frame-start and line-start edges.
///
/// The two edge handlers are the only writers of the state record and
/// the line counters; the main loop only reads, through
/// [`poll_capture_done`](Self::poll_capture_done), which snapshots and
/// clears in one atomic step. No locks and no allocation, so an instance
/// can live in a `static` and be shared with interrupt handlers.
///
/// The frame and line handlers must not preempt each other (same
/// interrupt priority); that exclusion is the platform's job.
#[derive(Debug)]
pub struct EdgeSynchronizer {
    state: AtomicU8,
    line_counter: AtomicU32,
    last_line_count: AtomicU32,
    captured_line_count: AtomicU32,
    frames_observed: AtomicU32,
}

/// Point-in-time view of the synchronizer, for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot {
    /// Current capture state.
    pub state: CaptureState,
    /// Line edges seen since the last frame edge.
    pub line_count: u32,
    /// Line count of the previous complete frame interval.
    pub last_line_count: u32,
    /// Line count of the most recently captured frame.
    pub captured_line_count: u32,
    /// Frame edges seen since construction (wrapping).
    pub frames_observed: u32,
}

impl EdgeSynchronizer {
    /// Creates an idle synchronizer.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(CaptureState::Idle.as_raw()),
            line_counter: AtomicU32::new(0),
            last_line_count: AtomicU32::new(0),
            captured_line_count: AtomicU32::new(0),
            frames_observed: AtomicU32::new(0),
        }
    }

    /// Arms a capture for the next frame.
    ///
    /// Only takes effect from Idle. While a request is outstanding, a
    /// frame is being captured, or a captured frame is still unread, this
    /// is a no-op. Returns true if this call armed the capture.
    pub fn request_capture(&self) -> bool {
        let armed = self
            .state
            .compare_exchange(
                CaptureState::Idle.as_raw(),
                CaptureState::Armed.as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if armed {
            tracing::debug!("capture armed");
        } else {
            tracing::trace!(state = ?self.state(), "capture request ignored");
        }
        armed
    }

    /// Returns true once per captured frame and clears the completion.
    ///
    /// A second call without an intervening capture returns false.
    pub fn poll_capture_done(&self) -> bool {
        self.state
            .compare_exchange(
                CaptureState::Ready.as_raw(),
                CaptureState::Idle.as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Frame-start (VSYNC) edge handler.
    ///
    /// Advances Armed to Capturing (gate opens for the frame that starts
    /// now) and Capturing to Ready (gate closes, the previous frame is
    /// complete). The line counter is snapshotted and reset on every
    /// edge, whatever the state; the count of a frame that becomes Ready
    /// is also latched until the next capture completes. The returned
    /// gate level must be driven onto the FIFO write-enable line before
    /// the first line of the frame.
    pub fn on_frame_edge(&self) -> WriteGate {
        let lines = self.line_counter.swap(0, Ordering::AcqRel);
        self.last_line_count.store(lines, Ordering::Release);
        // Only this handler leaves Capturing, so the check cannot go stale.
        // The latch is stored before Ready becomes visible to the poller.
        if self.state() == CaptureState::Capturing {
            self.captured_line_count.store(lines, Ordering::Release);
        }

        let previous = match self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                let current = CaptureState::from_raw(raw);
                let (next, _) = current.on_frame_edge();
                (next != current).then(|| next.as_raw())
            }) {
            Ok(raw) | Err(raw) => CaptureState::from_raw(raw),
        };
        let (next, gate) = previous.on_frame_edge();
        self.frames_observed.fetch_add(1, Ordering::Relaxed);

        if next != previous {
            tracing::trace!(from = ?previous, to = ?next, lines, "frame edge");
        }
        gate
    }

    /// Line-start (HREF) edge handler.
    #[inline]
    pub fn on_line_edge(&self) {
        self.line_counter.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the current capture state.
    pub fn state(&self) -> CaptureState {
        CaptureState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Line edges seen since the last frame edge.
    pub fn line_count(&self) -> u32 {
        self.line_counter.load(Ordering::Acquire)
    }

    /// Lines counted in the last complete frame interval.
    ///
    /// Should equal the configured frame height; a mismatch points at a
    /// sensor or wiring problem.
    pub fn last_line_count(&self) -> u32 {
        self.last_line_count.load(Ordering::Acquire)
    }

    /// Lines counted in the frame that last reached Ready.
    ///
    /// Unlike [`last_line_count`](Self::last_line_count) this is not
    /// overwritten by the idle frames that follow, so it still describes
    /// the FIFO contents however late the frame is polled.
    pub fn captured_line_count(&self) -> u32 {
        self.captured_line_count.load(Ordering::Acquire)
    }

    /// Frame edges seen since construction.
    pub fn frames_observed(&self) -> u32 {
        self.frames_observed.load(Ordering::Relaxed)
    }

    /// Returns a diagnostic snapshot. Fields are read one by one and may
    /// straddle an edge; use the accessors above for decisions.
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            state: self.state(),
            line_count: self.line_count(),
            last_line_count: self.last_line_count(),
            captured_line_count: self.captured_line_count(),
            frames_observed: self.frames_observed(),
        }
    }
}

impl Default for EdgeSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}
