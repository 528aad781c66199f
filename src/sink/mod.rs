//! Destinations for decoded frames.
//!
//! A sink receives one frame as a sequence of RGB8 scanlines, top row
//! first. It owns the storage format; the capture pipeline only knows
//! this trait.

mod bmp;
mod memory;

pub use bmp::{bmp_header, timestamped_file_name, BmpFileSink, BmpSink, BMP_HEADER_SIZE};
pub use memory::{MemorySink, RgbImage};

use crate::decode::Rgb8;
use thiserror::Error;

/// Errors that can occur while storing a frame.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scanline has {actual} pixels, frame width is {expected}")]
    RowWidth { expected: usize, actual: usize },
    #[error("frame already has {height} rows")]
    TooManyRows { height: usize },
    #[error("frame ended after {written} of {height} rows")]
    Incomplete { written: usize, height: usize },
    #[error("no frame in progress")]
    NoFrame,
    #[error("frame of {width}x{height} is too large for this sink")]
    TooLarge { width: usize, height: usize },
}

/// Receives decoded frames one scanline at a time.
pub trait FrameSink {
    /// Starts a new frame of the given size.
    fn begin_frame(&mut self, width: usize, height: usize) -> Result<(), SinkError>;

    /// Appends the next scanline, top to bottom.
    fn write_scanline(&mut self, row: &[Rgb8]) -> Result<(), SinkError>;

    /// Completes the frame.
    fn finish(&mut self) -> Result<(), SinkError>;

    /// Discards the frame in progress, if any.
    ///
    /// Called when the frame cannot be completed. Nothing of it may be
    /// published afterwards.
    fn abort(&mut self);
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin_frame(&mut self, width: usize, height: usize) -> Result<(), SinkError> {
        S::begin_frame(self, width, height)
    }

    fn write_scanline(&mut self, row: &[Rgb8]) -> Result<(), SinkError> {
        S::write_scanline(self, row)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        S::finish(self)
    }

    fn abort(&mut self) {
        S::abort(self)
    }
}

/// Row bookkeeping shared by the sinks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameProgress {
    /// Pixels per row.
    pub width: usize,
    /// Rows in the frame.
    pub height: usize,
    /// Rows accepted so far.
    pub written: usize,
}

impl FrameProgress {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            written: 0,
        }
    }

    /// Validates the next row and counts it.
    pub(crate) fn accept(&mut self, row: &[Rgb8]) -> Result<(), SinkError> {
        if row.len() != self.width {
            return Err(SinkError::RowWidth {
                expected: self.width,
                actual: row.len(),
            });
        }
        if self.written >= self.height {
            return Err(SinkError::TooManyRows {
                height: self.height,
            });
        }
        self.written += 1;
        Ok(())
    }

    /// Checks that every row arrived.
    pub(crate) fn complete(&self) -> Result<(), SinkError> {
        if self.written == self.height {
            Ok(())
        } else {
            Err(SinkError::Incomplete {
                written: self.written,
                height: self.height,
            })
        }
    }
}
