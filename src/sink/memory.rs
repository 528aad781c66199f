//! In-memory frame sink.

use super::{FrameProgress, FrameSink, SinkError};
use crate::decode::Rgb8;

/// A decoded frame held in memory, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb8>,
}

impl RgbImage {
    /// Returns the image width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> Option<&[Rgb8]> {
        let start = y.checked_mul(self.width)?;
        self.pixels.get(start..start + self.width)
    }

    /// Returns the pixel at (`x`, `y`).
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb8> {
        if x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x])
    }
}

/// Collects frames into [`RgbImage`]s.
#[derive(Debug, Default)]
pub struct MemorySink {
    current: Option<(FrameProgress, Vec<Rgb8>)>,
    frames: Vec<RgbImage>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed frames, oldest first.
    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    /// Removes and returns the most recent completed frame.
    pub fn take_last(&mut self) -> Option<RgbImage> {
        self.frames.pop()
    }
}

impl FrameSink for MemorySink {
    fn begin_frame(&mut self, width: usize, height: usize) -> Result<(), SinkError> {
        let len = width
            .checked_mul(height)
            .ok_or(SinkError::TooLarge { width, height })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| SinkError::TooLarge { width, height })?;
        self.current = Some((FrameProgress::new(width, height), pixels));
        Ok(())
    }

    fn write_scanline(&mut self, row: &[Rgb8]) -> Result<(), SinkError> {
        let (progress, pixels) = self.current.as_mut().ok_or(SinkError::NoFrame)?;
        progress.accept(row)?;
        pixels.extend_from_slice(row);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let (progress, pixels) = self.current.take().ok_or(SinkError::NoFrame)?;
        progress.complete()?;
        self.frames.push(RgbImage {
            width: progress.width,
            height: progress.height,
            pixels,
        });
        Ok(())
    }

    fn abort(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_rows_in_order() {
        let mut sink = MemorySink::new();
        sink.begin_frame(2, 2).unwrap();
        sink.write_scanline(&[Rgb8::new(1, 0, 0), Rgb8::new(2, 0, 0)]).unwrap();
        sink.write_scanline(&[Rgb8::new(3, 0, 0), Rgb8::new(4, 0, 0)]).unwrap();
        sink.finish().unwrap();

        let image = sink.take_last().unwrap();
        assert_eq!(image.pixel(1, 0), Some(Rgb8::new(2, 0, 0)));
        assert_eq!(image.pixel(0, 1), Some(Rgb8::new(3, 0, 0)));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.row(2), None);
    }

    #[test]
    fn test_incomplete_frame_rejected() {
        let mut sink = MemorySink::new();
        sink.begin_frame(1, 2).unwrap();
        sink.write_scanline(&[Rgb8::BLACK]).unwrap();
        assert!(matches!(
            sink.finish(),
            Err(SinkError::Incomplete { written: 1, height: 2 })
        ));
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn test_row_width_checked() {
        let mut sink = MemorySink::new();
        sink.begin_frame(2, 1).unwrap();
        assert!(matches!(
            sink.write_scanline(&[Rgb8::BLACK]),
            Err(SinkError::RowWidth { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_abort_drops_partial_frame() {
        let mut sink = MemorySink::new();
        sink.begin_frame(1, 2).unwrap();
        sink.write_scanline(&[Rgb8::BLACK]).unwrap();
        sink.abort();

        assert!(sink.frames().is_empty());
        assert!(matches!(
            sink.write_scanline(&[Rgb8::BLACK]),
            Err(SinkError::NoFrame)
        ));
    }

    #[test]
    fn test_write_without_frame() {
        let mut sink = MemorySink::new();
        assert!(matches!(
            sink.write_scanline(&[Rgb8::BLACK]),
            Err(SinkError::NoFrame)
        ));
    }
}
