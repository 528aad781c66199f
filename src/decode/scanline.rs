//! Per-frame scanline decoder.

use super::bayer::BayerWindow;
use super::format::{PixelFormat, Rgb8};
use super::packed::{decode_pairs, decode_uyvy, rgb444, rgb555, rgb565};
use thiserror::Error;

/// Contract violations detected while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("scanline needs {expected} bytes, got {actual}")]
    ByteCountMismatch { expected: usize, actual: usize },
    #[error("output row holds {actual} pixels, expected {expected}")]
    OutputWidthMismatch { expected: usize, actual: usize },
    #[error("width {width} is not valid for {format}")]
    InvalidWidth { format: PixelFormat, width: usize },
    #[error("{0} scanlines need the previous row; use PixelDecoder")]
    NeedsRowContext(PixelFormat),
    #[error("frame has only {height} rows")]
    TooManyRows { height: usize },
}

/// Format-specific row decoding, chosen once per frame.
#[derive(Debug, Clone)]
enum FrameDecoder {
    Packed(fn(u8, u8) -> Rgb8),
    Uyvy,
    Bayer(BayerWindow),
}

impl FrameDecoder {
    fn for_format(format: PixelFormat, width: usize) -> Self {
        match format {
            PixelFormat::Rgb444 => FrameDecoder::Packed(rgb444),
            PixelFormat::Rgb555 => FrameDecoder::Packed(rgb555),
            PixelFormat::Rgb565 => FrameDecoder::Packed(rgb565),
            PixelFormat::Yuv422 => FrameDecoder::Uyvy,
            PixelFormat::Bayer => FrameDecoder::Bayer(BayerWindow::new(width)),
        }
    }
}

fn check_width(format: PixelFormat, width: usize) -> Result<(), DecodeError> {
    let valid = match format {
        PixelFormat::Yuv422 => width > 0 && width % 2 == 0,
        PixelFormat::Bayer => width >= 2,
        _ => width > 0,
    };
    if valid {
        Ok(())
    } else {
        Err(DecodeError::InvalidWidth { format, width })
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::ByteCountMismatch { expected, actual })
    }
}

/// Decodes one scanline of a packed format.
///
/// `bytes` must hold exactly `width` pixels. Bayer rows cannot be decoded
/// on their own and yield [`DecodeError::NeedsRowContext`].
pub fn decode_scanline(
    bytes: &[u8],
    format: PixelFormat,
    width: usize,
) -> Result<Vec<Rgb8>, DecodeError> {
    let convert: Option<fn(u8, u8) -> Rgb8> = match format {
        PixelFormat::Rgb444 => Some(rgb444),
        PixelFormat::Rgb555 => Some(rgb555),
        PixelFormat::Rgb565 => Some(rgb565),
        PixelFormat::Yuv422 => None,
        PixelFormat::Bayer => return Err(DecodeError::NeedsRowContext(format)),
    };
    check_width(format, width)?;
    check_len(format.row_bytes(width), bytes.len())?;

    let mut out = vec![Rgb8::BLACK; width];
    match convert {
        Some(convert) => decode_pairs(bytes, &mut out, convert),
        None => decode_uyvy(bytes, &mut out),
    }
    Ok(out)
}

/// Decodes the scanlines of one frame in order.
///
/// The format is dispatched once at construction. Bayer frames lag one
/// row behind (row 0 produces nothing) and emit the final row a second
/// time from [`finish`](Self::finish), so every format hands `height`
/// rows to the sink.
#[derive(Debug, Clone)]
pub struct PixelDecoder {
    format: PixelFormat,
    width: usize,
    height: usize,
    rows_in: usize,
    rows: FrameDecoder,
}

impl PixelDecoder {
    /// Creates a decoder for a `width` x `height` frame.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Result<Self, DecodeError> {
        check_width(format, width)?;
        Ok(Self {
            format,
            width,
            height,
            rows_in: 0,
            rows: FrameDecoder::for_format(format, width),
        })
    }

    /// Format this decoder was built for.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixels per scanline.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Scanlines per frame.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw bytes expected per input row.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.format.row_bytes(self.width)
    }

    /// Raw bytes expected for the whole frame.
    #[inline]
    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.height
    }

    /// Decodes the next raw row into `out`.
    ///
    /// Returns true if `out` now holds a finished scanline.
    pub fn decode_scanline(&mut self, bytes: &[u8], out: &mut [Rgb8]) -> Result<bool, DecodeError> {
        check_len(self.row_bytes(), bytes.len())?;
        if out.len() != self.width {
            return Err(DecodeError::OutputWidthMismatch {
                expected: self.width,
                actual: out.len(),
            });
        }
        if self.rows_in >= self.height {
            return Err(DecodeError::TooManyRows {
                height: self.height,
            });
        }
        self.rows_in += 1;

        Ok(match &mut self.rows {
            FrameDecoder::Packed(convert) => {
                decode_pairs(bytes, out, *convert);
                true
            }
            FrameDecoder::Uyvy => {
                decode_uyvy(bytes, out);
                true
            }
            FrameDecoder::Bayer(window) => window.push_row(bytes, out)?,
        })
    }

    /// Ends the frame.
    ///
    /// For Bayer frames `out` receives the last scanline again and true is
    /// returned; the window is then cleared for the next frame.
    pub fn finish(&mut self, out: &mut [Rgb8]) -> Result<bool, DecodeError> {
        if out.len() != self.width {
            return Err(DecodeError::OutputWidthMismatch {
                expected: self.width,
                actual: out.len(),
            });
        }
        self.rows_in = 0;
        Ok(match &mut self.rows {
            FrameDecoder::Bayer(window) => {
                let flushed = window.demosaic_latest(out);
                window.reset();
                flushed
            }
            _ => false,
        })
    }

    /// Rows consumed in the current frame.
    pub fn rows_in(&self) -> usize {
        self.rows_in
    }

    /// Drops a partly decoded frame.
    pub fn reset(&mut self) {
        self.rows_in = 0;
        if let FrameDecoder::Bayer(window) = &mut self.rows {
            window.reset();
        }
    }
}
