//! Two-row Bayer demosaic.
//!
//! Each output pixel is built from the 2x2 tile whose top-left corner is
//! the pixel itself: red and blue are sampled directly, green is the mean
//! of the two green sites. Which corner holds red or blue depends on the
//! row and column parity.
//!
//! ```text
//!  odd row, even col   odd row, odd col   even row, even col   even row, odd col
//!       B G                 G B                G R                  R G
//!       G R                 R G                B G                  G B
//! ```

use super::format::Rgb8;
use super::scanline::DecodeError;

/// The two most recent raw rows of the frame being decoded.
///
/// Rows alternate between the two slots by parity, so nothing is copied
/// when the window slides.
#[derive(Debug, Clone)]
pub struct BayerWindow {
    width: usize,
    rows: [Vec<u8>; 2],
    received: usize,
}

impl BayerWindow {
    /// Creates an empty window for rows of `width` samples.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: [vec![0; width], vec![0; width]],
            received: 0,
        }
    }

    /// Row width in samples.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows pushed since the last reset.
    #[inline]
    pub fn rows_received(&self) -> usize {
        self.received
    }

    /// Stores the next raw row and demosaics it against the previous one.
    ///
    /// Returns false for the first row of a frame, which only primes the
    /// window. `row` and `out` must both be `width` long; the window is
    /// left untouched otherwise.
    pub fn push_row(&mut self, row: &[u8], out: &mut [Rgb8]) -> Result<bool, DecodeError> {
        if row.len() != self.width {
            return Err(DecodeError::ByteCountMismatch {
                expected: self.width,
                actual: row.len(),
            });
        }
        if out.len() != self.width {
            return Err(DecodeError::OutputWidthMismatch {
                expected: self.width,
                actual: out.len(),
            });
        }
        let y = self.received;
        self.rows[y & 1].copy_from_slice(row);
        self.received += 1;

        if y == 0 {
            return Ok(false);
        }
        self.demosaic_latest(out);
        Ok(true)
    }

    /// Demosaics the newest pair again into `out`.
    ///
    /// Returns false if fewer than two rows have been pushed.
    pub fn demosaic_latest(&self, out: &mut [Rgb8]) -> bool {
        if self.received < 2 {
            return false;
        }
        let y = self.received - 1;
        let (previous, current) = (&self.rows[(y - 1) & 1], &self.rows[y & 1]);
        demosaic_row(y, previous, current, out);
        true
    }

    /// Forgets all rows; the next push starts a new frame.
    pub fn reset(&mut self) {
        self.received = 0;
    }
}

/// Demosaics row `y` (y >= 1) from the raw rows `y - 1` and `y`.
///
/// Fills columns `0..width - 1`. The last column has no right-hand
/// neighbour and is set to black.
pub fn demosaic_row(y: usize, previous: &[u8], current: &[u8], out: &mut [Rgb8]) {
    let width = out.len().min(previous.len()).min(current.len());
    if width == 0 {
        return;
    }
    let (p, c) = (previous, current);
    let odd_row = y & 1 == 1;

    for x in 0..width - 1 {
        let (b, g, r) = match (odd_row, x & 1 == 1) {
            (true, false) => (p[x], avg(p[x + 1], c[x]), c[x + 1]),
            (true, true) => (p[x + 1], avg(p[x], c[x + 1]), c[x]),
            (false, false) => (c[x], avg(p[x], c[x + 1]), p[x + 1]),
            (false, true) => (c[x + 1], avg(p[x + 1], c[x]), p[x]),
        };
        out[x] = Rgb8 { r, g, b };
    }
    out[width - 1] = Rgb8::BLACK;
}

#[inline]
fn avg(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b)) >> 1) as u8
}
