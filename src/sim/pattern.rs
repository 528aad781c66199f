//! Synthetic sensor output: eight vertical colour bars.
//!
//! The bars shift one position per frame so consecutive captures differ.
//! Pixels are encoded the way the sensor emits them for each format.

use crate::decode::{PixelFormat, Rgb8};

/// White, yellow, cyan, green, magenta, red, blue, black.
pub const BARS: [Rgb8; 8] = [
    Rgb8::new(255, 255, 255),
    Rgb8::new(255, 255, 0),
    Rgb8::new(0, 255, 255),
    Rgb8::new(0, 255, 0),
    Rgb8::new(255, 0, 255),
    Rgb8::new(255, 0, 0),
    Rgb8::new(0, 0, 255),
    Rgb8::new(0, 0, 0),
];

/// Colour of column `x` in frame number `frame`.
pub fn bar_color(x: usize, width: usize, frame: u64) -> Rgb8 {
    let bar = x * BARS.len() / width.max(1);
    BARS[(bar + (frame % BARS.len() as u64) as usize) % BARS.len()]
}

/// Raw bytes of row `y` as the sensor would clock them into the FIFO.
pub fn encode_row(format: PixelFormat, width: usize, y: usize, frame: u64) -> Vec<u8> {
    let mut row = Vec::with_capacity(format.row_bytes(width));
    match format {
        PixelFormat::Rgb444 | PixelFormat::Rgb555 | PixelFormat::Rgb565 => {
            for x in 0..width {
                let [b0, b1] = encode_packed(format, bar_color(x, width, frame));
                row.extend_from_slice(&[b0, b1]);
            }
        }
        PixelFormat::Yuv422 => {
            for x in (0..width).step_by(2) {
                let (y0, u, v) = to_yuv(bar_color(x, width, frame));
                let (y1, _, _) = to_yuv(bar_color(x + 1, width, frame));
                row.extend_from_slice(&[u, y0, v, y1]);
            }
        }
        PixelFormat::Bayer => {
            // BGGR tile.
            for x in 0..width {
                let px = bar_color(x, width, frame);
                let value = match (y % 2, x % 2) {
                    (0, 0) => px.b,
                    (1, 1) => px.r,
                    _ => px.g,
                };
                row.push(value);
            }
        }
    }
    row
}

fn encode_packed(format: PixelFormat, px: Rgb8) -> [u8; 2] {
    let Rgb8 { r, g, b } = px;
    match format {
        PixelFormat::Rgb444 => [b >> 4, (g & 0xF0) | (r >> 4)],
        PixelFormat::Rgb555 => {
            let g5 = g >> 3;
            [(b >> 3) | ((g5 & 0x07) << 5), ((r >> 3) << 2) | (g5 >> 3)]
        }
        _ => {
            let g6 = g >> 2;
            [(b >> 3) | ((g6 & 0x07) << 5), (r & 0xF8) | (g6 >> 3)]
        }
    }
}

fn to_yuv(px: Rgb8) -> (u8, u8, u8) {
    let (r, g, b) = (f64::from(px.r), f64::from(px.g), f64::from(px.b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 128.0 + (b - y) / 1.772;
    let v = 128.0 + (r - y) / 1.402;
    let quantize = |c: f64| c.round().clamp(0.0, 255.0) as u8;
    (quantize(y), quantize(u), quantize(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_scanline;

    #[test]
    fn test_bars_shift_per_frame() {
        assert_eq!(bar_color(0, 8, 0), BARS[0]);
        assert_eq!(bar_color(0, 8, 1), BARS[1]);
        assert_eq!(bar_color(7, 8, 1), BARS[0]);
    }

    #[test]
    fn test_row_lengths() {
        for format in PixelFormat::ALL {
            assert_eq!(encode_row(format, 16, 0, 0).len(), format.row_bytes(16));
        }
    }

    #[test]
    fn test_packed_rows_decode_to_truncated_bars() {
        let raw = encode_row(PixelFormat::Rgb565, 8, 0, 0);
        let row = decode_scanline(&raw, PixelFormat::Rgb565, 8).unwrap();
        assert_eq!(row[0], Rgb8::new(0xF8, 0xFC, 0xF8));
        assert_eq!(row[5], Rgb8::new(0xF8, 0x00, 0x00));

        let raw = encode_row(PixelFormat::Rgb555, 8, 0, 0);
        let row = decode_scanline(&raw, PixelFormat::Rgb555, 8).unwrap();
        assert_eq!(row[3], Rgb8::new(0x00, 0xF8, 0x00));

        let raw = encode_row(PixelFormat::Rgb444, 8, 0, 0);
        let row = decode_scanline(&raw, PixelFormat::Rgb444, 8).unwrap();
        assert_eq!(row[6], Rgb8::new(0x00, 0x00, 0xF0));
    }

    #[test]
    fn test_yuv_rows_decode_near_bars() {
        let raw = encode_row(PixelFormat::Yuv422, 16, 0, 0);
        let row = decode_scanline(&raw, PixelFormat::Yuv422, 16).unwrap();
        // Pixel pairs share chroma and each bar is two pixels wide.
        for (x, px) in row.iter().enumerate() {
            let want = bar_color(x, 16, 0);
            for (got, want) in [(px.r, want.r), (px.g, want.g), (px.b, want.b)] {
                assert!(got.abs_diff(want) <= 3, "x={x} got {px:?} want {want:?}");
            }
        }
    }

    #[test]
    fn test_bayer_tile_order() {
        let even = encode_row(PixelFormat::Bayer, 16, 0, 5);
        let odd = encode_row(PixelFormat::Bayer, 16, 1, 5);
        // Frame 5 starts on red.
        assert_eq!(&even[0..2], &[0, 0]);
        assert_eq!(&odd[0..2], &[0, 255]);
    }
}
