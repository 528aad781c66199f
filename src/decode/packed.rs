//! Two-byte packed formats.
//!
//! The bit layouts follow the sensor's output order: the first byte off
//! the bus carries the low half of the pixel word.

use super::format::Rgb8;

/// RGB444 (xBGR) to RGB888.
#[inline]
pub fn rgb444(b0: u8, b1: u8) -> Rgb8 {
    Rgb8 {
        r: (b1 & 0x0F) << 4,
        g: b1 & 0xF0,
        b: (b0 & 0x0F) << 4,
    }
}

/// RGB555 to RGB888.
#[inline]
pub fn rgb555(b0: u8, b1: u8) -> Rgb8 {
    Rgb8 {
        r: (b1 & 0x7C) << 1,
        g: ((b0 & 0xE0) >> 2) | ((b1 & 0x03) << 6),
        b: (b0 & 0x1F) << 3,
    }
}

/// RGB565 to RGB888.
#[inline]
pub fn rgb565(b0: u8, b1: u8) -> Rgb8 {
    Rgb8 {
        r: b1 & 0xF8,
        g: ((b0 & 0xE0) >> 3) | ((b1 & 0x07) << 5),
        b: (b0 & 0x1F) << 3,
    }
}

/// Full-range YCbCr to RGB888.
///
/// Evaluated in double precision, truncated toward zero, then clamped,
/// so results match the sensor vendor's reference conversion exactly.
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Rgb8 {
    let y = f64::from(y);
    let u = f64::from(i32::from(u) - 128);
    let v = f64::from(i32::from(v) - 128);

    let r = y + 1.402 * v;
    let g = y - 0.34414 * u - 0.71414 * v;
    let b = y + 1.772 * u;

    Rgb8 {
        r: clamp_channel(r),
        g: clamp_channel(g),
        b: clamp_channel(b),
    }
}

#[inline]
fn clamp_channel(value: f64) -> u8 {
    (value as i32).clamp(0, 255) as u8
}

/// Decodes two-byte pixels with `convert`, one output per input pair.
#[inline]
pub(crate) fn decode_pairs<F>(bytes: &[u8], out: &mut [Rgb8], convert: F)
where
    F: Fn(u8, u8) -> Rgb8,
{
    for (pixel, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *pixel = convert(pair[0], pair[1]);
    }
}

/// Decodes UYVY groups, two pixels per four bytes.
#[inline]
pub(crate) fn decode_uyvy(bytes: &[u8], out: &mut [Rgb8]) {
    for (pixels, group) in out.chunks_exact_mut(2).zip(bytes.chunks_exact(4)) {
        let (u, y0, v, y1) = (group[0], group[1], group[2], group[3]);
        pixels[0] = yuv_to_rgb(y0, u, v);
        pixels[1] = yuv_to_rgb(y1, u, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rgb565_magenta() {
        assert_eq!(rgb565(0x1F, 0xF8), Rgb8::new(0xF8, 0x00, 0xF8));
    }

    #[test]
    fn test_rgb565_green_spans_both_bytes() {
        // G = 0b111111 split as 3 bits in each byte.
        assert_eq!(rgb565(0xE0, 0x07), Rgb8::new(0x00, 0xFC, 0x00));
    }

    #[test]
    fn test_rgb555_channels() {
        assert_eq!(rgb555(0x1F, 0x00), Rgb8::new(0x00, 0x00, 0xF8));
        assert_eq!(rgb555(0x00, 0x7C), Rgb8::new(0xF8, 0x00, 0x00));
        assert_eq!(rgb555(0xE0, 0x03), Rgb8::new(0x00, 0xF8, 0x00));
    }

    #[test]
    fn test_rgb444_channels() {
        assert_eq!(rgb444(0x0F, 0x00), Rgb8::new(0x00, 0x00, 0xF0));
        assert_eq!(rgb444(0x00, 0xF0), Rgb8::new(0x00, 0xF0, 0x00));
        assert_eq!(rgb444(0x00, 0x0F), Rgb8::new(0xF0, 0x00, 0x00));
        // High nibble of the first byte is padding.
        assert_eq!(rgb444(0xF0, 0x00), Rgb8::BLACK);
    }

    #[test]
    fn test_yuv_zero_chroma() {
        let mut out = [Rgb8::BLACK; 2];
        decode_uyvy(&[128, 128, 128, 200], &mut out);
        assert_eq!(out[0], Rgb8::new(128, 128, 128));
        assert_eq!(out[1], Rgb8::new(200, 200, 200));
    }

    #[test]
    fn test_yuv_clamps_and_truncates() {
        // B = 128 + 1.772 * 127 overflows; G = 128 - 43.7 truncates to 84.
        assert_eq!(yuv_to_rgb(128, 255, 128), Rgb8::new(128, 84, 255));
        // R = -179.4 clamps to zero; G = 91.4 truncates to 91.
        assert_eq!(yuv_to_rgb(0, 128, 0), Rgb8::new(0, 91, 0));
    }

    #[test]
    fn test_decode_pairs_order() {
        let mut out = [Rgb8::BLACK; 2];
        decode_pairs(&[0x1F, 0xF8, 0x00, 0x00], &mut out, rgb565);
        assert_eq!(out, [Rgb8::new(0xF8, 0x00, 0xF8), Rgb8::BLACK]);
    }

    proptest! {
        #[test]
        fn prop_rgb565_low_bits_clear(b0: u8, b1: u8) {
            let px = rgb565(b0, b1);
            prop_assert_eq!(px.r & 0x07, 0);
            prop_assert_eq!(px.g & 0x03, 0);
            prop_assert_eq!(px.b & 0x07, 0);
        }

        #[test]
        fn prop_rgb555_low_bits_clear(b0: u8, b1: u8) {
            let px = rgb555(b0, b1);
            prop_assert_eq!(px.r & 0x07, 0);
            prop_assert_eq!(px.g & 0x07, 0);
            prop_assert_eq!(px.b & 0x07, 0);
        }

        #[test]
        fn prop_rgb444_low_nibbles_clear(b0: u8, b1: u8) {
            let px = rgb444(b0, b1);
            prop_assert_eq!(px.r & 0x0F, 0);
            prop_assert_eq!(px.g & 0x0F, 0);
            prop_assert_eq!(px.b & 0x0F, 0);
        }

        #[test]
        fn prop_yuv_neutral_chroma_is_gray(y: u8) {
            prop_assert_eq!(yuv_to_rgb(y, 128, 128), Rgb8::new(y, y, y));
        }
    }
}
