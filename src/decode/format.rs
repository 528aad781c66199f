//! Pixel formats and the canonical RGB triple.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output encoding configured on the sensor.
///
/// Fixed for a capture session; switching it means reconfiguring the
/// sensor registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 4 bits per channel, xBGR packed in two bytes.
    Rgb444,
    /// 5 bits per channel in two bytes.
    Rgb555,
    /// 5/6/5 bits in two bytes.
    Rgb565,
    /// YUV 4:2:2, U Y0 V Y1 per pixel pair.
    Yuv422,
    /// Raw Bayer, one byte per pixel. The first row reads B G B G...,
    /// the second G R G R...
    #[serde(alias = "bayer_rggb")]
    Bayer,
}

impl PixelFormat {
    /// All formats, in configuration order.
    pub const ALL: [PixelFormat; 5] = [
        PixelFormat::Rgb444,
        PixelFormat::Rgb555,
        PixelFormat::Rgb565,
        PixelFormat::Yuv422,
        PixelFormat::Bayer,
    ];

    /// Raw bytes the FIFO holds per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bayer => 1,
            _ => 2,
        }
    }

    /// Raw bytes per scanline of `width` pixels.
    #[inline]
    pub const fn row_bytes(self, width: usize) -> usize {
        width * self.bytes_per_pixel()
    }

    /// Returns true for the single-channel Bayer layout.
    #[inline]
    pub const fn is_bayer(self) -> bool {
        matches!(self, PixelFormat::Bayer)
    }

    fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb444 => "rgb444",
            PixelFormat::Rgb555 => "rgb555",
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Yuv422 => "yuv422",
            PixelFormat::Bayer => "bayer",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb444" => Ok(PixelFormat::Rgb444),
            "rgb555" => Ok(PixelFormat::Rgb555),
            "rgb565" => Ok(PixelFormat::Rgb565),
            "yuv" | "yuv422" => Ok(PixelFormat::Yuv422),
            "bayer" | "bayer_rggb" => Ok(PixelFormat::Bayer),
            other => Err(format!("unknown pixel format: {other}")),
        }
    }
}

/// One decoded pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb8 {
    /// All channels zero.
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };

    /// Builds a pixel from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blue, green, red byte order as stored in 24-bit bitmaps.
    #[inline]
    pub const fn to_bgr(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(PixelFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Yuv422.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Bayer.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::Rgb444.row_bytes(160), 320);
    }

    #[test]
    fn test_parse_and_display() {
        for format in PixelFormat::ALL {
            assert_eq!(format.to_string().parse::<PixelFormat>(), Ok(format));
        }
        assert_eq!("YUV".parse::<PixelFormat>(), Ok(PixelFormat::Yuv422));
        assert!("jpeg".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: PixelFormat,
        }
        let parsed: Wrapper = toml::from_str("format = \"bayer_rggb\"").unwrap();
        assert_eq!(parsed.format, PixelFormat::Bayer);
        let parsed: Wrapper = toml::from_str("format = \"rgb565\"").unwrap();
        assert_eq!(parsed.format, PixelFormat::Rgb565);
    }
}
