//! Pixel decoding.
//!
//! Converts the raw FIFO byte stream into RGB8 scanlines. The packed
//! formats (RGB444/555/565, YUV422) decode one row at a time with exact
//! bit formulas; Bayer needs a two-row window and is demosaiced as rows
//! arrive.

mod bayer;
mod format;
mod packed;
mod scanline;

pub use bayer::{demosaic_row, BayerWindow};
pub use format::{PixelFormat, Rgb8};
pub use packed::{rgb444, rgb555, rgb565, yuv_to_rgb};
pub use scanline::{decode_scanline, DecodeError, PixelDecoder};
