//! Declarative register tables.
//!
//! Values follow the OV7670 implementation guide and the Linux ov7670
//! driver; most of the tuning registers are undocumented "magic".

use super::registers::*;
use super::sccb::{ControlBus, SensorError};
use crate::decode::PixelFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One configuration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    /// Writes a value.
    Write(u8, u8),
    /// Reads the register and writes it back with `mask` bits set.
    Set(u8, u8),
}

/// Applies a table in order, stopping at the first failure.
pub fn apply_table<B: ControlBus + ?Sized>(
    bus: &mut B,
    table: &[RegOp],
) -> Result<(), SensorError> {
    for op in table {
        match *op {
            RegOp::Write(addr, value) => bus.write_reg(addr, value)?,
            RegOp::Set(addr, mask) => {
                let current = bus.read_reg(addr)?;
                bus.write_reg(addr, current | mask)?;
            }
        }
    }
    tracing::trace!(ops = table.len(), "register table applied");
    Ok(())
}

/// Frame sizes the FIFO can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// 640x480; only fits the FIFO at one byte per pixel (Bayer).
    Vga640x480,
    /// 544x360, close to the FIFO limit at two bytes per pixel.
    Max544x360,
    /// 480x360, a 3/4 VGA window.
    Vga480x360,
    /// 320x240.
    Qvga320x240,
    /// 160x120.
    Qqvga160x120,
}

impl Resolution {
    /// Every supported resolution, largest first.
    pub const ALL: [Resolution; 5] = [
        Resolution::Vga640x480,
        Resolution::Max544x360,
        Resolution::Vga480x360,
        Resolution::Qvga320x240,
        Resolution::Qqvga160x120,
    ];

    /// Width and height in pixels.
    pub const fn dimensions(self) -> (usize, usize) {
        match self {
            Resolution::Vga640x480 => (640, 480),
            Resolution::Max544x360 => (544, 360),
            Resolution::Vga480x360 => (480, 360),
            Resolution::Qvga320x240 => (320, 240),
            Resolution::Qqvga160x120 => (160, 120),
        }
    }

    /// Register table selecting this window and scaler setup.
    pub fn table(self) -> &'static [RegOp] {
        match self {
            Resolution::Vga640x480 => VGA,
            Resolution::Max544x360 => MAX_544X360,
            Resolution::Vga480x360 => VGA_480X360,
            Resolution::Qvga320x240 => QVGA,
            Resolution::Qqvga160x120 => QQVGA,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Resolution::Vga640x480 => "640x480",
            Resolution::Max544x360 => "544x360",
            Resolution::Vga480x360 => "480x360",
            Resolution::Qvga320x240 => "320x240",
            Resolution::Qqvga160x120 => "160x120",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Resolution::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .or(match s.as_str() {
                "vga" => Some(Resolution::Vga640x480),
                "max" => Some(Resolution::Max544x360),
                "qvga" => Some(Resolution::Qvga320x240),
                "qqvga" => Some(Resolution::Qqvga160x120),
                _ => None,
            })
            .ok_or_else(|| format!("unknown resolution: {s}"))
    }
}

/// Register table selecting a pixel format.
pub fn format_table(format: PixelFormat) -> &'static [RegOp] {
    match format {
        PixelFormat::Rgb444 => RGB444,
        PixelFormat::Rgb555 => RGB555,
        PixelFormat::Rgb565 => RGB565,
        PixelFormat::Yuv422 => YUV422,
        PixelFormat::Bayer => BAYER,
    }
}

/// Software reset. Wait 200 ms afterwards.
pub static RESET: &[RegOp] = &[RegOp::Write(REG_COM7, COM7_RESET)];

/// VSYNC negative, so the FIFO write pointer resets at frame start.
pub static FIFO_WRITE_RESET: &[RegOp] = &[RegOp::Write(REG_COM10, COM10_VS_NEG)];

/// Colour bar test pattern overlay.
pub static COLOR_BAR: &[RegOp] = &[RegOp::Set(REG_COM17, COM17_CBAR)];

// RGB modes share the colour matrix and gain ceiling.
macro_rules! rgb_format {
    ($($head:expr),* ; $($tail:expr),*) => {
        &[
            $($head,)*
            RegOp::Write(REG_COM9, 0x38),
            RegOp::Write(0x4f, 0xb3),
            RegOp::Write(0x50, 0xb3),
            RegOp::Write(0x51, 0x00),
            RegOp::Write(0x52, 0x3d),
            RegOp::Write(0x53, 0xa7),
            RegOp::Write(0x54, 0xe4),
            $($tail,)*
        ]
    };
}

static RGB444: &[RegOp] = rgb_format!(
    RegOp::Set(REG_COM7, COM7_RGB),
    RegOp::Write(REG_RGB444, RGB444_ENABLE | RGB444_XBGR),
    RegOp::Write(REG_COM15, COM15_R01FE | COM15_RGB444),
    RegOp::Write(REG_COM1, 0x40);
    RegOp::Write(REG_COM13, COM13_GAMMA | COM13_UVSAT | 0x02),
    RegOp::Write(REG_TSLB, 0x04)
);

static RGB555: &[RegOp] = rgb_format!(
    RegOp::Set(REG_COM7, COM7_RGB),
    RegOp::Write(REG_RGB444, RGB444_DISABLE),
    RegOp::Write(REG_COM15, COM15_RGB555 | COM15_R00FF),
    RegOp::Write(REG_TSLB, 0x04),
    RegOp::Write(REG_COM1, 0x00);
    RegOp::Write(REG_COM13, COM13_GAMMA | COM13_UVSAT)
);

static RGB565: &[RegOp] = rgb_format!(
    RegOp::Set(REG_COM7, COM7_RGB),
    RegOp::Write(REG_RGB444, RGB444_DISABLE),
    RegOp::Write(REG_COM15, COM15_R00FF | COM15_RGB565),
    RegOp::Write(REG_TSLB, 0x04),
    RegOp::Write(REG_COM1, 0x00);
    RegOp::Write(REG_COM13, COM13_GAMMA | COM13_UVSAT)
);

static YUV422: &[RegOp] = &[
    RegOp::Set(REG_COM7, COM7_YUV),
    RegOp::Write(REG_RGB444, RGB444_DISABLE),
    RegOp::Write(REG_COM15, COM15_R00FF),
    RegOp::Write(REG_TSLB, 0x04),
    RegOp::Write(REG_COM1, 0x00),
    // 4x gain ceiling
    RegOp::Write(REG_COM9, 0x18),
    RegOp::Write(0x4f, 0x80),
    RegOp::Write(0x50, 0x80),
    RegOp::Write(0x51, 0x00),
    RegOp::Write(0x52, 0x22),
    RegOp::Write(0x53, 0x5e),
    RegOp::Write(0x54, 0x80),
    RegOp::Write(REG_COM13, COM13_GAMMA | COM13_UVSAT | COM13_UVSWAP),
];

static BAYER: &[RegOp] = &[
    // First row B G B G..., second row G R G R...
    RegOp::Set(REG_COM7, COM7_BAYER),
    RegOp::Write(REG_RGB444, RGB444_DISABLE),
    RegOp::Write(REG_COM15, COM15_R00FF),
    // No gamma
    RegOp::Write(REG_COM13, 0x08),
    // Edge enhancement, denoise
    RegOp::Write(REG_COM16, 0x3d),
    // Pixel correction
    RegOp::Write(REG_REG76, 0xe1),
    RegOp::Write(REG_TSLB, 0x04),
];

// Window, scaler and pixel clock setup, plus any cropping overrides.
macro_rules! window {
    ($com7:expr, $hstart:expr, $hstop:expr, $href:expr, $vstart:expr, $vstop:expr, $vref:expr,
     $com3:expr, $com14:expr, $xsc:expr, $ysc:expr, $dcw:expr, $pclk_div:expr, $pclk_delay:expr
     $(; $($extra:expr),*)?) => {
        &[
            RegOp::Set(REG_COM7, $com7),
            RegOp::Write(REG_HSTART, $hstart),
            RegOp::Write(REG_HSTOP, $hstop),
            RegOp::Write(REG_HREF, $href),
            RegOp::Write(REG_VSTART, $vstart),
            RegOp::Write(REG_VSTOP, $vstop),
            RegOp::Write(REG_VREF, $vref),
            RegOp::Write(REG_COM3, $com3),
            RegOp::Write(REG_COM14, $com14),
            RegOp::Write(REG_SCALING_XSC, $xsc),
            RegOp::Write(REG_SCALING_YSC, $ysc),
            RegOp::Write(REG_SCALING_DCWCTR, $dcw),
            RegOp::Write(REG_SCALING_PCLK_DIV, $pclk_div),
            RegOp::Write(REG_SCALING_PCLK_DELAY, $pclk_delay),
            $($($extra,)*)?
        ]
    };
}

static VGA: &[RegOp] = window!(
    COM7_VGA, 0x13, 0x01, 0xb6, 0x02, 0x7a, 0x0a, 0x00, 0x00, 0x3a, 0x35, 0x11, 0xf0, 0x02
);

static MAX_544X360: &[RegOp] = window!(
    COM7_VGA, 0x13, 0x01, 0xb6, 0x02, 0x7a, 0x0a, 0x00, 0x00, 0x3a, 0x35, 0x11, 0xf0, 0x02;
    RegOp::Write(REG_HSTART, 0x17),
    RegOp::Write(REG_HSTOP, 0x5b),
    RegOp::Write(REG_VSTART, 0x12),
    RegOp::Write(REG_VSTOP, 0x6c)
);

static VGA_480X360: &[RegOp] = window!(
    COM7_VGA, 0x13, 0x01, 0xb6, 0x02, 0x7a, 0x0a, 0x00, 0x00, 0x3a, 0x35, 0x11, 0xf0, 0x02;
    RegOp::Write(REG_HSTART, 0x1b),
    RegOp::Write(REG_HSTOP, 0x57),
    RegOp::Write(REG_VSTART, 0x12),
    RegOp::Write(REG_VSTOP, 0x6c)
);

static QVGA: &[RegOp] = window!(
    COM7_QVGA, 0x16, 0x04, 0x24, 0x02, 0x7a, 0x0a, 0x04, 0x19, 0x3a, 0x35, 0x11, 0xf1, 0x02
);

static QQVGA: &[RegOp] = window!(
    COM7_QQVGA, 0x16, 0x04, 0xa4, 0x02, 0x7a, 0x0a, 0x04, 0x1a, 0x3a, 0x35, 0x22, 0xf2, 0x02
);

/// Gamma, AGC/AEC, AWB and colour matrix tuning, applied last.
pub static DEFAULTS: &[RegOp] = &[
    // Gamma curve
    RegOp::Write(0x7a, 0x20),
    RegOp::Write(0x7b, 0x10),
    RegOp::Write(0x7c, 0x1e),
    RegOp::Write(0x7d, 0x35),
    RegOp::Write(0x7e, 0x5a),
    RegOp::Write(0x7f, 0x69),
    RegOp::Write(0x80, 0x76),
    RegOp::Write(0x81, 0x80),
    RegOp::Write(0x82, 0x88),
    RegOp::Write(0x83, 0x8f),
    RegOp::Write(0x84, 0x96),
    RegOp::Write(0x85, 0xa3),
    RegOp::Write(0x86, 0xaf),
    RegOp::Write(0x87, 0xc4),
    RegOp::Write(0x88, 0xd7),
    RegOp::Write(0x89, 0xe8),
    // AGC and AEC off while their parameters are set
    RegOp::Write(REG_COM8, COM8_FASTAEC | COM8_AECSTEP | COM8_BFILT),
    RegOp::Write(REG_GAIN, 0x00),
    RegOp::Write(REG_AECH, 0x00),
    RegOp::Write(REG_COM4, 0x40),
    RegOp::Write(REG_COM9, 0x18),
    RegOp::Write(REG_BD50MAX, 0x05),
    RegOp::Write(REG_BD60MAX, 0x07),
    RegOp::Write(REG_AEW, 0x95),
    RegOp::Write(REG_AEB, 0x33),
    RegOp::Write(REG_VPT, 0xe3),
    RegOp::Write(REG_HAECC1, 0x78),
    RegOp::Write(REG_HAECC2, 0x68),
    RegOp::Write(0xa1, 0x03),
    RegOp::Write(REG_HAECC3, 0xd8),
    RegOp::Write(REG_HAECC4, 0xd8),
    RegOp::Write(REG_HAECC5, 0xf0),
    RegOp::Write(REG_HAECC6, 0x90),
    RegOp::Write(REG_HAECC7, 0x94),
    RegOp::Write(
        REG_COM8,
        COM8_FASTAEC | COM8_AECSTEP | COM8_BFILT | COM8_AGC | COM8_AEC,
    ),
    // Reserved values
    RegOp::Write(REG_COM5, 0x61),
    RegOp::Write(REG_COM6, 0x4b),
    RegOp::Write(0x16, 0x02),
    RegOp::Write(REG_MVFP, 0x07),
    RegOp::Write(0x21, 0x02),
    RegOp::Write(0x22, 0x91),
    RegOp::Write(0x29, 0x07),
    RegOp::Write(0x33, 0x0b),
    RegOp::Write(0x35, 0x0b),
    RegOp::Write(0x37, 0x1d),
    RegOp::Write(0x38, 0x71),
    RegOp::Write(0x39, 0x2a),
    RegOp::Write(REG_COM12, 0x78),
    RegOp::Write(0x4d, 0x40),
    RegOp::Write(0x4e, 0x20),
    RegOp::Write(REG_GFIX, 0x00),
    RegOp::Write(0x6b, 0x0a),
    RegOp::Write(0x74, 0x10),
    RegOp::Write(0x8d, 0x4f),
    RegOp::Write(0x8e, 0x00),
    RegOp::Write(0x8f, 0x00),
    RegOp::Write(0x90, 0x00),
    RegOp::Write(0x91, 0x00),
    RegOp::Write(0x96, 0x00),
    RegOp::Write(0x9a, 0x00),
    RegOp::Write(0xb0, 0x84),
    RegOp::Write(0xb1, 0x0c),
    RegOp::Write(0xb2, 0x0e),
    RegOp::Write(0xb3, 0x82),
    RegOp::Write(0xb8, 0x0a),
    // White balance
    RegOp::Write(0x43, 0x0a),
    RegOp::Write(0x44, 0xf0),
    RegOp::Write(0x45, 0x34),
    RegOp::Write(0x46, 0x58),
    RegOp::Write(0x47, 0x28),
    RegOp::Write(0x48, 0x3a),
    RegOp::Write(0x59, 0x88),
    RegOp::Write(0x5a, 0x88),
    RegOp::Write(0x5b, 0x44),
    RegOp::Write(0x5c, 0x67),
    RegOp::Write(0x5d, 0x49),
    RegOp::Write(0x5e, 0x0e),
    RegOp::Write(0x6c, 0x0a),
    RegOp::Write(0x6d, 0x55),
    RegOp::Write(0x6e, 0x11),
    RegOp::Write(0x6f, 0x9f),
    RegOp::Write(0x6a, 0x40),
    RegOp::Write(REG_BLUE, 0x40),
    RegOp::Write(REG_RED, 0x60),
    RegOp::Write(
        REG_COM8,
        COM8_FASTAEC | COM8_AECSTEP | COM8_BFILT | COM8_AGC | COM8_AEC | COM8_AWB,
    ),
    // Colour matrix
    RegOp::Write(0x4f, 0x80),
    RegOp::Write(0x50, 0x80),
    RegOp::Write(0x51, 0x00),
    RegOp::Write(0x52, 0x22),
    RegOp::Write(0x53, 0x5e),
    RegOp::Write(0x54, 0x80),
    RegOp::Write(0x58, 0x9e),
    RegOp::Write(REG_COM16, COM16_AWBGAIN),
    RegOp::Write(REG_EDGE, 0x00),
    RegOp::Write(0x75, 0x05),
    RegOp::Write(0x76, 0xe1),
    RegOp::Write(0x4c, 0x00),
    RegOp::Write(0x77, 0x01),
    RegOp::Write(0x4b, 0x09),
    RegOp::Write(0xc9, 0x60),
    RegOp::Write(REG_COM16, 0x38),
    RegOp::Write(0x56, 0x40),
    RegOp::Write(0x34, 0x11),
    RegOp::Write(REG_COM11, COM11_EXP | COM11_HZAUTO_ON),
    RegOp::Write(0xa4, 0x88),
    RegOp::Write(0x96, 0x00),
    RegOp::Write(0x97, 0x30),
    RegOp::Write(0x98, 0x20),
    RegOp::Write(0x99, 0x30),
    RegOp::Write(0x9a, 0x84),
    RegOp::Write(0x9b, 0x29),
    RegOp::Write(0x9c, 0x03),
    RegOp::Write(0x9d, 0x4c),
    RegOp::Write(0x9e, 0x3f),
    RegOp::Write(0x78, 0x04),
    // Multiplexed registers: 0x79 selects, 0xc8 writes
    RegOp::Write(0x79, 0x01),
    RegOp::Write(0xc8, 0xf0),
    RegOp::Write(0x79, 0x0f),
    RegOp::Write(0xc8, 0x00),
    RegOp::Write(0x79, 0x10),
    RegOp::Write(0xc8, 0x7e),
    RegOp::Write(0x79, 0x0a),
    RegOp::Write(0xc8, 0x80),
    RegOp::Write(0x79, 0x0b),
    RegOp::Write(0xc8, 0x01),
    RegOp::Write(0x79, 0x0c),
    RegOp::Write(0xc8, 0x0f),
    RegOp::Write(0x79, 0x0d),
    RegOp::Write(0xc8, 0x20),
    RegOp::Write(0x79, 0x09),
    RegOp::Write(0xc8, 0x80),
    RegOp::Write(0x79, 0x02),
    RegOp::Write(0xc8, 0xc0),
    RegOp::Write(0x79, 0x03),
    RegOp::Write(0xc8, 0x40),
    RegOp::Write(0x79, 0x05),
    RegOp::Write(0xc8, 0x30),
    RegOp::Write(0x79, 0x26),
];
