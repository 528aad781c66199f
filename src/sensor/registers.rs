//! OV7670 register map (subset used by this driver).

#![allow(missing_docs)]

pub const REG_GAIN: u8 = 0x00;
pub const REG_BLUE: u8 = 0x01;
pub const REG_RED: u8 = 0x02;
pub const REG_VREF: u8 = 0x03;
pub const REG_COM1: u8 = 0x04;
pub const REG_COM3: u8 = 0x0c;
pub const REG_COM4: u8 = 0x0d;
pub const REG_COM5: u8 = 0x0e;
pub const REG_COM6: u8 = 0x0f;
pub const REG_AECH: u8 = 0x10;

pub const REG_COM7: u8 = 0x12;
pub const COM7_RESET: u8 = 0x80;
pub const COM7_QVGA: u8 = 0x10;
pub const COM7_RGB: u8 = 0x04;
pub const COM7_YUV: u8 = 0x00;
pub const COM7_BAYER: u8 = 0x01;
pub const COM7_VGA: u8 = 0x00;
pub const COM7_QQVGA: u8 = 0x00;

pub const REG_COM8: u8 = 0x13;
pub const COM8_FASTAEC: u8 = 0x80;
pub const COM8_AECSTEP: u8 = 0x40;
pub const COM8_BFILT: u8 = 0x20;
pub const COM8_AGC: u8 = 0x04;
pub const COM8_AWB: u8 = 0x02;
pub const COM8_AEC: u8 = 0x01;

pub const REG_COM9: u8 = 0x14;
pub const REG_COM10: u8 = 0x15;
pub const COM10_VS_NEG: u8 = 0x02;

pub const REG_HSTART: u8 = 0x17;
pub const REG_HSTOP: u8 = 0x18;
pub const REG_VSTART: u8 = 0x19;
pub const REG_VSTOP: u8 = 0x1a;
pub const REG_MVFP: u8 = 0x1e;
pub const REG_AEW: u8 = 0x24;
pub const REG_AEB: u8 = 0x25;
pub const REG_VPT: u8 = 0x26;
pub const REG_HREF: u8 = 0x32;
pub const REG_TSLB: u8 = 0x3a;

pub const REG_COM11: u8 = 0x3b;
pub const COM11_EXP: u8 = 0x02;
pub const COM11_HZAUTO_ON: u8 = 0x10;

pub const REG_COM12: u8 = 0x3c;

pub const REG_COM13: u8 = 0x3d;
pub const COM13_GAMMA: u8 = 0x80;
pub const COM13_UVSAT: u8 = 0x40;
pub const COM13_UVSWAP: u8 = 0x01;

pub const REG_COM14: u8 = 0x3e;
pub const REG_EDGE: u8 = 0x3f;

pub const REG_COM15: u8 = 0x40;
pub const COM15_R00FF: u8 = 0xc0;
pub const COM15_R01FE: u8 = 0x80;
pub const COM15_RGB565: u8 = 0x10;
pub const COM15_RGB555: u8 = 0x30;
pub const COM15_RGB444: u8 = 0x10;

pub const REG_COM16: u8 = 0x41;
pub const COM16_AWBGAIN: u8 = 0x08;

pub const REG_COM17: u8 = 0x42;
pub const COM17_CBAR: u8 = 0x08;

pub const REG_GFIX: u8 = 0x69;

pub const REG_SCALING_XSC: u8 = 0x70;
pub const REG_SCALING_YSC: u8 = 0x71;
pub const REG_SCALING_DCWCTR: u8 = 0x72;
pub const REG_SCALING_PCLK_DIV: u8 = 0x73;
pub const REG_REG76: u8 = 0x76;

pub const REG_RGB444: u8 = 0x8c;
pub const RGB444_ENABLE: u8 = 0x02;
pub const RGB444_DISABLE: u8 = 0x00;
pub const RGB444_XBGR: u8 = 0x01;

pub const REG_HAECC1: u8 = 0x9f;
pub const REG_HAECC2: u8 = 0xa0;
pub const REG_SCALING_PCLK_DELAY: u8 = 0xa2;
pub const REG_BD50MAX: u8 = 0xa5;
pub const REG_HAECC3: u8 = 0xa6;
pub const REG_HAECC4: u8 = 0xa7;
pub const REG_HAECC5: u8 = 0xa8;
pub const REG_HAECC6: u8 = 0xa9;
pub const REG_HAECC7: u8 = 0xaa;
pub const REG_BD60MAX: u8 = 0xab;

/// Registers 0x00..REG_MAX are readable.
pub const REG_MAX: u8 = 0xc9;
