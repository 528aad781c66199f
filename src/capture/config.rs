//! Capture configuration.
//!
//! The FIFO holds 384 KiB, so only some format and resolution pairs fit
//! in one frame. Validation rejects the others before the sensor is
//! touched.

use crate::decode::PixelFormat;
use crate::fifo::FifoTiming;
use crate::sensor::Resolution;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// AL422B capacity in bytes.
pub const FIFO_CAPACITY: usize = 384 * 1024;

/// Configuration for one capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pixel format the sensor is set to.
    pub format: PixelFormat,
    /// Frame size.
    pub resolution: Resolution,
    /// Give up waiting for a frame after this long.
    pub timeout_ms: u64,
    /// Pause between polls of the capture-done flag.
    pub poll_interval_us: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: PixelFormat::Rgb565,
            resolution: Resolution::Qvga320x240,
            timeout_ms: 1000,
            poll_interval_us: 100,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration for the given format and size.
    pub fn new(format: PixelFormat, resolution: Resolution) -> Self {
        Self {
            format,
            resolution,
            ..Default::default()
        }
    }

    /// Frame width and height in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        self.resolution.dimensions()
    }

    /// Bytes the FIFO holds for one frame.
    pub fn frame_byte_count(&self) -> usize {
        let (width, height) = self.dimensions();
        self.format.row_bytes(width) * height
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_byte_count() > FIFO_CAPACITY {
            return Err(ConfigError::ExceedsFifo {
                format: self.format,
                resolution: self.resolution,
                bytes: self.frame_byte_count(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("{format} at {resolution} needs {bytes} bytes, more than the FIFO holds")]
    ExceedsFifo {
        format: PixelFormat,
        resolution: Resolution,
        bytes: usize,
    },
    #[error("capture timeout must be non-zero")]
    InvalidTimeout,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Capture parameters, `[capture]`.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// FIFO settling delays, `[fifo]`.
    #[serde(default)]
    pub fifo: FifoTiming,
    /// Where and how often frames are stored, `[output]`.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory BMP files are written to.
    pub directory: PathBuf,
    /// Run continuously (true) or capture a fixed number of frames (false).
    pub continuous: bool,
    /// Number of frames to capture if not continuous.
    pub frame_count: u32,
    /// Pause between frames.
    pub interval_ms: u64,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("frames"),
            continuous: false,
            frame_count: 1,
            interval_ms: 500,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_byte_count(), 320 * 240 * 2);
    }

    #[test]
    fn test_vga_is_bayer_only() {
        for format in PixelFormat::ALL {
            let config = CaptureConfig::new(format, Resolution::Vga640x480);
            assert_eq!(config.validate().is_ok(), format.is_bayer(), "{format}");
        }
    }

    #[test]
    fn test_smaller_sizes_fit_every_format() {
        for format in PixelFormat::ALL {
            for resolution in &Resolution::ALL[1..] {
                assert!(CaptureConfig::new(format, *resolution).validate().is_ok());
            }
        }
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let config = CaptureConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[capture]
format = "bayer"
resolution = "vga640x480"
timeout_ms = 250

[fifo]
settle_ns = 2000

[output]
directory = "/tmp/frames"
continuous = true
"#
        )
        .unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.capture.format, PixelFormat::Bayer);
        assert_eq!(config.capture.resolution, Resolution::Vga640x480);
        assert_eq!(config.capture.timeout_ms, 250);
        assert_eq!(config.capture.poll_interval_us, 100);
        assert_eq!(config.fifo.settle_ns, 2000);
        assert!(config.output.continuous);
        assert_eq!(config.output.frame_count, 1);
    }

    #[test]
    fn test_from_file_rejects_oversized_frame() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nformat = \"rgb565\"\nresolution = \"vga640x480\"").unwrap();
        assert!(matches!(
            FileConfig::from_file(file.path()),
            Err(ConfigError::ExceedsFifo { .. })
        ));
    }
}
