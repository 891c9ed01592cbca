//! Station configuration.
//!
//! Every delay and device-specific constant the orchestrator relies on lives
//! here so the firmware can adjust it without touching the polling logic.

use crate::air_quality::ENS160_ADDRESS;

/// Fixed waits of the polling cycle, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause between the sensor reads and drawing the frame.
    pub pre_render_ms: u32,

    /// Pause after a successful flush before the next cycle starts.
    pub post_flush_ms: u32,

    /// Pause after any device error.
    pub error_backoff_ms: u32,

    /// How long the splash screen stays up.
    pub splash_hold_ms: u32,

    /// Slice length of every pause; the button is sampled after each slice.
    pub button_poll_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pre_render_ms: 700,
            post_flush_ms: 100,
            error_backoff_ms: 300,
            splash_hold_ms: 2000,
            button_poll_ms: 25,
        }
    }
}

/// ENS160 session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualityConfig {
    /// I2C address of the sensor.
    pub address: u8,

    /// Wait after writing the operating mode.
    pub mode_settle_ms: u32,

    /// Wait between the index block and the temperature block of a read.
    pub settle_ms: u32,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            address: ENS160_ADDRESS,
            mode_settle_ms: 500,
            settle_ms: 1000,
        }
    }
}

/// Linear correction applied to the climate sensor temperature before display.
///
/// The board heats the BME280, so the raw value reads high. The default
/// factors were fitted for one station and will differ between builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureCalibration {
    pub scale: f32,
    pub offset: f32,
}

impl TemperatureCalibration {
    /// No correction.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Apply `scale * raw + offset`.
    pub fn apply(&self, raw_c: f32) -> f32 {
        self.scale * raw_c + self.offset
    }
}

impl Default for TemperatureCalibration {
    fn default() -> Self {
        Self {
            scale: 1.1277,
            offset: -8.571,
        }
    }
}

/// Frame layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub calibration: TemperatureCalibration,

    /// Vertical distance between text lines, in pixels.
    pub line_height: u16,

    /// Advance of one glyph, in pixels.
    pub glyph_width: u16,

    /// Panel width, in pixels.
    pub display_width: u16,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            calibration: TemperatureCalibration::default(),
            line_height: 10,
            glyph_width: 6,
            display_width: 128,
        }
    }
}

/// Panel settings used at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Contrast while the splash screen is shown.
    pub splash_contrast: u8,

    /// Contrast for normal operation.
    pub run_contrast: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            splash_contrast: 100,
            run_contrast: 250,
        }
    }
}

/// Complete station configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    pub timing: Timing,
    pub air_quality: AirQualityConfig,
    pub render: RenderConfig,
    pub display: DisplayConfig,

    /// Extra consecutive pressed samples required before a press counts.
    pub debounce_samples: u8,

    /// Version line shown on the splash screen.
    pub version: &'static str,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            air_quality: AirQualityConfig::default(),
            render: RenderConfig::default(),
            display: DisplayConfig::default(),
            debounce_samples: 2,
            version: concat!("v", env!("CARGO_PKG_VERSION")),
        }
    }
}
