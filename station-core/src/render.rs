//! Frame composition.
//!
//! The renderer decides which readings are shown in which display mode and
//! formats them into positioned text lines. A field that is missing from the
//! current snapshot shows its last successfully read value, or `--` if it has
//! never been read.

use crate::air_quality::RawIndices;
use crate::config::RenderConfig;
use crate::debounce::ModeToggle;
use crate::snapshot::SensorSnapshot;
use core::fmt::{self, Write};
use log::warn;

/// Longest text line the renderer produces.
pub const LINE_CAPACITY: usize = 32;

/// Most lines a frame can hold.
pub const MAX_LINES: usize = 8;

/// Shown for a value that has never been read.
pub const PLACEHOLDER: &str = "--";

const SPLASH_LINES: [&str; 3] = ["Multi", "Sensor", "Station"];

/// Which readings are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Air quality and climate, six lines.
    #[default]
    Primary,

    /// Ambient light only.
    Light,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Primary => DisplayMode::Light,
            DisplayMode::Light => DisplayMode::Primary,
        }
    }

    /// Apply a debounced press.
    pub fn apply(&mut self, _toggle: ModeToggle) {
        *self = self.toggled();
    }
}

/// A line of text and its top-left pixel position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    pub text: heapless::String<LINE_CAPACITY>,
    pub x: u16,
    pub y: u16,
}

/// Text lines to draw for one screen update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: heapless::Vec<FrameLine, MAX_LINES>,
}

impl Frame {
    pub fn lines(&self) -> &[FrameLine] {
        &self.lines
    }

    /// Text of every line, top to bottom.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    fn push(&mut self, x: u16, y: u16, args: fmt::Arguments<'_>) {
        let mut text = heapless::String::new();
        if text.write_fmt(args).is_err() {
            warn!("Frame line truncated: {text}");
        }

        if self.lines.push(FrameLine { text, x, y }).is_err() {
            warn!("Frame full, dropping line at y={y}");
        }
    }
}

/// Most recent successfully read value of every field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LastKnownValues {
    pub temperature_c: Option<f32>,
    pub pressure_hpa: Option<f32>,
    pub humidity_percent: Option<f32>,
    pub light_lux: Option<f32>,
    pub air_quality: Option<RawIndices>,
}

impl LastKnownValues {
    /// Take over every field present in `snapshot`, keep the rest.
    pub fn absorb(&mut self, snapshot: &SensorSnapshot) {
        self.temperature_c = snapshot.temperature_c.or(self.temperature_c);
        self.pressure_hpa = snapshot.pressure_hpa.or(self.pressure_hpa);
        self.humidity_percent = snapshot.humidity_percent.or(self.humidity_percent);
        self.light_lux = snapshot.light_lux.or(self.light_lux);
        self.air_quality = snapshot.air_quality.or(self.air_quality);
    }
}

/// `Display` for an optional value, printing the placeholder when absent.
struct OrPlaceholder<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrPlaceholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str(PLACEHOLDER),
        }
    }
}

/// Turns snapshots into frames.
pub struct FrameRenderer {
    config: RenderConfig,
    last_known: LastKnownValues,
}

impl FrameRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            last_known: LastKnownValues::default(),
        }
    }

    /// Compose the frame for `mode`.
    ///
    /// # Arguments
    /// * `mode` - The display mode of this cycle.
    /// * `snapshot` - What was read in this cycle.
    /// * `heartbeat` - Whether the heartbeat marker is lit.
    ///
    /// # Returns
    /// * `Frame` - The lines to draw.
    pub fn render(&mut self, mode: DisplayMode, snapshot: &SensorSnapshot, heartbeat: bool) -> Frame {
        self.last_known.absorb(snapshot);

        let mut frame = match mode {
            DisplayMode::Light => self.light_frame(),
            DisplayMode::Primary => self.primary_frame(),
        };

        if heartbeat {
            let x = self.config.display_width.saturating_sub(self.config.glyph_width);
            frame.push(x, 0, format_args!("*"));
        }

        frame
    }

    /// Startup screen: three centred title lines and the version.
    pub fn splash(&self, version: &str) -> Frame {
        let mut frame = Frame::default();
        let mut y = 0;

        for title in SPLASH_LINES {
            frame.push(self.centred_x(title), y, format_args!("{title}"));
            y += self.config.line_height;
        }

        frame.push(
            self.centred_x(version),
            y + self.config.line_height,
            format_args!("{version}"),
        );

        frame
    }

    fn light_frame(&self) -> Frame {
        let mut frame = Frame::default();
        // Integer part only; `as` truncates and maps negative values to 0.
        let lux = self.last_known.light_lux.map(|lux| lux as u32);

        frame.push(0, 0, format_args!("Light: {} lx", OrPlaceholder(lux)));

        frame
    }

    fn primary_frame(&self) -> Frame {
        let mut frame = Frame::default();
        let values = &self.last_known;
        let step = self.config.line_height;

        match values.air_quality {
            Some(indices) => {
                frame.push(
                    0,
                    0,
                    format_args!("AQI: {}  {}", indices.aqi_code, indices.category()),
                );
                frame.push(
                    0,
                    step,
                    format_args!("TVOC: {} ppb {}", indices.tvoc_ppb(), indices.tvoc_rating()),
                );
                frame.push(0, 2 * step, format_args!("eCO2: {} ppm", indices.eco2_ppm()));
            }
            None => {
                frame.push(0, 0, format_args!("AQI: {PLACEHOLDER}"));
                frame.push(0, step, format_args!("TVOC: {PLACEHOLDER} ppb"));
                frame.push(0, 2 * step, format_args!("eCO2: {PLACEHOLDER} ppm"));
            }
        }

        let temperature = values
            .temperature_c
            .map(|t| self.config.calibration.apply(t));
        let pressure = values.pressure_hpa.map(|p| p.round() as i32);

        frame.push(
            0,
            3 * step,
            format_args!("Temp:  {:.1}  C", OrPlaceholder(temperature)),
        );
        frame.push(
            0,
            4 * step,
            format_args!("Press: {} hPa", OrPlaceholder(pressure)),
        );
        frame.push(
            0,
            5 * step,
            format_args!("Humid: {}  %", OrPlaceholder(values.humidity_percent)),
        );

        frame
    }

    fn centred_x(&self, text: &str) -> u16 {
        let width = (text.chars().count() as u16).saturating_mul(self.config.glyph_width);
        self.config.display_width.saturating_sub(width) / 2
    }
}

/// Tests.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemperatureCalibration;

    fn renderer() -> FrameRenderer {
        FrameRenderer::new(RenderConfig::default())
    }

    fn indices(aqi_code: u8, tvoc: (u8, u8), eco2: (u8, u8)) -> RawIndices {
        RawIndices {
            tvoc_lsb: tvoc.0,
            tvoc_msb: tvoc.1,
            eco2_lsb: eco2.0,
            eco2_msb: eco2.1,
            aqi_code,
            temp_lsb: 0,
            temp_msb: 0,
        }
    }

    fn full_snapshot() -> SensorSnapshot {
        SensorSnapshot {
            temperature_c: Some(22.5),
            pressure_hpa: Some(1006.53),
            humidity_percent: Some(45.5),
            light_lux: Some(321.9),
            air_quality: Some(indices(3, (0x2c, 0x01), (0x90, 0x01))),
        }
    }

    fn texts(frame: &Frame) -> Vec<&str> {
        frame.texts().collect()
    }

    #[test]
    fn primary_frame_layout() {
        let frame = renderer().render(DisplayMode::Primary, &full_snapshot(), false);

        assert_eq!(
            texts(&frame),
            vec![
                "AQI: 3  Fair",
                "TVOC: 300 ppb Best",
                "eCO2: 400 ppm",
                "Temp:  16.8  C",
                "Press: 1007 hPa",
                "Humid: 45.5  %",
            ]
        );
        let ys: Vec<u16> = frame.lines().iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![0, 10, 20, 30, 40, 50]);
        assert!(frame.lines().iter().all(|l| l.x == 0));
    }

    #[test]
    fn temperature_calibration_is_configurable() {
        let mut renderer = FrameRenderer::new(RenderConfig {
            calibration: TemperatureCalibration::IDENTITY,
            ..RenderConfig::default()
        });

        let frame = renderer.render(DisplayMode::Primary, &full_snapshot(), false);

        assert_eq!(frame.lines()[3].text.as_str(), "Temp:  22.5  C");
    }

    #[test]
    fn light_frame_truncates() {
        let mut renderer = renderer();
        let snapshot = SensorSnapshot {
            light_lux: Some(123.99),
            ..Default::default()
        };

        let frame = renderer.render(DisplayMode::Light, &snapshot, false);

        assert_eq!(texts(&frame), vec!["Light: 123 lx"]);
    }

    #[test]
    fn never_read_fields_show_placeholder() {
        let frame = renderer().render(DisplayMode::Primary, &SensorSnapshot::default(), false);

        assert_eq!(
            texts(&frame),
            vec![
                "AQI: --",
                "TVOC: -- ppb",
                "eCO2: -- ppm",
                "Temp:  --  C",
                "Press: -- hPa",
                "Humid: --  %",
            ]
        );
    }

    #[test]
    fn missing_fields_fall_back_to_last_known() {
        let mut renderer = renderer();
        renderer.render(DisplayMode::Primary, &full_snapshot(), false);

        let partial = SensorSnapshot {
            temperature_c: Some(30.0),
            ..Default::default()
        };
        let frame = renderer.render(DisplayMode::Primary, &partial, false);

        assert_eq!(frame.lines()[0].text.as_str(), "AQI: 3  Fair");
        assert_eq!(frame.lines()[3].text.as_str(), "Temp:  25.3  C");
        assert_eq!(frame.lines()[4].text.as_str(), "Press: 1007 hPa");
    }

    #[test]
    fn unknown_aqi_code_renders() {
        let snapshot = SensorSnapshot {
            air_quality: Some(indices(9, (0, 0), (0, 0))),
            ..Default::default()
        };

        let frame = renderer().render(DisplayMode::Primary, &snapshot, false);

        assert_eq!(frame.lines()[0].text.as_str(), "AQI: 9  Unknown");
    }

    #[test]
    fn heartbeat_marks_top_right_corner() {
        let frame = renderer().render(DisplayMode::Light, &SensorSnapshot::default(), true);

        let marker = frame.lines().last().unwrap();
        assert_eq!(marker.text.as_str(), "*");
        assert_eq!((marker.x, marker.y), (122, 0));
    }

    #[test]
    fn splash_is_centred() {
        let frame = renderer().splash("v0.1.0");

        let lines: Vec<(&str, u16, u16)> = frame
            .lines()
            .iter()
            .map(|l| (l.text.as_str(), l.x, l.y))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("Multi", 49, 0),
                ("Sensor", 46, 10),
                ("Station", 43, 20),
                ("v0.1.0", 46, 40),
            ]
        );
    }

    #[test]
    fn mode_toggles_back_and_forth() {
        let mut mode = DisplayMode::default();

        mode.apply(ModeToggle);
        assert_eq!(mode, DisplayMode::Light);

        mode.apply(ModeToggle);
        assert_eq!(mode, DisplayMode::Primary);
    }
}
