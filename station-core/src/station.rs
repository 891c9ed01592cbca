//! Polling orchestrator.
//!
//! One [`Station::cycle`] samples the button, reads the devices the current
//! display mode needs, renders and flushes a frame. Every device is tried at
//! most once per cycle. A failing device is counted and logged and its
//! fields stay absent; nothing that happens to one device stops the others
//! or the loop.

use crate::air_quality::AirQualitySession;
use crate::bus::BusTransport;
use crate::config::StationConfig;
use crate::debounce::Debouncer;
use crate::diagnostics::{Device, ErrorCounters};
use crate::error::DisplayError;
use crate::io::{DigitalInput, DisplaySurface, StatusIndicator};
use crate::render::{DisplayMode, Frame, FrameRenderer};
use crate::sensors::{ClimateSensor, LightSensor};
use crate::snapshot::SensorSnapshot;
use embedded_hal::delay::DelayNs;
use enumset::EnumSet;
use log::{error, info, warn};

/// Indicator colour while the station is polling.
const BUSY_COLOR: (u8, u8, u8) = (0, 0, 32);

/// Indicator colour while the station is waiting for the next cycle.
const IDLE_COLOR: (u8, u8, u8) = (0, 16, 0);

/// The station's peripherals, apart from the bus they share.
pub struct Devices {
    pub climate: Box<dyn ClimateSensor>,
    pub light: Box<dyn LightSensor>,
    pub display: Box<dyn DisplaySurface>,
    pub button: Box<dyn DigitalInput>,
    pub indicator: Option<Box<dyn StatusIndicator>>,
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Mode the frame was rendered in.
    pub mode: DisplayMode,

    /// Readings taken in this cycle.
    pub snapshot: SensorSnapshot,

    /// Devices that failed in this cycle.
    pub failed: EnumSet<Device>,
}

/// Button, debouncer and the mode they control.
struct ModeInput {
    button: Box<dyn DigitalInput>,
    debouncer: Debouncer,
    mode: DisplayMode,
}

impl ModeInput {
    fn poll(&mut self) {
        let asserted = self.button.read_level();
        if let Some(toggle) = self.debouncer.sample(asserted) {
            self.mode.apply(toggle);
            info!("Display mode -> {:?}", self.mode);
        }
    }
}

/// Delay that keeps sampling the button while it waits.
struct InputAwareDelay<'a, D> {
    delay: &'a mut D,
    input: &'a mut ModeInput,
    slice_ms: u32,
}

impl<D: DelayNs> DelayNs for InputAwareDelay<'_, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(self.slice_ms);
            self.delay.delay_ms(step);
            remaining -= step;
            self.input.poll();
        }
    }
}

/// The polling orchestrator. Owns the bus and lends it to one device at a
/// time.
pub struct Station<B, D> {
    config: StationConfig,
    bus: B,
    delay: D,
    climate: Box<dyn ClimateSensor>,
    light: Box<dyn LightSensor>,
    display: Box<dyn DisplaySurface>,
    indicator: Option<Box<dyn StatusIndicator>>,
    input: ModeInput,
    air_quality: AirQualitySession,
    renderer: FrameRenderer,
    counters: ErrorCounters,
    heartbeat: bool,
    display_ready: bool,
}

impl<B: BusTransport, D: DelayNs> Station<B, D> {
    /// Create a station. Nothing is sent to any device until
    /// [`start`](Self::start) or [`cycle`](Self::cycle).
    pub fn new(config: StationConfig, bus: B, delay: D, devices: Devices) -> Self {
        Self {
            input: ModeInput {
                button: devices.button,
                debouncer: Debouncer::new(config.debounce_samples),
                mode: DisplayMode::default(),
            },
            air_quality: AirQualitySession::new(config.air_quality),
            renderer: FrameRenderer::new(config.render),
            climate: devices.climate,
            light: devices.light,
            display: devices.display,
            indicator: devices.indicator,
            counters: ErrorCounters::default(),
            heartbeat: false,
            display_ready: false,
            config,
            bus,
            delay,
        }
    }

    /// Failure counts since boot.
    ///
    /// # Returns
    /// * `&ErrorCounters` - One counter per device.
    pub fn counters(&self) -> &ErrorCounters {
        &self.counters
    }

    /// The display mode the next cycle will render in.
    ///
    /// # Returns
    /// * `DisplayMode` - The current mode.
    pub fn mode(&self) -> DisplayMode {
        self.input.mode
    }

    /// The air-quality session, for inspecting its state.
    ///
    /// # Returns
    /// * `&AirQualitySession` - The session.
    pub fn air_quality(&self) -> &AirQualitySession {
        &self.air_quality
    }

    /// Bring up the display and the sensors.
    ///
    /// Shows the splash screen, then configures each sensor. A device that
    /// fails here is counted like any other failure and retried by the
    /// polling loop.
    pub fn start(&mut self) {
        info!("Starting station {}", self.config.version);

        if let Err(e) = self.show_splash() {
            self.display_ready = false;
            self.display_failed(&e);
        }

        if let Err(e) = self.climate.init(&mut self.bus) {
            error!("Climate sensor init failed: {e}");
            self.counters.record(Device::Climate);
        }

        let mut delay = InputAwareDelay {
            delay: &mut self.delay,
            input: &mut self.input,
            slice_ms: self.config.timing.button_poll_ms.max(1),
        };
        if let Err(e) = self.air_quality.arm(&mut self.bus, &mut delay) {
            error!("Air quality sensor init failed: {e}");
            self.counters.record(Device::AirQuality);
        }

        if let Err(e) = self.light.init(&mut self.bus, &mut delay) {
            error!("Light sensor init failed: {e}");
            self.counters.record(Device::Light);
        }
    }

    /// Run one polling cycle.
    ///
    /// # Returns
    /// * `CycleReport` - What was read and what failed.
    pub fn cycle(&mut self) -> CycleReport {
        self.indicate(BUSY_COLOR);
        self.input.poll();

        let mode = self.input.mode;
        let mut snapshot = SensorSnapshot::default();
        let mut failed = EnumSet::empty();

        match mode {
            DisplayMode::Light => self.read_light(&mut snapshot, &mut failed),
            DisplayMode::Primary => {
                self.read_climate(&mut snapshot, &mut failed);
                self.read_air_quality(&mut snapshot, &mut failed);
            }
        }

        self.pause(self.config.timing.pre_render_ms);

        let frame = self.renderer.render(mode, &snapshot, self.heartbeat);
        match self.present(&frame) {
            Ok(()) => self.pause(self.config.timing.post_flush_ms),
            Err(e) => {
                warn!("Display error: {e}");
                self.display_ready = false;
                failed.insert(Device::Display);
                self.pause(self.config.timing.error_backoff_ms);
            }
        }

        self.counters.record_all(failed);
        for device in failed {
            warn!(
                "{device:?} failed, {} failures since boot",
                self.counters.get(device)
            );
        }
        info!("{}", self.counters);

        self.heartbeat = !self.heartbeat;
        self.indicate(IDLE_COLOR);

        CycleReport {
            mode,
            snapshot,
            failed,
        }
    }

    /// Poll until `keep_running` returns `false` for a cycle's report.
    pub fn run_until<F>(&mut self, mut keep_running: F)
    where
        F: FnMut(&CycleReport) -> bool,
    {
        loop {
            let report = self.cycle();
            if !keep_running(&report) {
                return;
            }
        }
    }

    /// Start the station and poll forever.
    pub fn run_forever(&mut self) -> ! {
        self.start();

        loop {
            self.cycle();
        }
    }

    fn read_climate(&mut self, snapshot: &mut SensorSnapshot, failed: &mut EnumSet<Device>) {
        match self.climate.read(&mut self.bus) {
            Ok(reading) => {
                info!(
                    "Climate: {:.2} C, {:.2} hPa, {:.2} %",
                    reading.temperature_c, reading.pressure_hpa, reading.humidity_percent
                );
                snapshot.set_climate(reading);
            }
            Err(e) => {
                error!("Climate sensor error: {e}");
                self.device_failed(Device::Climate, failed);
            }
        }
    }

    fn read_air_quality(&mut self, snapshot: &mut SensorSnapshot, failed: &mut EnumSet<Device>) {
        let mut delay = InputAwareDelay {
            delay: &mut self.delay,
            input: &mut self.input,
            slice_ms: self.config.timing.button_poll_ms.max(1),
        };

        match self.air_quality.read(&mut self.bus, &mut delay) {
            Ok(indices) => {
                info!(
                    "Air quality: AQI {} ({}), TVOC {} ppb ({}), eCO2 {} ppm",
                    indices.aqi_code,
                    indices.category(),
                    indices.tvoc_ppb(),
                    indices.tvoc_rating(),
                    indices.eco2_ppm()
                );
                snapshot.set_air_quality(indices);
            }
            Err(e) => {
                error!("Air quality sensor error: {e}");
                self.device_failed(Device::AirQuality, failed);
            }
        }
    }

    fn read_light(&mut self, snapshot: &mut SensorSnapshot, failed: &mut EnumSet<Device>) {
        let mut delay = InputAwareDelay {
            delay: &mut self.delay,
            input: &mut self.input,
            slice_ms: self.config.timing.button_poll_ms.max(1),
        };

        match self.light.read(&mut self.bus, &mut delay) {
            Ok(reading) => {
                info!("Light: {:.1} lx", reading.lux);
                snapshot.set_light(reading);
            }
            Err(e) => {
                error!("Light sensor error: {e}");
                self.device_failed(Device::Light, failed);
            }
        }
    }

    /// Mark `device` as failed for this cycle and back off. Counting happens
    /// once per cycle in [`cycle`](Self::cycle).
    fn device_failed(&mut self, device: Device, failed: &mut EnumSet<Device>) {
        failed.insert(device);
        self.pause(self.config.timing.error_backoff_ms);
    }

    fn display_failed(&mut self, e: &DisplayError) {
        warn!("Display error: {e}");
        self.counters.record(Device::Display);
    }

    /// Send the init sequence and switch the panel on.
    fn wake_display(&mut self) -> Result<(), DisplayError> {
        self.display.init()?;
        self.display.sleep(false)?;
        self.display_ready = true;

        Ok(())
    }

    fn show_splash(&mut self) -> Result<(), DisplayError> {
        self.wake_display()?;
        self.display.clear()?;
        self.display.set_contrast(self.config.display.splash_contrast)?;

        let splash = self.renderer.splash(self.config.version);
        self.draw(&splash)?;
        self.display.flush()?;

        self.pause(self.config.timing.splash_hold_ms);

        self.display.set_contrast(self.config.display.run_contrast)?;
        self.display.clear()
    }

    /// Draw and flush `frame`, first bringing the panel back up if an
    /// earlier display error may have left it uninitialised.
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if !self.display_ready {
            info!("Re-initialising display");
            self.wake_display()?;
            self.display.set_contrast(self.config.display.run_contrast)?;
        }

        self.display.clear()?;
        self.draw(frame)?;
        self.display.flush()
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        for line in frame.lines() {
            self.display.draw_text(&line.text, line.x, line.y)?;
        }

        Ok(())
    }

    fn pause(&mut self, ms: u32) {
        let mut delay = InputAwareDelay {
            delay: &mut self.delay,
            input: &mut self.input,
            slice_ms: self.config.timing.button_poll_ms.max(1),
        };
        delay.delay_ms(ms);
    }

    fn indicate(&mut self, (r, g, b): (u8, u8, u8)) {
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.set_color(r, g, b);
        }
    }
}
