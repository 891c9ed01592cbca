//! Sensor decoders for the climate and ambient-light devices.
//!
//! Each decoder turns register bytes into a typed reading. The bus is lent
//! to the decoder for a single call, so decoders never hold on to it.

pub mod bh1750;
pub mod bme280;

use crate::bus::BusTransport;
use crate::error::SensorError;
use embedded_hal::delay::DelayNs;

pub use bh1750::Bh1750;
pub use bme280::Bme280;

/// Temperature, pressure and humidity from one climate measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Temperature in degrees Celsius, before any display calibration.
    pub temperature_c: f32,

    /// Pressure in hectopascal.
    pub pressure_hpa: f32,

    /// Relative humidity in percent.
    pub humidity_percent: f32,
}

/// Ambient light measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightReading {
    /// Illuminance in lux.
    pub lux: f32,
}

/// Temperature/pressure/humidity sensor.
pub trait ClimateSensor {
    /// Configure the device. Called once at startup.
    fn init(&mut self, _bus: &mut dyn BusTransport) -> Result<(), SensorError> {
        Ok(())
    }

    /// Take one reading.
    fn read(&mut self, bus: &mut dyn BusTransport) -> Result<ClimateReading, SensorError>;
}

/// Ambient light sensor.
///
/// Unlike the climate sensor, a light sensor may have to wait for its first
/// conversion after (re)starting, so it is lent the delay as well.
pub trait LightSensor {
    /// Configure the device. Called once at startup.
    fn init(
        &mut self,
        _bus: &mut dyn BusTransport,
        _delay: &mut dyn DelayNs,
    ) -> Result<(), SensorError> {
        Ok(())
    }

    /// Take one reading.
    fn read(
        &mut self,
        bus: &mut dyn BusTransport,
        delay: &mut dyn DelayNs,
    ) -> Result<LightReading, SensorError>;
}
