//! Per-device failure bookkeeping.

use core::fmt;
use enumset::{EnumSet, EnumSetType};

/// A failure domain of the station.
#[derive(EnumSetType, Debug)]
pub enum Device {
    Climate,
    AirQuality,
    Light,
    Display,
}

/// Failure counts since boot. Only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    pub display: u32,
    pub air_quality: u32,
    pub climate: u32,
    pub light: u32,
}

impl ErrorCounters {
    /// Count one failure of `device`.
    pub fn record(&mut self, device: Device) {
        let counter = match device {
            Device::Climate => &mut self.climate,
            Device::AirQuality => &mut self.air_quality,
            Device::Light => &mut self.light,
            Device::Display => &mut self.display,
        };
        *counter = counter.saturating_add(1);
    }

    /// Count one failure of every device in `devices`.
    pub fn record_all(&mut self, devices: EnumSet<Device>) {
        for device in devices {
            self.record(device);
        }
    }

    pub fn get(&self, device: Device) -> u32 {
        match device {
            Device::Climate => self.climate,
            Device::AirQuality => self.air_quality,
            Device::Light => self.light,
            Device::Display => self.display,
        }
    }
}

impl fmt::Display for ErrorCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "display_err: {} | air_quality_err: {} | climate_err: {} | light_err: {}",
            self.display, self.air_quality, self.climate, self.light
        )
    }
}

/// Tests.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_isolated_per_device() {
        let mut counters = ErrorCounters::default();

        counters.record(Device::Display);
        counters.record_all(Device::AirQuality | Device::Climate);
        counters.record(Device::AirQuality);

        assert_eq!(counters.get(Device::Display), 1);
        assert_eq!(counters.get(Device::AirQuality), 2);
        assert_eq!(counters.get(Device::Climate), 1);
        assert_eq!(counters.get(Device::Light), 0);
    }

    #[test]
    fn counters_saturate() {
        let mut counters = ErrorCounters {
            climate: u32::MAX,
            ..Default::default()
        };

        counters.record(Device::Climate);

        assert_eq!(counters.climate, u32::MAX);
    }

    #[test]
    fn summary_line() {
        let counters = ErrorCounters {
            display: 1,
            air_quality: 2,
            climate: 3,
            light: 0,
        };

        assert_eq!(
            counters.to_string(),
            "display_err: 1 | air_quality_err: 2 | climate_err: 3 | light_err: 0"
        );
    }
}
