use crate::air_quality::RawIndices;
use crate::sensors::{ClimateReading, LightReading};

/// Everything read successfully during one polling cycle.
///
/// A field is `Some` only if its device answered in this cycle; values from
/// earlier cycles are never mixed in here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub temperature_c: Option<f32>,
    pub pressure_hpa: Option<f32>,
    pub humidity_percent: Option<f32>,
    pub light_lux: Option<f32>,
    pub air_quality: Option<RawIndices>,
}

impl SensorSnapshot {
    pub fn set_climate(&mut self, reading: ClimateReading) {
        self.temperature_c = Some(reading.temperature_c);
        self.pressure_hpa = Some(reading.pressure_hpa);
        self.humidity_percent = Some(reading.humidity_percent);
    }

    pub fn set_light(&mut self, reading: LightReading) {
        self.light_lux = Some(reading.lux);
    }

    pub fn set_air_quality(&mut self, indices: RawIndices) {
        self.air_quality = Some(indices);
    }
}
