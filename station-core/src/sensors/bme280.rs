//! BME280 temperature, pressure and humidity decoder.
//!
//! The device runs in normal mode with 1x oversampling and a one-second
//! standby, so a read only fetches the latest result registers. Compensation
//! uses the floating-point formulas from the Bosch datasheet.

use super::{ClimateReading, ClimateSensor};
use crate::bus::{read_byte, read_exact, BusTransport};
use crate::error::{DecodeError, SensorError};
use log::{debug, info};

/// BME280 address with SDO pulled low.
pub const BME280_ADDRESS: u8 = 0x76;

const REG_CHIP_ID: u8 = 0xd0;
const REG_CALIB_TP: u8 = 0x88;
const REG_CALIB_H: u8 = 0xe1;
const REG_CTRL_HUM: u8 = 0xf2;
const REG_CTRL_MEAS: u8 = 0xf4;
const REG_CONFIG: u8 = 0xf5;
const REG_DATA: u8 = 0xf7;

const CHIP_ID: u8 = 0x60;

/// Humidity oversampling x1.
const CTRL_HUM: u8 = 0x01;

/// Temperature and pressure oversampling x1, normal mode.
const CTRL_MEAS: u8 = 0x27;

/// 1000 ms standby, filter off.
const CONFIG: u8 = 0xa0;

/// Raw value of a channel that has not been measured yet.
const SKIPPED: i32 = 0x80000;

/// Factory trimming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Parse the two calibration blocks.
    ///
    /// # Arguments
    /// * `tp` - Registers `0x88..=0xa1`.
    /// * `h` - Registers `0xe1..=0xe7`.
    ///
    /// # Returns
    /// * `Calibration` - The trimming parameters.
    pub fn parse(tp: &[u8; 26], h: &[u8; 7]) -> Self {
        let u = |i: usize| u16::from_le_bytes([tp[i], tp[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([tp[i], tp[i + 1]]);

        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
            h1: tp[25],
            h2: i16::from_le_bytes([h[0], h[1]]),
            h3: h[2],
            // H4 and H5 share the nibbles of 0xe5.
            h4: (i16::from(h[3] as i8) << 4) | i16::from(h[4] & 0x0f),
            h5: (i16::from(h[5] as i8) << 4) | i16::from(h[4] >> 4),
            h6: h[6] as i8,
        }
    }

    /// Convert the eight result bytes into a reading.
    pub fn compensate(&self, data: &[u8; 8]) -> Result<ClimateReading, DecodeError> {
        let adc_p = (i32::from(data[0]) << 12) | (i32::from(data[1]) << 4) | (i32::from(data[2]) >> 4);
        let adc_t = (i32::from(data[3]) << 12) | (i32::from(data[4]) << 4) | (i32::from(data[5]) >> 4);
        let adc_h = (i32::from(data[6]) << 8) | i32::from(data[7]);

        if adc_t == SKIPPED {
            return Err(DecodeError::OutOfRange {
                quantity: "temperature",
                value: adc_t as f32,
            });
        }

        let t_fine = self.t_fine(f64::from(adc_t));
        let temperature_c = (t_fine / 5120.0) as f32;

        if !(-40.0..=85.0).contains(&temperature_c) {
            return Err(DecodeError::OutOfRange {
                quantity: "temperature",
                value: temperature_c,
            });
        }

        let pressure_hpa = (self.pressure_pa(t_fine, f64::from(adc_p)) / 100.0) as f32;

        if !(300.0..=1100.0).contains(&pressure_hpa) {
            return Err(DecodeError::OutOfRange {
                quantity: "pressure",
                value: pressure_hpa,
            });
        }

        let humidity_percent = self.humidity(t_fine, f64::from(adc_h)) as f32;

        Ok(ClimateReading {
            temperature_c,
            pressure_hpa,
            humidity_percent,
        })
    }

    fn t_fine(&self, adc_t: f64) -> f64 {
        let t1 = f64::from(self.t1);
        let var1 = (adc_t / 16384.0 - t1 / 1024.0) * f64::from(self.t2);
        let var2 = (adc_t / 131072.0 - t1 / 8192.0).powi(2) * f64::from(self.t3);

        var1 + var2
    }

    fn pressure_pa(&self, t_fine: f64, adc_p: f64) -> f64 {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f64::from(self.p6) / 32768.0;
        var2 += var1 * f64::from(self.p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(self.p4) * 65536.0;
        var1 = (f64::from(self.p3) * var1 * var1 / 524288.0 + f64::from(self.p2) * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(self.p1);

        if var1 == 0.0 {
            return 0.0;
        }

        let mut p = 1048576.0 - adc_p;
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = f64::from(self.p9) * p * p / 2147483648.0;
        let var2 = p * f64::from(self.p8) / 32768.0;

        p + (var1 + var2 + f64::from(self.p7)) / 16.0
    }

    fn humidity(&self, t_fine: f64, adc_h: f64) -> f64 {
        let x = t_fine - 76800.0;
        let h = (adc_h - (f64::from(self.h4) * 64.0 + f64::from(self.h5) / 16384.0 * x))
            * (f64::from(self.h2) / 65536.0
                * (1.0
                    + f64::from(self.h6) / 67108864.0
                        * x
                        * (1.0 + f64::from(self.h3) / 67108864.0 * x)));
        let h = h * (1.0 - f64::from(self.h1) * h / 524288.0);

        h.clamp(0.0, 100.0)
    }
}

/// BME280 decoder.
pub struct Bme280 {
    address: u8,
    calibration: Option<Calibration>,
}

impl Bme280 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            calibration: None,
        }
    }

    fn configure(&mut self, bus: &mut dyn BusTransport) -> Result<Calibration, SensorError> {
        let chip_id = read_byte(bus, self.address, REG_CHIP_ID)?;
        if chip_id != CHIP_ID {
            return Err(DecodeError::UnexpectedChipId {
                expected: CHIP_ID,
                actual: chip_id,
            }
            .into());
        }

        let tp = read_exact::<_, 26>(bus, self.address, REG_CALIB_TP)?;
        let h = read_exact::<_, 7>(bus, self.address, REG_CALIB_H)?;
        let calibration = Calibration::parse(&tp, &h);
        debug!("BME280 calibration: {calibration:?}");

        // ctrl_hum only takes effect after a write to ctrl_meas.
        bus.write(self.address, REG_CTRL_HUM, CTRL_HUM)?;
        bus.write(self.address, REG_CTRL_MEAS, CTRL_MEAS)?;
        bus.write(self.address, REG_CONFIG, CONFIG)?;

        info!("BME280 at 0x{:02x} configured", self.address);
        self.calibration = Some(calibration);

        Ok(calibration)
    }
}

impl Default for Bme280 {
    fn default() -> Self {
        Self::new(BME280_ADDRESS)
    }
}

impl ClimateSensor for Bme280 {
    fn init(&mut self, bus: &mut dyn BusTransport) -> Result<(), SensorError> {
        self.configure(bus).map(|_| ())
    }

    fn read(&mut self, bus: &mut dyn BusTransport) -> Result<ClimateReading, SensorError> {
        let calibration = match self.calibration {
            Some(calibration) => calibration,
            None => self.configure(bus)?,
        };

        let data = read_exact::<_, 8>(bus, self.address, REG_DATA)?;

        calibration.compensate(&data).map_err(|e| {
            // Out-of-range data usually follows a sensor reset.
            self.calibration = None;
            e.into()
        })
    }
}
