//! ENS160 air-quality session.
//!
//! The sensor only produces data while it is in standard operating mode, and
//! it drops out of that mode on brown-outs and bus glitches. The session
//! therefore tracks whether it believes the device is measuring and
//! re-issues the mode write before the first read after any failure:
//!
//! ```text
//! Uninitialized --arm--> Measuring --read ok--> Measuring
//!                        Measuring --read err--> Faulted --arm--> Measuring
//! ```

use crate::bus::{decode_u16, read_byte, BusTransport};
use crate::config::AirQualityConfig;
use crate::error::{DecodeError, SensorError};
use core::fmt;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

/// ENS160 I2C address with ADDR pulled high.
pub const ENS160_ADDRESS: u8 = 0x53;

/// Operating mode register.
const REG_OPMODE: u8 = 0x10;

/// Device status register.
const REG_DATA_STATUS: u8 = 0x20;

/// Air quality index (UBA scale).
const REG_DATA_AQI: u8 = 0x21;

/// Total VOC, LSB then MSB.
const REG_DATA_TVOC: u8 = 0x22;

/// Equivalent CO2, LSB then MSB.
const REG_DATA_ECO2: u8 = 0x24;

/// Compensation temperature in use, LSB then MSB.
const REG_DATA_T: u8 = 0x30;

/// Standard gas sensing mode.
pub const OPMODE_STANDARD: u8 = 0x02;

/// STATER bit of the status register.
const STATUS_ERROR: u8 = 0x40;

/// Validity flag bits of the status register.
const STATUS_VALIDITY_MASK: u8 = 0x0c;

/// Raw register bytes of one complete ENS160 read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawIndices {
    pub tvoc_lsb: u8,
    pub tvoc_msb: u8,
    pub eco2_lsb: u8,
    pub eco2_msb: u8,
    pub aqi_code: u8,
    pub temp_lsb: u8,
    pub temp_msb: u8,
}

impl RawIndices {
    /// Total VOC in ppb.
    pub fn tvoc_ppb(&self) -> u16 {
        decode_u16(self.tvoc_lsb, self.tvoc_msb)
    }

    /// Equivalent CO2 in ppm.
    pub fn eco2_ppm(&self) -> u16 {
        decode_u16(self.eco2_lsb, self.eco2_msb)
    }

    /// UBA category of the AQI register.
    ///
    /// # Returns
    /// * `AqiCategory` - The category, `Unknown` for codes outside 1..=5.
    pub fn category(&self) -> AqiCategory {
        category_of(self.aqi_code)
    }

    /// Rating of the TVOC total.
    ///
    /// # Returns
    /// * `TvocRating` - The rating.
    pub fn tvoc_rating(&self) -> TvocRating {
        TvocRating::from_ppb(u32::from(self.tvoc_ppb()))
    }

    /// Compensation temperature the sensor is using, in degrees Celsius.
    ///
    /// The register holds Kelvin in 1/64 steps.
    pub fn compensation_temperature_c(&self) -> f32 {
        f32::from(decode_u16(self.temp_lsb, self.temp_msb)) / 64.0 - 273.15
    }
}

/// UBA air quality category reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Best,
    Good,
    Fair,
    Poor,
    Bad,

    /// Any code outside 1..=5.
    Unknown(u8),
}

impl AqiCategory {
    /// Text shown on the display.
    ///
    /// # Returns
    /// * `&'static str` - The label.
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Best => "Best",
            AqiCategory::Good => "Good",
            AqiCategory::Fair => "Fair",
            AqiCategory::Poor => "Poor",
            AqiCategory::Bad => "Bad",
            AqiCategory::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a raw AQI register value onto its category.
pub fn category_of(code: u8) -> AqiCategory {
    match code {
        1 => AqiCategory::Best,
        2 => AqiCategory::Good,
        3 => AqiCategory::Fair,
        4 => AqiCategory::Poor,
        5 => AqiCategory::Bad,
        other => AqiCategory::Unknown(other),
    }
}

/// Rating of a total VOC concentration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TvocRating {
    Best,
    Good,
    Fair,
    Poor,
    Bad,
}

impl TvocRating {
    /// Classify a TVOC total in ppb. Upper bounds are inclusive.
    pub fn from_ppb(ppb: u32) -> Self {
        match ppb {
            0..=300 => TvocRating::Best,
            301..=1000 => TvocRating::Good,
            1001..=3000 => TvocRating::Fair,
            3001..=10000 => TvocRating::Poor,
            _ => TvocRating::Bad,
        }
    }

    /// Text shown on the display.
    ///
    /// # Returns
    /// * `&'static str` - The label.
    pub fn label(&self) -> &'static str {
        match self {
            TvocRating::Best => "Best",
            TvocRating::Good => "Good",
            TvocRating::Fair => "Fair",
            TvocRating::Poor => "Poor",
            TvocRating::Bad => "Bad",
        }
    }
}

impl fmt::Display for TvocRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the session believes the sensor is measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityMode {
    /// No mode write has succeeded yet.
    Uninitialized,

    /// Armed and delivering data.
    Measuring,

    /// The last attempt failed; the next read re-arms first.
    Faulted,
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualityState {
    pub mode: AirQualityMode,
    pub last_indices: Option<RawIndices>,
}

/// Owner of the ENS160 operating-mode contract.
pub struct AirQualitySession {
    config: AirQualityConfig,
    state: AirQualityState,
}

impl AirQualitySession {
    /// Create a session. The sensor is armed by the first `arm` or `read`.
    ///
    /// # Arguments
    /// * `config` - Address and settle times.
    ///
    /// # Returns
    /// * `AirQualitySession` - An `Uninitialized` session.
    pub fn new(config: AirQualityConfig) -> Self {
        Self {
            config,
            state: AirQualityState {
                mode: AirQualityMode::Uninitialized,
                last_indices: None,
            },
        }
    }

    /// Current position in the mode state machine.
    ///
    /// # Returns
    /// * `AirQualityMode` - The mode.
    pub fn mode(&self) -> AirQualityMode {
        self.state.mode
    }

    /// Mode and the last complete set of indices.
    ///
    /// # Returns
    /// * `&AirQualityState` - The state.
    pub fn state(&self) -> &AirQualityState {
        &self.state
    }

    /// Write the standard operating mode and wait for the sensor to apply it.
    ///
    /// # Arguments
    /// * `bus` - The bus, lent for the duration of the call.
    /// * `delay` - Delay used for the mode settle time.
    ///
    /// # Returns
    /// * `Result<(), SensorError>` - `Err` leaves the session `Faulted`.
    pub fn arm<B, D>(&mut self, bus: &mut B, delay: &mut D) -> Result<(), SensorError>
    where
        B: BusTransport + ?Sized,
        D: DelayNs + ?Sized,
    {
        if let Err(e) = bus.write(self.config.address, REG_OPMODE, OPMODE_STANDARD) {
            self.transition(AirQualityMode::Faulted);
            return Err(e.into());
        }

        delay.delay_ms(self.config.mode_settle_ms);
        self.transition(AirQualityMode::Measuring);

        Ok(())
    }

    /// Read one set of indices.
    ///
    /// Re-arms the sensor first unless it is known to be measuring. On any
    /// failure the session becomes `Faulted` and no partial data is kept.
    ///
    /// # Arguments
    /// * `bus` - The bus, lent for the duration of the call.
    /// * `delay` - Delay used for the settle times.
    ///
    /// # Returns
    /// * `Result<RawIndices, SensorError>` - The raw indices or an error.
    pub fn read<B, D>(&mut self, bus: &mut B, delay: &mut D) -> Result<RawIndices, SensorError>
    where
        B: BusTransport + ?Sized,
        D: DelayNs + ?Sized,
    {
        if self.state.mode != AirQualityMode::Measuring {
            self.arm(bus, delay)?;
        }

        match self.sample(bus, delay) {
            Ok(indices) => {
                self.state.last_indices = Some(indices);
                Ok(indices)
            }
            Err(e) => {
                self.transition(AirQualityMode::Faulted);
                Err(e)
            }
        }
    }

    fn sample<B, D>(&mut self, bus: &mut B, delay: &mut D) -> Result<RawIndices, SensorError>
    where
        B: BusTransport + ?Sized,
        D: DelayNs + ?Sized,
    {
        let address = self.config.address;

        let opmode = read_byte(bus, address, REG_OPMODE)?;
        debug!("ENS160 OPMODE: 0x{opmode:02x}");
        if opmode != OPMODE_STANDARD {
            return Err(DecodeError::UnexpectedOpMode {
                expected: OPMODE_STANDARD,
                actual: opmode,
            }
            .into());
        }

        let status = read_byte(bus, address, REG_DATA_STATUS)?;
        debug!("ENS160 DATA_STATUS: 0x{status:02x}");
        if status & STATUS_ERROR != 0 {
            return Err(DecodeError::DeviceFault { status }.into());
        }
        if status & STATUS_VALIDITY_MASK != 0 {
            debug!("ENS160 still warming up (validity {})", (status & STATUS_VALIDITY_MASK) >> 2);
        }

        // Both halves of a total come from the same read pass.
        let tvoc_lsb = read_byte(bus, address, REG_DATA_TVOC)?;
        let tvoc_msb = read_byte(bus, address, REG_DATA_TVOC + 1)?;
        let eco2_lsb = read_byte(bus, address, REG_DATA_ECO2)?;
        let eco2_msb = read_byte(bus, address, REG_DATA_ECO2 + 1)?;
        let aqi_code = read_byte(bus, address, REG_DATA_AQI)?;

        delay.delay_ms(self.config.settle_ms);

        let temp_lsb = read_byte(bus, address, REG_DATA_T)?;
        let temp_msb = read_byte(bus, address, REG_DATA_T + 1)?;

        let indices = RawIndices {
            tvoc_lsb,
            tvoc_msb,
            eco2_lsb,
            eco2_msb,
            aqi_code,
            temp_lsb,
            temp_msb,
        };

        debug!(
            "ENS160 AQI: {} ({}), TVOC: {} ppb, eCO2: {} ppm, T: {:.2} C",
            aqi_code,
            indices.category(),
            indices.tvoc_ppb(),
            indices.eco2_ppm(),
            indices.compensation_temperature_c()
        );

        Ok(indices)
    }

    fn transition(&mut self, next: AirQualityMode) {
        let previous = self.state.mode;
        if previous == next {
            return;
        }

        match next {
            AirQualityMode::Faulted => warn!("ENS160 session {previous:?} -> Faulted"),
            _ => info!("ENS160 session {previous:?} -> {next:?}"),
        }

        self.state.mode = next;
    }
}
