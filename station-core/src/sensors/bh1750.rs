//! BH1750 ambient light sensor in continuous high-resolution mode.

use super::{LightReading, LightSensor};
use crate::bus::BusTransport;
use crate::error::{BusError, SensorError};
use embedded_hal::delay::DelayNs;
use log::info;

/// BH1750 address with ADDR pulled low.
pub const BH1750_ADDRESS: u8 = 0x23;

const CMD_POWER_ON: u8 = 0x01;

/// 1 lx resolution, new result every 120 ms.
const CMD_CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Worst-case duration of one high-resolution conversion. Until the first
/// conversion after a power-on completes, the data register holds zero.
const MEASUREMENT_TIME_MS: u32 = 180;

/// Counts per lux at the default measurement time.
const COUNTS_PER_LUX: f32 = 1.2;

/// BH1750 decoder.
pub struct Bh1750 {
    address: u8,
    running: bool,
}

impl Bh1750 {
    /// Create a decoder for the device at `address`. Nothing is sent until
    /// the first `init` or `read`.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            running: false,
        }
    }

    /// Power the device on, start continuous conversions and wait for the
    /// first result.
    fn start(
        &mut self,
        bus: &mut dyn BusTransport,
        delay: &mut dyn DelayNs,
    ) -> Result<(), SensorError> {
        bus.command(self.address, CMD_POWER_ON)?;
        bus.command(self.address, CMD_CONTINUOUS_HIGH_RES)?;
        delay.delay_ms(MEASUREMENT_TIME_MS);
        self.running = true;
        info!("BH1750 at 0x{:02x} measuring continuously", self.address);

        Ok(())
    }
}

impl Default for Bh1750 {
    fn default() -> Self {
        Self::new(BH1750_ADDRESS)
    }
}

impl LightSensor for Bh1750 {
    fn init(
        &mut self,
        bus: &mut dyn BusTransport,
        delay: &mut dyn DelayNs,
    ) -> Result<(), SensorError> {
        self.start(bus, delay)
    }

    fn read(
        &mut self,
        bus: &mut dyn BusTransport,
        delay: &mut dyn DelayNs,
    ) -> Result<LightReading, SensorError> {
        if !self.running {
            self.start(bus, delay)?;
        }

        let bytes = bus.receive(self.address, 2).inspect_err(|_| {
            // A power glitch stops continuous mode; restart it next time.
            self.running = false;
        })?;

        let &[msb, lsb] = bytes.as_slice() else {
            return Err(BusError::MalformedLength {
                address: self.address,
                register: 0,
                expected: 2,
                actual: bytes.len(),
            }
            .into());
        };

        Ok(LightReading {
            lux: f32::from(u16::from_be_bytes([msb, lsb])) / COUNTS_PER_LUX,
        })
    }
}
