use crate::bus::SharedI2c;
use crate::display::Sh1106Display;
use crate::error::AppError;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, IOPin, OutputPin, PinDriver, Pull};
use esp_idf_svc::hal::i2c::I2cConfig;
use esp_idf_svc::hal::i2c::I2cDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use station_core::io::DigitalInput;
use station_core::sensors::{Bh1750, Bme280};
use station_core::{Devices, Station, StationConfig};

/// I2C bus frequency in kHz.
const I2C_FREQUENCY_KHZ: u32 = 100;

/// Mode button, active low with the internal pull-up.
pub struct Button {
  /// The input pin.
  pin: PinDriver<'static, AnyIOPin, Input>,
}

/// The button implementation.
impl Button {
  /// Configure a pin as the mode button.
  ///
  /// # Parameters
  /// - `pin`: The button pin.
  ///
  /// # Returns
  /// The button.
  pub fn new(pin: AnyIOPin) -> Result<Self, AppError> {
    let mut pin = PinDriver::input(pin)
      .map_err(|e| AppError::GpioError(format!("Failed to configure button: {:?}", e)))?;

    pin.set_pull(Pull::Up)
      .map_err(|e| AppError::GpioError(format!("Failed to enable button pull-up: {:?}", e)))?;

    Ok(Self { pin })
  }
}

impl DigitalInput for Button {
  fn read_level(&mut self) -> bool {
    self.pin.is_low()
  }
}

/// The device manager interface.
pub struct DeviceManager {
  /// The polling station with every peripheral attached.
  station: Station<SharedI2c, FreeRtos>,
}

/// The device manager implementation.
impl DeviceManager {
  /// Create a new device manager.
  ///
  /// # Parameters
  /// - `peripherals`: The ESP32 peripherals.
  ///
  /// # Returns
  /// The device manager.
  pub fn new(peripherals: Peripherals) -> Result<Self, AppError> {
    let config = I2cConfig::default().baudrate(I2C_FREQUENCY_KHZ.kHz().into());

    let sda = peripherals.pins.gpio8;

    let scl = peripherals.pins.gpio9;

    let i2c = SharedI2c::new(
      I2cDriver::new(peripherals.i2c0, sda, scl, &config)
        .map_err(|e| AppError::I2cError(format!("Failed to initialize I2C: {:?}", e)))?
    );

    // Display with its reset line on GPIO2
    let reset = PinDriver::output(peripherals.pins.gpio2.downgrade_output())
      .map_err(|e| AppError::DisplayError(format!("Failed to configure display reset: {:?}", e)))?;
    let display = Sh1106Display::new(i2c.clone(), Some(reset));

    let button = Button::new(peripherals.pins.gpio3.downgrade())?;

    let devices = Devices {
      climate: Box::new(Bme280::default()),
      light: Box::new(Bh1750::default()),
      display: Box::new(display),
      button: Box::new(button),
      indicator: None,
    };

    let station = Station::new(StationConfig::default(), i2c, FreeRtos, devices);

    Ok(Self { station })
  }

  /// Bring the station up and poll forever.
  pub fn run(mut self) -> ! {
    self.station.run_forever()
  }
}
