use esp_idf_svc::hal::i2c::I2cDriver;
use esp_idf_svc::sys::{esp_err_t, EspError, ESP_ERR_TIMEOUT, ESP_FAIL};
use station_core::bus::{receive_buffer, BusTransport, Bytes};
use station_core::BusError;
use std::cell::RefCell;
use std::rc::Rc;

/// I2C transaction timeout in RTOS ticks.
const I2C_TIMEOUT_TICKS: u32 = 100;

/// Handle to the I2C driver shared by every device on the bus.
///
/// The station and the display each hold a clone. All calls happen on the
/// main task, one transaction at a time.
#[derive(Clone)]
pub struct SharedI2c {
  /// The I2C driver.
  i2c: Rc<RefCell<I2cDriver<'static>>>,
}

/// The shared I2C implementation.
impl SharedI2c {
  /// Wrap an I2C driver.
  ///
  /// # Parameters
  /// - `i2c`: The I2C driver.
  ///
  /// # Returns
  /// The shared handle.
  pub fn new(i2c: I2cDriver<'static>) -> Self {
    Self { i2c: Rc::new(RefCell::new(i2c)) }
  }

  /// Write raw bytes to a device in a single transaction.
  ///
  /// # Parameters
  /// - `address`: The device address.
  /// - `bytes`: The bytes to write.
  ///
  /// # Returns
  /// The result of the operation.
  pub fn write_bytes(&self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
    self.i2c
      .borrow_mut()
      .write(address, bytes, I2C_TIMEOUT_TICKS)
      .map_err(|e| bus_error(address, e))
  }
}

impl BusTransport for SharedI2c {
  fn read(&mut self, address: u8, register: u8, len: usize) -> Result<Bytes, BusError> {
    let mut buffer = receive_buffer(address, len)?;

    self.i2c
      .borrow_mut()
      .write_read(address, &[register], &mut buffer, I2C_TIMEOUT_TICKS)
      .map_err(|e| bus_error(address, e))?;

    log::debug!("0x{:02x}[0x{:02x}] -> {:02x?}", address, register, buffer.as_slice());

    Ok(buffer)
  }

  fn write(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
    self.write_bytes(address, &[register, value])
  }

  fn command(&mut self, address: u8, command: u8) -> Result<(), BusError> {
    self.write_bytes(address, &[command])
  }

  fn receive(&mut self, address: u8, len: usize) -> Result<Bytes, BusError> {
    let mut buffer = receive_buffer(address, len)?;

    self.i2c
      .borrow_mut()
      .read(address, &mut buffer, I2C_TIMEOUT_TICKS)
      .map_err(|e| bus_error(address, e))?;

    Ok(buffer)
  }
}

/// Map an ESP-IDF driver error onto the bus error taxonomy.
///
/// # Parameters
/// - `address`: The device address.
/// - `error`: The ESP-IDF error.
///
/// # Returns
/// The bus error.
fn bus_error(address: u8, error: EspError) -> BusError {
  let code = error.code();

  if code == ESP_ERR_TIMEOUT as esp_err_t {
    BusError::Timeout { address }
  } else if code == ESP_FAIL as esp_err_t {
    // The legacy driver reports a missing ACK as a generic failure
    BusError::Nack { address }
  } else {
    BusError::Transfer {
      address,
      details: format!("{:?}", error),
    }
  }
}
