mod bus;
mod device;
mod display;
mod error;

use crate::device::DeviceManager;
use crate::error::AppError;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::sys::link_patches;
use log::info;

/// This function initializes the system and hands control to the station.
///
/// # Returns
/// Only if a peripheral could not be set up.
fn main() -> Result<(), AppError> {
  // Initialize system
  link_patches();
  EspLogger::initialize_default();
  info!("Starting the environmental station...");

  let peripherals = Peripherals::take()
    .map_err(|_| AppError::PeripheralsError("Failed to acquire ESP32 peripherals".into()))?;

  // Initialize device manager and run the polling loop
  DeviceManager::new(peripherals)?.run()
}
