use crate::bus::SharedI2c;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use station_core::bus::BusTransport;
use station_core::io::DisplaySurface;
use station_core::DisplayError;
use std::convert::Infallible;

/// SH1106 I2C address.
pub const SH1106_ADDRESS: u8 = 0x3c;

/// Visible width in pixels.
const DISPLAY_WIDTH: usize = 128;

/// Visible height in pixels.
const DISPLAY_HEIGHT: usize = 64;

/// Number of 8-pixel pages.
const PAGES: usize = DISPLAY_HEIGHT / 8;

/// The SH1106 has 132 columns of RAM; the visible 128 start at column 2.
const COLUMN_OFFSET: u8 = 2;

/// Control byte announcing a command.
const CONTROL_COMMAND: u8 = 0x00;

/// Control byte announcing display data.
const CONTROL_DATA: u8 = 0x40;

/// Reset pulse width in milliseconds.
const RESET_PULSE_MS: u32 = 10;

/// Initialization sequence. The panel stays off until it is woken.
const INIT_SEQUENCE: &[u8] = &[
  0xae, // display off
  0xd5, // set display clock
  0x80, //
  0xa8, // set multiplex ratio
  0x3f, //
  0xd3, // set display offset
  0x00, // no offset
  0x40, // set start line
  0xad, // dc-dc control
  0x8b, // dc-dc on
  0xa1, // segment remap
  0xc8, // com scan direction
  0xda, // set com pins
  0x12, //
  0x81, // set contrast
  0x80, //
  0xd9, // set precharge
  0x22, //
  0xdb, // set vcom detect
  0x35, //
  0x32, // pump voltage 8.0 V
  0xa4, // display all on resume
  0xa6, // normal display
];

/// One bit per pixel, laid out in the controller's page order: byte
/// `page * 128 + x` holds rows `page * 8 .. page * 8 + 8` of column `x`.
struct PageBuffer([u8; DISPLAY_WIDTH * PAGES]);

impl PageBuffer {
  fn page(&self, page: usize) -> &[u8] {
    &self.0[page * DISPLAY_WIDTH..(page + 1) * DISPLAY_WIDTH]
  }
}

impl OriginDimensions for PageBuffer {
  fn size(&self) -> Size {
    Size::new(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32)
  }
}

impl DrawTarget for PageBuffer {
  type Color = BinaryColor;
  type Error = Infallible;

  fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
  where
    I: IntoIterator<Item = Pixel<Self::Color>>,
  {
    for Pixel(point, color) in pixels {
      let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
        continue;
      };

      if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
        continue;
      }

      let byte = &mut self.0[(y / 8) * DISPLAY_WIDTH + x];
      let mask = 1u8 << (y % 8);

      if color.is_on() {
        *byte |= mask;
      } else {
        *byte &= !mask;
      }
    }

    Ok(())
  }
}

/// SH1106 display interface.
pub struct Sh1106Display {
  /// The shared I2C bus.
  i2c: SharedI2c,

  /// The reset line, if the module has one wired.
  reset: Option<PinDriver<'static, AnyOutputPin, Output>>,

  /// The frame being drawn.
  buffer: PageBuffer,
}

/// The SH1106 display implementation.
impl Sh1106Display {
  /// Create a new SH1106 display. Nothing is sent until `init`.
  ///
  /// # Parameters
  /// - `i2c`: The shared I2C bus.
  /// - `reset`: The reset line.
  ///
  /// # Returns
  /// The SH1106 display.
  pub fn new(i2c: SharedI2c, reset: Option<PinDriver<'static, AnyOutputPin, Output>>) -> Self {
    Self {
      i2c,
      reset,
      buffer: PageBuffer([0; DISPLAY_WIDTH * PAGES]),
    }
  }

  /// Pulse the reset line low.
  ///
  /// # Returns
  /// The result of the operation.
  fn hardware_reset(&mut self) -> Result<(), DisplayError> {
    let Some(reset) = self.reset.as_mut() else {
      return Ok(());
    };

    let driver_error = |e: EspError| DisplayError::Driver(format!("Failed to drive reset line: {:?}", e));

    reset.set_high().map_err(driver_error)?;
    FreeRtos::delay_ms(1);
    reset.set_low().map_err(driver_error)?;
    FreeRtos::delay_ms(RESET_PULSE_MS);
    reset.set_high().map_err(driver_error)?;
    FreeRtos::delay_ms(RESET_PULSE_MS);

    Ok(())
  }

  /// Write a command to the display.
  ///
  /// # Parameters
  /// - `cmd`: The command.
  ///
  /// # Returns
  /// The result of the operation.
  fn write_command(&mut self, cmd: u8) -> Result<(), DisplayError> {
    self.i2c.write(SH1106_ADDRESS, CONTROL_COMMAND, cmd)?;

    Ok(())
  }

  /// Set the cursor to the first visible column of a page.
  ///
  /// # Parameters
  /// - `page`: The page.
  ///
  /// # Returns
  /// The result of the operation.
  fn set_page(&mut self, page: u8) -> Result<(), DisplayError> {
    self.write_command(0xb0 | page)?; // Set page
    self.write_command(COLUMN_OFFSET & 0xf)?; // Set lower column start address
    self.write_command(0x10 | (COLUMN_OFFSET >> 4))?; // Set higher column start address

    Ok(())
  }
}

impl DisplaySurface for Sh1106Display {
  fn init(&mut self) -> Result<(), DisplayError> {
    self.hardware_reset()?;

    for &cmd in INIT_SEQUENCE {
      self.write_command(cmd)?;
    }

    Ok(())
  }

  fn clear(&mut self) -> Result<(), DisplayError> {
    self.buffer.0.fill(0);

    Ok(())
  }

  fn draw_text(&mut self, text: &str, x: u16, y: u16) -> Result<(), DisplayError> {
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let origin = Point::new(i32::from(x), i32::from(y));

    match Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut self.buffer) {
      Ok(_) => Ok(()),
      Err(never) => match never {},
    }
  }

  fn flush(&mut self) -> Result<(), DisplayError> {
    let mut transfer = [0u8; DISPLAY_WIDTH + 1];
    transfer[0] = CONTROL_DATA;

    for page in 0..PAGES {
      self.set_page(page as u8)?;

      transfer[1..].copy_from_slice(self.buffer.page(page));
      self.i2c.write_bytes(SH1106_ADDRESS, &transfer)?;
    }

    Ok(())
  }

  fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError> {
    self.write_command(0x81)?;
    self.write_command(level)
  }

  fn sleep(&mut self, enabled: bool) -> Result<(), DisplayError> {
    self.write_command(if enabled { 0xae } else { 0xaf })
  }
}
