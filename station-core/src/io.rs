//! Display, button and indicator seams implemented by the firmware.

use crate::error::DisplayError;

/// Monochrome text display.
pub trait DisplaySurface {
    /// Send the controller's power-up configuration.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Blank the frame buffer. Nothing is visible until [`flush`](Self::flush).
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw `text` with its top-left corner at (`x`, `y`) pixels.
    fn draw_text(&mut self, text: &str, x: u16, y: u16) -> Result<(), DisplayError>;

    /// Push the frame buffer to the panel.
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Set panel contrast.
    fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Put the panel to sleep (`true`) or wake it (`false`).
    fn sleep(&mut self, enabled: bool) -> Result<(), DisplayError>;
}

/// Digital input sampled once per call.
pub trait DigitalInput {
    /// `true` while the input is asserted. Implementations hide the
    /// electrical polarity of the pin.
    fn read_level(&mut self) -> bool;
}

/// Single-pixel colour indicator. Purely cosmetic, so it cannot fail.
pub trait StatusIndicator {
    fn set_color(&mut self, r: u8, g: u8, b: u8);
}
