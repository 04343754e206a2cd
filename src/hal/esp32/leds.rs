//! Green/red status LEDs on plain GPIO outputs.

use crate::state::LedPattern;
use crate::traits::StatusLeds;
use esp_idf_hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Indicator LED pair, active high.
pub struct Esp32Leds<'d, G, R>
where
    G: OutputPin,
    R: OutputPin,
{
    green: PinDriver<'d, G, Output>,
    red: PinDriver<'d, R, Output>,
    shown: Option<LedPattern>,
}

impl<'d, G, R> Esp32Leds<'d, G, R>
where
    G: OutputPin,
    R: OutputPin,
{
    /// Configures both pins as outputs, LEDs off.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        green_pin: impl Peripheral<P = G> + 'd,
        red_pin: impl Peripheral<P = R> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut leds = Self {
            green: PinDriver::output(green_pin)?,
            red: PinDriver::output(red_pin)?,
            shown: None,
        };
        leds.show(LedPattern::OFF)?;
        Ok(leds)
    }
}

impl<G, R> StatusLeds for Esp32Leds<'_, G, R>
where
    G: OutputPin,
    R: OutputPin,
{
    type Error = esp_idf_hal::sys::EspError;

    fn show(&mut self, pattern: LedPattern) -> Result<(), Self::Error> {
        if self.shown == Some(pattern) {
            return Ok(());
        }
        self.green.set_level(pattern.green.into())?;
        self.red.set_level(pattern.red.into())?;
        self.shown = Some(pattern);
        Ok(())
    }
}
