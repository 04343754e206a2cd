//! Door position microswitch with sample-count debouncing.
//!
//! Each switch closes to ground when the latch reaches its position, so the
//! pin reads low while engaged. The controller expects debounced readings;
//! a level only counts once it has been seen on consecutive polls.

use crate::traits::PositionSwitch;
use embedded_hal::digital::InputPin as DigitalInput;
use esp_idf_hal::gpio::{Input, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

/// Debounced active-low position switch.
///
/// Works over any `embedded-hal` input; [`from_gpio`](Esp32Switch::from_gpio)
/// builds one on an ESP32 pin with the internal pull-up.
///
/// # Example
///
/// ```ignore
/// use rs_parcelbox::hal::esp32::Esp32Switch;
/// use rs_parcelbox::traits::PositionSwitch;
///
/// let peripherals = Peripherals::take()?;
/// let mut closed = Esp32Switch::from_gpio(peripherals.pins.gpio17)?;
///
/// loop {
///     if closed.is_engaged() {
///         println!("latch closed");
///     }
///     std::thread::sleep(Duration::from_millis(10));
/// }
/// ```
pub struct Esp32Switch<P> {
    pin: P,
    /// Debounced level reported to callers
    stable: bool,
    /// Level seen on the last raw read
    candidate: bool,
    /// Consecutive reads that agreed with `candidate`
    count: u8,
}

impl<'d, T> Esp32Switch<PinDriver<'d, T, Input>>
where
    T: InputPin + OutputPin,
{
    /// Configures `pin` as input with the internal pull-up.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn from_gpio(pin: impl Peripheral<P = T> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        Ok(Self::new(driver))
    }
}

impl<P: DigitalInput> Esp32Switch<P> {
    /// Raw reads a new level needs before it is reported.
    ///
    /// At a 10ms poll this is a 30ms debounce window.
    pub const STABLE_SAMPLES: u8 = 3;

    /// Wraps an input. The initial level is taken as already stable.
    pub fn new(mut pin: P) -> Self {
        let level = Self::read(&mut pin);
        Self {
            pin,
            stable: level,
            candidate: level,
            count: Self::STABLE_SAMPLES,
        }
    }

    // Active low; a failed read counts as released
    fn read(pin: &mut P) -> bool {
        match pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                log::warn!("switch: read failed: {:?}", e);
                false
            }
        }
    }

    /// Takes one raw sample and returns the debounced level.
    fn sample(&mut self) -> bool {
        let raw = Self::read(&mut self.pin);

        if raw == self.candidate {
            self.count = self.count.saturating_add(1);
        } else {
            self.candidate = raw;
            self.count = 1;
        }

        if self.count >= Self::STABLE_SAMPLES {
            self.stable = self.candidate;
        }
        self.stable
    }
}

impl<P: DigitalInput> PositionSwitch for Esp32Switch<P> {
    fn is_engaged(&mut self) -> bool {
        self.sample()
    }
}
