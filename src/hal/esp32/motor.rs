//! H-bridge latch motor implementation using ESP32 LEDC PWM.
//!
//! The bridge is controlled via two PWM signals:
//! - Input A (GPIO33): opening direction
//! - Input B (GPIO25): closing direction
//!
//! Control logic:
//! - Opening: A = duty, B = 0
//! - Closing: A = 0, B = duty
//! - Brake/hold: A = B = 255

use crate::config::MotorConfig;
use crate::motor::MotorCommand;
use crate::traits::MotorDriver;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Latch motor bridge for ESP32.
///
/// Uses the LEDC peripheral at the configured carrier frequency with 8-bit
/// resolution, so [`MotorCommand`] duties map one-to-one onto the hardware.
///
/// # Example
///
/// ```ignore
/// use rs_parcelbox::hal::esp32::Esp32Motor;
/// use rs_parcelbox::traits::MotorDriver;
///
/// let peripherals = Peripherals::take()?;
/// let mut motor = Esp32Motor::new(
///     peripherals.pins.gpio33,
///     peripherals.pins.gpio25,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.ledc.channel1,
///     &MotorConfig::default(),
/// )?;
///
/// motor.brake()?;
/// ```
pub struct Esp32Motor<'d> {
    /// Opening channel (bridge input A)
    a_pwm: LedcDriver<'d>,
    /// Closing channel (bridge input B)
    b_pwm: LedcDriver<'d>,
    /// Last command written, to skip redundant register writes
    current: Option<MotorCommand>,
}

impl<'d> Esp32Motor<'d> {
    /// PWM resolution (8-bit = 256 steps, matching `MotorCommand`)
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Creates a new motor bridge, braked.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    #[allow(clippy::too_many_arguments)]
    pub fn new<T, TI, AC, ACI, BC, BCI, AP, API, BP, BPI>(
        a_pin: AP,
        b_pin: BP,
        timer: T,
        a_channel: AC,
        b_channel: BC,
        config: &MotorConfig,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        ACI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        AC: Peripheral<P = ACI> + 'd,
        BCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        BC: Peripheral<P = BCI> + 'd,
        API: esp_idf_hal::gpio::OutputPin + 'd,
        AP: Peripheral<P = API> + 'd,
        BPI: esp_idf_hal::gpio::OutputPin + 'd,
        BP: Peripheral<P = BPI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(config.pwm_frequency_hz.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let a_pwm = LedcDriver::new(a_channel, &timer_driver, a_pin)?;
        let b_pwm = LedcDriver::new(b_channel, &timer_driver, b_pin)?;

        let mut motor = Self {
            a_pwm,
            b_pwm,
            current: None,
        };

        // Hold the latch from the first instant
        motor.set_duty(MotorCommand::BRAKE)?;

        Ok(motor)
    }

    /// Returns the last command written.
    #[inline]
    pub fn current(&self) -> Option<MotorCommand> {
        self.current
    }
}

impl MotorDriver for Esp32Motor<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_duty(&mut self, cmd: MotorCommand) -> Result<(), Self::Error> {
        if self.current == Some(cmd) {
            return Ok(());
        }

        // Both channels change inside one interrupt-free window so the
        // bridge never sees a half-applied command.
        let a_pwm = &mut self.a_pwm;
        let b_pwm = &mut self.b_pwm;
        esp_idf_hal::interrupt::free(|| {
            a_pwm.set_duty(cmd.channel_a as u32)?;
            b_pwm.set_duty(cmd.channel_b as u32)
        })?;

        self.current = Some(cmd);
        Ok(())
    }
}
