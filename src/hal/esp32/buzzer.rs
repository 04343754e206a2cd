//! Passive buzzer on a dedicated LEDC timer.
//!
//! The tone is set by retuning the timer frequency; the channel duty
//! toggles between 50% (sounding) and 0 (silent).

use crate::traits::Buzzer;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::{self, esp};

/// Buzzer output for ESP32.
///
/// Must be given LEDC timer 1; timer 0 runs the motor carrier.
pub struct Esp32Buzzer<'d> {
    pwm: LedcDriver<'d>,
    frequency_hz: Option<u16>,
}

impl<'d> Esp32Buzzer<'d> {
    /// Frequency the timer is configured with before the first tone.
    const IDLE_FREQUENCY_HZ: u32 = 1_000;

    /// 50% duty at 8-bit resolution.
    const TONE_DUTY: u32 = 128;

    /// Creates a silent buzzer.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(
        pin: P,
        timer: T,
        channel: C,
    ) -> Result<Self, sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::IDLE_FREQUENCY_HZ.Hz())
            .resolution(Resolution::Bits8);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let mut pwm = LedcDriver::new(channel, &timer_driver, pin)?;
        pwm.set_duty(0)?;

        Ok(Self {
            pwm,
            frequency_hz: None,
        })
    }

    /// Tone currently sounding.
    #[inline]
    pub fn frequency_hz(&self) -> Option<u16> {
        self.frequency_hz
    }
}

impl Buzzer for Esp32Buzzer<'_> {
    type Error = sys::EspError;

    fn play_tone(&mut self, frequency_hz: u16, _duration_ms: u32) -> Result<(), Self::Error> {
        if self.frequency_hz != Some(frequency_hz) {
            // Safe: plain register update on a timer this driver configured
            esp!(unsafe {
                sys::ledc_set_freq(
                    sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    sys::ledc_timer_t_LEDC_TIMER_1,
                    frequency_hz as u32,
                )
            })?;
        }
        self.pwm.set_duty(Self::TONE_DUTY)?;
        self.frequency_hz = Some(frequency_hz);
        Ok(())
    }

    fn silence(&mut self) -> Result<(), Self::Error> {
        self.pwm.set_duty(0)?;
        self.frequency_hz = None;
        Ok(())
    }
}
