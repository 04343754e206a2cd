//! Hardware abstraction traits for the motor bridge, buzzer, door switches and LEDs.
//!
//! These are the only seams between the mailbox controller and the board it
//! runs on. Everything above them is plain, testable logic.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorDriver`] | Two-channel PWM H-bridge for the latch motor |
//! | [`Buzzer`] | Passive piezo buzzer for melodies |
//! | [`PositionSwitch`] | Pre-debounced door position switch |
//! | [`StatusLeds`] | Green/red indicator LEDs |
//! | [`Clock`] | Monotonic millisecond time source |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_parcelbox::traits::MotorDriver;
//! use rs_parcelbox::hal::MockMotor;
//! use rs_parcelbox::MotorCommand;
//!
//! let mut motor = MockMotor::new();
//! motor.set_duty(MotorCommand::drive_a(120)).unwrap();
//! assert_eq!(motor.last, Some(MotorCommand::drive_a(120)));
//!
//! motor.brake().unwrap();
//! assert_eq!(motor.last, Some(MotorCommand::BRAKE));
//! ```

use crate::motor::MotorCommand;
use crate::state::LedPattern;

/// Two-channel PWM motor driver.
///
/// Channel A drives the latch open, channel B drives it closed. Both
/// channels at full duty is the brake convention: the bridge shorts the
/// motor terminals and holds position against the door spring.
///
/// # Implementation Notes
///
/// - Writes should be as short as possible; the controller calls this every tick
/// - Never drive both channels with partial duty at the same time
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_parcelbox::traits::MotorDriver;
/// use rs_parcelbox::MotorCommand;
///
/// struct MyBridge { /* pwm handles */ }
///
/// impl MotorDriver for MyBridge {
///     type Error = ();
///
///     fn set_duty(&mut self, cmd: MotorCommand) -> Result<(), ()> {
///         // write cmd.channel_a and cmd.channel_b to the PWM compare registers
///         Ok(())
///     }
/// }
/// ```
pub trait MotorDriver {
    /// Error type for motor operations.
    type Error;

    /// Apply a two-channel duty command.
    fn set_duty(&mut self, cmd: MotorCommand) -> Result<(), Self::Error>;

    /// Convenience method to hold the motor braked.
    fn brake(&mut self) -> Result<(), Self::Error> {
        self.set_duty(MotorCommand::BRAKE)
    }
}

/// Passive buzzer driven with a square wave.
///
/// The sequencer only ever asks for one tone at a time and silences the
/// output between notes, so implementations need no queueing.
pub trait Buzzer {
    /// Error type for buzzer operations.
    type Error;

    /// Start emitting `frequency_hz` for roughly `duration_ms`.
    ///
    /// The controller always follows up with [`silence`](Self::silence),
    /// so implementations may ignore the duration and tone until told to stop.
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) -> Result<(), Self::Error>;

    /// Stop any tone currently playing.
    fn silence(&mut self) -> Result<(), Self::Error>;
}

/// A single door position switch.
///
/// Readings must already be debounced: the controller treats every
/// change as a real mechanical edge.
pub trait PositionSwitch {
    /// Returns true while the switch is engaged by the door/latch.
    fn is_engaged(&mut self) -> bool;
}

/// Green/red status LED pair.
pub trait StatusLeds {
    /// Error type for LED operations.
    type Error;

    /// Drive both LEDs to the given pattern.
    fn show(&mut self, pattern: LedPattern) -> Result<(), Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for every timeout in the
/// controller. On desktop, this can wrap `std::time::Instant`. On
/// embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_parcelbox::traits::Clock;
/// use rs_parcelbox::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestMotor {
        writes: usize,
        last: Option<MotorCommand>,
    }

    impl MotorDriver for TestMotor {
        type Error = ();

        fn set_duty(&mut self, cmd: MotorCommand) -> Result<(), ()> {
            self.writes += 1;
            self.last = Some(cmd);
            Ok(())
        }
    }

    #[test]
    fn motor_driver_brake_default_impl() {
        let mut motor = TestMotor {
            writes: 0,
            last: None,
        };
        motor.set_duty(MotorCommand::drive_b(90)).unwrap();
        motor.brake().unwrap();

        assert_eq!(motor.writes, 2);
        assert_eq!(motor.last, Some(MotorCommand::BRAKE));
    }

    struct StuckSwitch(bool);

    impl PositionSwitch for StuckSwitch {
        fn is_engaged(&mut self) -> bool {
            self.0
        }
    }

    #[test]
    fn position_switch_reports_level() {
        let mut engaged = StuckSwitch(true);
        let mut released = StuckSwitch(false);
        assert!(engaged.is_engaged());
        assert!(!released.is_engaged());
    }
}
