//! Soft-start duty ramp for the latch motor.
//!
//! Every motor move has the same three-part profile:
//!
//! ```text
//! duty
//!  ^
//!  | breakaway ─────┐
//!  |                 \   (linear decay)
//!  | target           └──────────────────
//!  +----------------+-----+-------------> elapsed
//!        full_power    ramp
//! ```
//!
//! The burst overcomes static friction in the latch, then the duty drops to
//! the configured steady value so the motor doesn't slam into the end stop.
//!
//! # Example
//!
//! ```rust
//! use rs_parcelbox::motor::MotorRamp;
//! use rs_parcelbox::{MailboxState, MotorCommand};
//!
//! let ramp = MotorRamp::default();
//!
//! // Breakaway burst on the opening channel
//! let cmd = ramp.command(MailboxState::OpeningToMail, 0);
//! assert_eq!(cmd, MotorCommand::drive_a(160));
//!
//! // Steady state after the ramp window
//! let cmd = ramp.command(MailboxState::OpeningToMail, 500);
//! assert_eq!(cmd, MotorCommand::drive_a(120));
//!
//! // Everything that isn't a move holds the brake
//! assert_eq!(ramp.command(MailboxState::MailOpen, 500), MotorCommand::BRAKE);
//! ```

use crate::config::MotorConfig;
use crate::state::MailboxState;

/// Duty values for the two bridge channels.
///
/// While driving, exactly one channel is non-zero. Both at 255 is the
/// brake/hold convention, never a simultaneous drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand {
    /// Opening channel duty (0-255).
    pub channel_a: u8,
    /// Closing channel duty (0-255).
    pub channel_b: u8,
}

impl MotorCommand {
    /// Both channels high: motor terminals shorted, position held.
    pub const BRAKE: MotorCommand = MotorCommand {
        channel_a: u8::MAX,
        channel_b: u8::MAX,
    };

    /// Drive the opening channel.
    #[inline]
    pub const fn drive_a(duty: u8) -> Self {
        Self {
            channel_a: duty,
            channel_b: 0,
        }
    }

    /// Drive the closing channel.
    #[inline]
    pub const fn drive_b(duty: u8) -> Self {
        Self {
            channel_a: 0,
            channel_b: duty,
        }
    }

    /// True for the brake/hold command.
    #[inline]
    pub fn is_brake(&self) -> bool {
        *self == Self::BRAKE
    }
}

/// Which way a move drives the latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorPhase {
    /// Releasing the latch (channel A, `duty_open`).
    Opening,
    /// Re-engaging the latch (channel B, `duty_close`).
    Closing,
    /// No move: hold the brake.
    Hold,
}

impl From<MailboxState> for MotorPhase {
    fn from(state: MailboxState) -> Self {
        match state {
            MailboxState::OpeningToParcel | MailboxState::OpeningToMail => MotorPhase::Opening,
            MailboxState::Locking => MotorPhase::Closing,
            MailboxState::Locked
            | MailboxState::PreOpeningToParcel
            | MailboxState::ParcelOpen
            | MailboxState::PreOpeningToMail
            | MailboxState::MailOpen
            | MailboxState::MotorError => MotorPhase::Hold,
        }
    }
}

/// Pure ramp calculator built from [`MotorConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotorRamp {
    duty_open: u8,
    duty_close: u8,
    breakaway_duty: u8,
    full_power_window_ms: u64,
    ramp_window_ms: u64,
}

impl Default for MotorRamp {
    fn default() -> Self {
        Self::new(&MotorConfig::default())
    }
}

impl MotorRamp {
    /// Build a ramp from motor configuration.
    pub fn new(config: &MotorConfig) -> Self {
        Self {
            duty_open: config.duty_open,
            duty_close: config.duty_close,
            breakaway_duty: config.breakaway_duty,
            full_power_window_ms: config.full_power_window_ms as u64,
            ramp_window_ms: config.ramp_window_ms as u64,
        }
    }

    /// Duty for one channel `elapsed_ms` into a move towards `target`.
    ///
    /// A target above the breakaway duty skips the burst: the breakaway is
    /// never allowed to be weaker than the steady state.
    pub fn duty(&self, target: u8, elapsed_ms: u64) -> u8 {
        let breakaway = self.breakaway_duty.max(target);

        if elapsed_ms < self.full_power_window_ms {
            return breakaway;
        }

        let into_ramp = elapsed_ms - self.full_power_window_ms;
        if into_ramp >= self.ramp_window_ms {
            return target;
        }

        let span = (breakaway - target) as u64;
        let drop = span * into_ramp / self.ramp_window_ms;
        breakaway - drop as u8
    }

    /// Full two-channel command for `phase` at `elapsed_ms` into the move.
    pub fn command_for(&self, phase: MotorPhase, elapsed_ms: u64) -> MotorCommand {
        match phase {
            MotorPhase::Opening => MotorCommand::drive_a(self.duty(self.duty_open, elapsed_ms)),
            MotorPhase::Closing => MotorCommand::drive_b(self.duty(self.duty_close, elapsed_ms)),
            MotorPhase::Hold => MotorCommand::BRAKE,
        }
    }

    /// Command for the given mailbox state.
    #[inline]
    pub fn command(&self, state: MailboxState, elapsed_ms: u64) -> MotorCommand {
        self.command_for(MotorPhase::from(state), elapsed_ms)
    }

    /// Time after which the duty has settled at the target.
    #[inline]
    pub fn settle_ms(&self) -> u64 {
        self.full_power_window_ms + self.ramp_window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(full_power: u32, ramp: u32) -> MotorRamp {
        MotorRamp::new(
            &MotorConfig::default()
                .with_full_power_window_ms(full_power)
                .with_ramp_window_ms(ramp),
        )
    }

    #[test]
    fn breakaway_at_zero_elapsed() {
        let r = MotorRamp::default();
        assert_eq!(r.duty(120, 0), 160);
        assert_eq!(r.duty(90, 99), 160);
    }

    #[test]
    fn target_exactly_at_settle_time() {
        let r = MotorRamp::default();
        assert_eq!(r.settle_ms(), 110);
        assert_eq!(r.duty(120, 110), 120);
        assert_eq!(r.duty(90, 110), 90);
        assert_eq!(r.duty(90, 10_000), 90);
    }

    #[test]
    fn ramp_is_non_increasing() {
        let r = ramp(100, 50);
        let mut previous = u8::MAX;
        for elapsed in 0..=200 {
            let duty = r.duty(40, elapsed);
            assert!(duty <= previous, "duty rose at {elapsed}ms");
            assert!(duty >= 40);
            previous = duty;
        }
    }

    #[test]
    fn ramp_midpoint_is_halfway() {
        let r = ramp(100, 40);
        // breakaway 160, target 120: halfway through the ramp is 140
        assert_eq!(r.duty(120, 120), 140);
    }

    #[test]
    fn zero_windows_go_straight_to_target() {
        let r = ramp(0, 0);
        assert_eq!(r.duty(120, 0), 120);
    }

    #[test]
    fn target_above_breakaway_holds_target() {
        let r = MotorRamp::default();
        assert_eq!(r.duty(200, 0), 200);
        assert_eq!(r.duty(200, 105), 200);
        assert_eq!(r.duty(200, 500), 200);
    }

    #[test]
    fn opening_and_closing_use_opposite_channels() {
        let r = MotorRamp::default();
        let open = r.command(MailboxState::OpeningToParcel, 500);
        let close = r.command(MailboxState::Locking, 500);
        assert_eq!(open, MotorCommand::drive_a(120));
        assert_eq!(close, MotorCommand::drive_b(90));
    }

    #[test]
    fn non_driving_states_brake() {
        let r = MotorRamp::default();
        for state in MailboxState::ALL {
            let cmd = r.command(state, 0);
            if state.is_motor_driving() {
                assert!(!cmd.is_brake());
                assert!(cmd.channel_a == 0 || cmd.channel_b == 0);
            } else {
                assert_eq!(cmd, MotorCommand::BRAKE);
            }
        }
    }
}
