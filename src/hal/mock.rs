//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without the box attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockMotor`] | [`MotorDriver`] | Records every duty command |
//! | [`MockBuzzer`] | [`Buzzer`] | Records tones and silences |
//! | [`MockSwitch`] | [`PositionSwitch`] | Settable switch level |
//! | [`MockLeds`] | [`StatusLeds`] | Tracks the shown pattern |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//!
//! # Example
//!
//! ```rust
//! use rs_parcelbox::hal::{MockBuzzer, MockMotor};
//! use rs_parcelbox::{config::Config, wiegand::WiegandLines, Authorization};
//! use rs_parcelbox::{MailboxController, MotorCommand, SwitchReadings};
//!
//! let lines = WiegandLines::new();
//! let mut controller =
//!     MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &Config::default());
//!
//! controller
//!     .tick(0, SwitchReadings::default(), &|_: &str| Authorization::Denied)
//!     .unwrap();
//!
//! // Verify via the mock's public fields
//! assert_eq!(controller.motor().last, Some(MotorCommand::BRAKE));
//! ```
//!
//! [`MotorDriver`]: crate::traits::MotorDriver
//! [`Buzzer`]: crate::traits::Buzzer
//! [`PositionSwitch`]: crate::traits::PositionSwitch
//! [`StatusLeds`]: crate::traits::StatusLeds
//! [`Clock`]: crate::traits::Clock
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::motor::MotorCommand;
use crate::state::LedPattern;
use crate::traits::{Buzzer, Clock, MotorDriver, MqttClient, MqttMessage, PositionSwitch, StatusLeds};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock motor bridge for testing.
///
/// Records every command for verification. Use the public fields to inspect
/// state after test operations.
///
/// # Example
///
/// ```rust
/// use rs_parcelbox::hal::MockMotor;
/// use rs_parcelbox::traits::MotorDriver;
/// use rs_parcelbox::MotorCommand;
///
/// let mut motor = MockMotor::new();
/// motor.set_duty(MotorCommand::drive_b(90)).unwrap();
/// motor.brake().unwrap();
///
/// assert_eq!(motor.last, Some(MotorCommand::BRAKE));
/// assert_eq!(motor.history.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockMotor {
    /// Most recent command.
    pub last: Option<MotorCommand>,
    /// Every command, oldest first.
    pub history: Vec<MotorCommand>,
}

impl MockMotor {
    /// Creates a new mock motor with no commands recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands that drove a channel (anything but the brake).
    pub fn drive_commands(&self) -> impl Iterator<Item = &MotorCommand> {
        self.history.iter().filter(|cmd| !cmd.is_brake())
    }
}

impl MotorDriver for MockMotor {
    type Error = ();

    fn set_duty(&mut self, cmd: MotorCommand) -> Result<(), ()> {
        self.last = Some(cmd);
        self.history.push(cmd);
        Ok(())
    }
}

/// Mock buzzer for testing.
///
/// # Example
///
/// ```rust
/// use rs_parcelbox::hal::MockBuzzer;
/// use rs_parcelbox::traits::Buzzer;
///
/// let mut buzzer = MockBuzzer::new();
/// buzzer.play_tone(440, 250).unwrap();
/// assert_eq!(buzzer.frequency_hz, Some(440));
///
/// buzzer.silence().unwrap();
/// assert_eq!(buzzer.frequency_hz, None);
/// assert_eq!(buzzer.tones, [(440, 250)]);
/// ```
#[derive(Debug, Default)]
pub struct MockBuzzer {
    /// Tone currently sounding, if any.
    pub frequency_hz: Option<u16>,
    /// Every `(frequency, duration)` played, oldest first.
    pub tones: Vec<(u16, u32)>,
    /// Number of `silence` calls.
    pub silences: usize,
}

impl MockBuzzer {
    /// Creates a silent mock buzzer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Buzzer for MockBuzzer {
    type Error = ();

    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) -> Result<(), ()> {
        self.frequency_hz = Some(frequency_hz);
        self.tones.push((frequency_hz, duration_ms));
        Ok(())
    }

    fn silence(&mut self) -> Result<(), ()> {
        self.frequency_hz = None;
        self.silences += 1;
        Ok(())
    }
}

/// Mock position switch with a settable level.
///
/// ```rust
/// use rs_parcelbox::hal::MockSwitch;
/// use rs_parcelbox::traits::PositionSwitch;
///
/// let mut switch = MockSwitch::new(false);
/// assert!(!switch.is_engaged());
/// switch.engaged = true;
/// assert!(switch.is_engaged());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSwitch {
    /// Current level.
    pub engaged: bool,
}

impl MockSwitch {
    /// Creates a switch at the given level.
    pub fn new(engaged: bool) -> Self {
        Self { engaged }
    }
}

impl PositionSwitch for MockSwitch {
    fn is_engaged(&mut self) -> bool {
        self.engaged
    }
}

/// Mock indicator LEDs.
#[derive(Debug, Default)]
pub struct MockLeds {
    /// Pattern currently shown.
    pub pattern: LedPattern,
    /// Number of `show` calls.
    pub updates: usize,
}

impl MockLeds {
    /// Creates dark LEDs.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusLeds for MockLeds {
    type Error = ();

    fn show(&mut self, pattern: LedPattern) -> Result<(), ()> {
        self.pattern = pattern;
        self.updates += 1;
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_parcelbox::hal::MockClock;
/// use rs_parcelbox::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use rs_parcelbox::hal::MockMqtt;
/// use rs_parcelbox::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("paketkasten/command", b"OPEN_MAIL".to_vec());
/// assert_eq!(mqtt.try_recv().unwrap().payload_str(), Some("OPEN_MAIL"));
///
/// // Check published messages
/// mqtt.publish("paketkasten/state", b"{}", false).unwrap();
/// assert_eq!(mqtt.published_to("paketkasten/state").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
