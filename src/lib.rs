//! # rs-parcelbox
//!
//! Controller for a motorized parcel/mail box: a latch motor on an H-bridge,
//! three door position switches, a Wiegand keypad/RFID reader, a buzzer for
//! confirmation melodies, and MQTT control.
//!
//! ## Features
//!
//! - **State machine**: Locked, pre-opening, opening, open, locking and motor error
//! - **Soft-start motor drive**: Breakaway burst, linear ramp, brake-to-hold
//! - **Credential reader**: Interrupt-safe Wiegand bit capture with quiet-period framing
//! - **Melodies**: Non-blocking tone sequencer with a selectable built-in set
//! - **Remote control**: MQTT command topic and state publishing (serde-json-core)
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `state` - Mailbox states and LED patterns
//! - `motor` - Duty commands and the soft-start ramp
//! - `wiegand` - Reader bit capture and frame decoding
//! - `credentials` - Owner/delivery code lists
//! - `melody` - Melody tables and the tone sequencer
//! - `mailbox` - Main controller that ties everything together
//! - `bridge` - MQTT command/state routing
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_parcelbox::{
//!     config::Config, hal::{MockBuzzer, MockMotor}, wiegand::{WiegandLine, WiegandLines},
//!     CredentialLists, MailboxController, MailboxState, SwitchReadings,
//! };
//!
//! let lines = WiegandLines::new();
//! let credentials = CredentialLists::new().with_owner("1A2B", "owner1");
//! let mut controller =
//!     MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &Config::default());
//! let closed = SwitchReadings { closed: true, ..Default::default() };
//!
//! // The reader interrupt shifts in 0x1A2B, MSB first
//! for i in (0..16).rev() {
//!     let line = if (0x1A2B >> i) & 1 == 1 { WiegandLine::One } else { WiegandLine::Zero };
//!     lines.on_edge(line, 0);
//! }
//!
//! // After the quiet period the frame is matched against the owner list
//! controller.tick(100, closed, &credentials).unwrap();
//! assert_eq!(controller.state(), MailboxState::PreOpeningToMail);
//! assert_eq!(controller.attribution(), "owner1");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Remote command types and request outcomes.
pub mod commands;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// The mailbox controller state machine.
pub mod mailbox;
/// Built-in melodies and the non-blocking tone sequencer.
pub mod melody;
/// Motor duty commands and the soft-start ramp.
pub mod motor;
/// Mailbox states and indicator patterns.
pub mod state;
/// Core traits for hardware and network abstraction.
pub mod traits;
/// Wiegand reader bit capture and frame decoding.
pub mod wiegand;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Owner and delivery credential lists.
pub mod credentials;

/// Shared message types for MQTT and the web interface (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// MQTT bridge between a client and the controller.
#[cfg(feature = "serde-json-core")]
pub mod bridge;

// Re-exports for convenience
pub use commands::{CommandOutcome, CommandSource, RejectReason, RemoteCommand};
pub use credentials::{Authorization, CredentialAuthorizer, CredentialError, CredentialLists};
pub use mailbox::{Diagnostics, HardwareError, MailboxController, StateChange, SwitchReadings};
pub use melody::{MelodyId, ToneEvent};
pub use motor::{MotorCommand, MotorRamp};
pub use state::{DoorKind, LedPattern, MailboxState};
pub use traits::{
    // Hardware
    Buzzer,
    Clock,
    MotorDriver,
    // Network
    MqttClient,
    MqttMessage,
    PositionSwitch,
    StatusLeds,
};
pub use wiegand::{CredentialFrame, WiegandDecoder, WiegandLine, WiegandLines};

// Config re-exports
pub use config::{
    Config, ConfigError, CredentialConfig, MotorConfig, MqttConfig, TimingConfig, WiegandConfig,
};

// Message re-exports (for MQTT/web payloads)
#[cfg(feature = "serde")]
pub use messages::StateMessage;

#[cfg(feature = "serde-json-core")]
pub use bridge::MqttBridge;
#[cfg(feature = "serde-json-core")]
pub use messages::{encode_diagnostics, encode_state, parse_state};
