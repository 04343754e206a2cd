//! Board implementations of the [`crate::traits`] seams.
//!
//! - `mock`: recording doubles for tests, the simulation demo and desktop work
//! - `esp32`: ESP32 DevKit with H-bridge latch motor, buzzer, LEDs, door
//!   switches and Wiegand reader (requires the `esp32` feature)
//!
//! The mocks are always compiled so integration tests and doc examples can
//! drive a [`MailboxController`](crate::MailboxController) without hardware.

pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;
