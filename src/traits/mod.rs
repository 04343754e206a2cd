//! Trait definitions for hardware and network abstraction.
//!
//! This module defines the seams that allow rs-parcelbox to:
//! - Run on the ESP32 or against desktop mocks
//! - Hand state changes to whatever MQTT transport the firmware uses
//!
//! # Submodules
//!
//! - `hardware`: Motor bridge, buzzer, door switches, LEDs, clock
//! - `network`: MQTT client trait
//!
//! # Hardware Abstraction
//!
//! - [`MotorDriver`]: Two-channel PWM latch motor
//! - [`Buzzer`]: Tone output for melodies
//! - [`PositionSwitch`]: Pre-debounced door position input
//! - [`StatusLeds`]: Green/red indicator pair
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
