//! ESP32 hardware abstraction layer for the parcel box.
//!
//! This module provides hardware implementations for an ESP32 DevKit
//! driving the latch motor through a two-input H-bridge.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa dual core, 160MHz)
//! - **Motor Driver**: two-input H-bridge, both inputs high = brake
//! - **Reader**: Wiegand 26/34 keypad or RFID reader
//! - **Feedback**: passive buzzer, green and red LEDs
//! - **Door position**: three microswitches to ground
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod buzzer;
mod clock;
mod leds;
mod motor;
mod switch;
mod wiegand;

pub use buzzer::Esp32Buzzer;
pub use clock::Esp32Clock;
pub use leds::Esp32Leds;
pub use motor::Esp32Motor;
pub use switch::Esp32Switch;
pub use wiegand::install_wiegand_isr;

/// Pin assignments for the controller board.
pub mod pins {
    // =========================================================================
    // Motor Control (H-bridge)
    // =========================================================================

    /// Opening channel PWM (bridge input A)
    pub const MOTOR_A: i32 = 33;

    /// Closing channel PWM (bridge input B)
    pub const MOTOR_B: i32 = 25;

    // =========================================================================
    // Indicators
    // =========================================================================

    /// Green LED (door open)
    pub const LED_GREEN: i32 = 19;

    /// Red LED (motion, error)
    pub const LED_RED: i32 = 18;

    /// Passive buzzer
    pub const BUZZER: i32 = 21;

    // =========================================================================
    // Door Position Switches (active low, internal pull-up)
    // =========================================================================

    /// Latch closed
    pub const SWITCH_CLOSED: i32 = 17;

    /// Latch at parcel position
    pub const SWITCH_PARCEL: i32 = 16;

    /// Latch at mail position
    pub const SWITCH_MAIL: i32 = 4;

    // =========================================================================
    // Wiegand Reader
    // =========================================================================

    /// Wiegand D0 (falling edge = 0 bit)
    pub const WIEGAND_D0: i32 = 27;

    /// Wiegand D1 (falling edge = 1 bit)
    pub const WIEGAND_D1: i32 = 26;
}
