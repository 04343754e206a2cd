//! ESP32 parcel box controller.
//!
//! This is the main entry point for the physical box. It runs a 100Hz
//! control loop that:
//! - Samples the three door position switches
//! - Drains Wiegand frames captured by the reader interrupts
//! - Advances the mailbox state machine and the latch motor ramp
//! - Steps the confirmation melody on the buzzer
//! - Drives the green/red status LEDs
//! - Reports state changes and diagnostics on the console
//!
//! # Hardware Setup
//!
//! See [`rs_parcelbox::hal::esp32::pins`] for the GPIO assignments.
//!
//! # Build
//!
//! ```bash
//! # Credentials are baked in at compile time
//! OWNER_CODES='[{"code":"1A2B3C","label":"owner1"}]' \
//! DELIVERY_CODES='[{"code":"99AA","label":"courier"}]' \
//! MELODY=MARIO \
//! cargo build --release --features esp32 --bin esp32_main
//!
//! # Flash and monitor
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use esp_idf_hal::peripherals::Peripherals;
use rs_parcelbox::config::CredentialConfig;
use rs_parcelbox::hal::esp32::{
    install_wiegand_isr, Esp32Buzzer, Esp32Clock, Esp32Leds, Esp32Motor, Esp32Switch,
};
use rs_parcelbox::traits::{Clock, StatusLeds};
use rs_parcelbox::{
    encode_diagnostics, Config, CredentialLists, MailboxController, SwitchReadings, WiegandLines,
};
use std::thread;
use std::time::Duration;

/// Main loop interval in milliseconds (100Hz = 10ms)
const LOOP_INTERVAL_MS: u64 = 10;

/// Reader edges land here from the GPIO interrupts.
static WIEGAND: WiegandLines = WiegandLines::new();

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  rs-parcelbox Controller");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_credentials(
            CredentialConfig::default()
                .with_owner_codes(option_env!("OWNER_CODES").unwrap_or("[]"))
                .with_delivery_codes(option_env!("DELIVERY_CODES").unwrap_or("[]")),
        )
        .with_selected_melody(option_env!("MELODY").unwrap_or("NOKIA_TUNE"));
    config.validate()?;

    let credentials = match CredentialLists::from_config(&config.credentials) {
        Ok(lists) => {
            println!(
                "[OK] Credentials loaded ({} owner, {} delivery)",
                lists.owners().len(),
                lists.deliveries().len()
            );
            lists
        }
        Err(e) => {
            println!("[WARN] Credential lists rejected: {}", e);
            CredentialLists::new()
        }
    };

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize Motor (H-bridge on GPIO33/25)
    // =========================================================================
    let motor = Esp32Motor::new(
        peripherals.pins.gpio33,
        peripherals.pins.gpio25,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        &config.motor,
    )?;
    println!(
        "[OK] Motor initialized (GPIO33/25 PWM, {}Hz)",
        config.motor.pwm_frequency_hz
    );

    // =========================================================================
    // Initialize Buzzer (GPIO21) and LEDs (GPIO19/18)
    // =========================================================================
    let buzzer = Esp32Buzzer::new(
        peripherals.pins.gpio21,
        peripherals.ledc.timer1,
        peripherals.ledc.channel2,
    )?;
    println!("[OK] Buzzer initialized (GPIO21)");

    let mut leds = Esp32Leds::new(peripherals.pins.gpio19, peripherals.pins.gpio18)?;
    println!("[OK] LEDs initialized (GPIO19 green, GPIO18 red)");

    // =========================================================================
    // Initialize Position Switches (GPIO17/16/4)
    // =========================================================================
    let mut closed_switch = Esp32Switch::from_gpio(peripherals.pins.gpio17)?;
    let mut parcel_switch = Esp32Switch::from_gpio(peripherals.pins.gpio16)?;
    let mut mail_switch = Esp32Switch::from_gpio(peripherals.pins.gpio4)?;
    println!("[OK] Switches initialized (GPIO17 closed, GPIO16 parcel, GPIO4 mail)");

    // =========================================================================
    // Initialize Wiegand Reader (GPIO27/26)
    // =========================================================================
    install_wiegand_isr(&WIEGAND)?;
    println!("[OK] Wiegand reader initialized (GPIO27 D0, GPIO26 D1)");

    // =========================================================================
    // Initialize Clock and Controller
    // =========================================================================
    let clock = Esp32Clock::new();
    let mut controller = MailboxController::new(motor, buzzer, &WIEGAND, &config);

    // No network transport in this build; state changes and diagnostics
    // go to the console. An MqttBridge over a client plugs in here.
    println!("[SKIP] Network transport not built in, reporting on console");

    println!();
    println!("Melody: {}", config.selected_melody);
    println!("Starting control loop (100Hz)...");
    println!();

    // =========================================================================
    // Main Control Loop (100Hz)
    // =========================================================================
    loop {
        let now = clock.now_ms();

        let switches =
            SwitchReadings::sample(&mut closed_switch, &mut parcel_switch, &mut mail_switch);

        if let Err(e) = controller.tick(now, switches, &credentials) {
            log::error!("tick: {}", e);
        }

        if let Err(e) = leds.show(controller.indicators()) {
            log::error!("leds: {:?}", e);
        }

        let mut changed = false;
        while let Some(change) = controller.pop_event() {
            println!("State: {} -> {} ({})", change.from, change.to, change.attribution);
            changed = true;
        }
        if changed {
            if let Some(json) = encode_diagnostics(&controller.diagnostics()) {
                log::info!("diagnostics: {}", json);
            }
        }

        // Sleep until next tick
        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
