//! Desktop simulation of a full delivery, driven by mock hardware.
//!
//! Walks the box through a courier swipe, the parcel door opening, the
//! dwell and the relock, then an MQTT `OPEN_MAIL`. Every state payload the
//! box would publish is printed, followed by the diagnostics snapshot.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example simulate
//! ```

use rs_parcelbox::hal::{MockBuzzer, MockClock, MockMotor, MockMqtt};
use rs_parcelbox::traits::Clock;
use rs_parcelbox::{
    encode_diagnostics, Config, CredentialConfig, CredentialLists, MailboxController, MqttBridge,
    SwitchReadings, WiegandLine, WiegandLines,
};

/// Simulation step in milliseconds, matching the firmware loop.
const STEP_MS: u64 = 10;

static WIEGAND: WiegandLines = WiegandLines::new();

/// Latch position the simulated mechanics report for a given motor state.
fn switches_at(state: rs_parcelbox::MailboxState, motor_ms: u64) -> SwitchReadings {
    use rs_parcelbox::MailboxState::*;

    // Travel takes 300ms in either direction
    let arrived = motor_ms >= 300;
    match state {
        Locked | PreOpeningToParcel | PreOpeningToMail => SwitchReadings {
            closed: true,
            ..Default::default()
        },
        OpeningToParcel | ParcelOpen => SwitchReadings {
            parcel: arrived || state == ParcelOpen,
            ..Default::default()
        },
        OpeningToMail | MailOpen => SwitchReadings {
            mail: arrived || state == MailOpen,
            ..Default::default()
        },
        Locking => SwitchReadings {
            closed: arrived,
            ..Default::default()
        },
        MotorError => SwitchReadings::default(),
    }
}

fn swipe(code: u32, bits: u8, at_ms: u64) {
    for i in (0..bits).rev() {
        let line = if (code >> i) & 1 == 1 {
            WiegandLine::One
        } else {
            WiegandLine::Zero
        };
        WIEGAND.on_edge(line, at_ms as u32);
    }
}

fn main() -> anyhow::Result<()> {
    println!("=================================");
    println!("  rs-parcelbox Simulation");
    println!("=================================");
    println!();

    let config = Config::default()
        .with_credentials(
            CredentialConfig::default()
                .with_owner_codes(r#"[{"code":"1A2B3C","label":"owner1"}]"#)
                .with_delivery_codes(r#"[{"code":"99AA","label":"courier"}]"#),
        )
        .with_selected_melody("INTEL_INSIDE");
    config.validate()?;

    let credentials = CredentialLists::from_config(&config.credentials)?;
    let mut controller =
        MailboxController::new(MockMotor::new(), MockBuzzer::new(), &WIEGAND, &config);
    let mut bridge = MqttBridge::new(MockMqtt::new(), config.mqtt.clone());
    let mut clock = MockClock::new();

    let mut last_state = controller.state();
    let mut moved_at = 0;

    let mut run_until = |until: u64,
                         controller: &mut MailboxController<'static, MockMotor, MockBuzzer>,
                         bridge: &mut MqttBridge<MockMqtt>,
                         clock: &mut MockClock|
     -> anyhow::Result<()> {
        while clock.now_ms() < until {
            let now = clock.now_ms();
            if controller.state() != last_state {
                last_state = controller.state();
                moved_at = now;
            }

            let switches = switches_at(controller.state(), now - moved_at);
            controller
                .tick(now, switches, &credentials)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            bridge.sync_connection(controller).map_err(|_| anyhow::anyhow!("mqtt"))?;
            bridge
                .poll(controller, now)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            bridge.publish_events(controller).map_err(|_| anyhow::anyhow!("mqtt"))?;

            clock.advance(STEP_MS);
        }
        Ok(())
    };

    println!("Courier swipes 0x99AA...");
    swipe(0x99AA, 16, clock.now_ms());
    run_until(4_000, &mut controller, &mut bridge, &mut clock)?;

    println!("MQTT OPEN_MAIL...");
    bridge
        .client_mut()
        .queue_message("paketkasten/command", b"OPEN_MAIL".to_vec());
    run_until(8_000, &mut controller, &mut bridge, &mut clock)?;

    println!();
    println!("Published:");
    for (topic, payload, _) in &bridge.client().published {
        println!("  {} {}", topic, String::from_utf8_lossy(payload));
    }

    println!();
    println!(
        "Buzzer played {} tones, motor got {} drive commands",
        controller.buzzer().tones.len(),
        controller.motor().drive_commands().count()
    );
    if let Some(json) = encode_diagnostics(&controller.diagnostics()) {
        println!("Diagnostics: {}", json);
    }

    Ok(())
}
