//! MQTT bridge tests: commands in, state payloads out.

#![cfg(feature = "serde-json-core")]

use rs_parcelbox::{
    hal::{MockBuzzer, MockMotor, MockMqtt},
    parse_state, Authorization, Config, MailboxController, MailboxState, MqttBridge, MqttConfig,
    SwitchReadings, WiegandLines,
};

const CLOSED: SwitchReadings = SwitchReadings {
    closed: true,
    parcel: false,
    mail: false,
};
const PARCEL: SwitchReadings = SwitchReadings {
    closed: false,
    parcel: true,
    mail: false,
};

fn deny(_: &str) -> Authorization {
    Authorization::Denied
}

fn published_states(bridge: &MqttBridge<MockMqtt>, topic: &str) -> Vec<(MailboxState, String)> {
    bridge
        .client()
        .published_to(topic)
        .into_iter()
        .map(|(_, payload, _)| {
            let msg = parse_state(payload).unwrap();
            (msg.state, msg.last_used.as_str().to_string())
        })
        .collect()
}

#[test]
fn parcel_cycle_over_mqtt() {
    let lines = WiegandLines::new();
    let config = Config::default();
    let mut controller =
        MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &config);
    let mut bridge = MqttBridge::new(MockMqtt::new(), config.mqtt.clone());

    bridge.sync_connection(&controller).unwrap();
    bridge
        .client_mut()
        .queue_message("paketkasten/command", b"OPEN_PARCEL".to_vec());

    for (now, switches) in [(0, CLOSED), (701, CLOSED), (900, PARCEL), (1901, PARCEL)] {
        controller.tick(now, switches, &deny).unwrap();
        bridge.poll(&mut controller, now).unwrap();
        bridge.publish_events(&mut controller).unwrap();
    }

    assert_eq!(
        published_states(&bridge, "paketkasten/state"),
        [
            (MailboxState::Locked, "unknown".to_string()),
            (MailboxState::PreOpeningToParcel, "mqtt".to_string()),
            (MailboxState::OpeningToParcel, "mqtt".to_string()),
            (MailboxState::ParcelOpen, "mqtt".to_string()),
            (MailboxState::Locking, "mqtt".to_string()),
        ]
    );
}

#[test]
fn custom_prefix_routes_topics() {
    let lines = WiegandLines::new();
    let mqtt = MqttConfig::default().with_topic_prefix("house/box");
    let config = Config::default().with_mqtt(mqtt);
    let mut controller =
        MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &config);
    let mut bridge = MqttBridge::new(MockMqtt::new(), config.mqtt.clone());

    bridge.sync_connection(&controller).unwrap();
    assert!(bridge.client().is_subscribed("house/box/command"));

    bridge
        .client_mut()
        .queue_message("paketkasten/command", b"OPEN_MAIL".to_vec());
    bridge
        .client_mut()
        .queue_message("house/box/command", b"OPEN_MAIL".to_vec());
    assert_eq!(bridge.poll(&mut controller, 0).unwrap(), 1);
    bridge.publish_events(&mut controller).unwrap();

    assert_eq!(bridge.client().published_to("house/box/state").len(), 2);
    assert!(bridge.client().published_to("paketkasten/state").is_empty());
}

#[test]
fn reset_command_over_mqtt() {
    let lines = WiegandLines::new();
    let config = Config::default();
    let mut controller =
        MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &config);
    let mut bridge = MqttBridge::new(MockMqtt::new(), config.mqtt.clone());

    controller.request_open(rs_parcelbox::DoorKind::Mail, "webinterface", 0).unwrap();
    controller.tick(701, CLOSED, &deny).unwrap();
    controller.tick(2701, CLOSED, &deny).unwrap();
    assert_eq!(controller.state(), MailboxState::MotorError);

    bridge.client_mut().queue_message("paketkasten/command", b"RESET".to_vec());
    assert_eq!(bridge.poll(&mut controller, 2800).unwrap(), 1);
    assert_eq!(controller.state(), MailboxState::Locking);
    // RESET does not overwrite who opened the box
    assert_eq!(controller.attribution(), "webinterface");
}
