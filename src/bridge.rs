//! MQTT bridge between a [`MqttClient`] and the [`MailboxController`].
//!
//! The bridge owns the client and knows the topic layout; the controller
//! stays unaware of MQTT. Call it from the main loop:
//!
//! ```ignore
//! let mut bridge = MqttBridge::new(client, config.mqtt.clone());
//!
//! loop {
//!     controller.tick(now, switches, &credentials)?;
//!     bridge.sync_connection(&controller)?;   // subscribe + full publish after (re)connect
//!     bridge.poll(&mut controller, now)?;     // apply OPEN_PARCEL / OPEN_MAIL / CLOSE / RESET
//!     bridge.publish_events(&mut controller)?; // one state message per transition
//! }
//! ```

use crate::commands::{CommandSource, RemoteCommand};
use crate::config::MqttConfig;
use crate::mailbox::{HardwareError, MailboxController};
use crate::messages::{encode_state, StateMessage};
use crate::traits::{Buzzer, MotorDriver, MqttClient};

// ============================================================================
// MQTT Bridge
// ============================================================================

/// Routes MQTT commands into the controller and publishes its state changes.
pub struct MqttBridge<C: MqttClient> {
    client: C,
    config: MqttConfig,
    was_connected: bool,
}

impl<C: MqttClient> MqttBridge<C> {
    /// Create a bridge. Nothing is sent until [`sync_connection`](Self::sync_connection).
    pub fn new(client: C, config: MqttConfig) -> Self {
        Self {
            client,
            config,
            was_connected: false,
        }
    }

    /// Get a reference to the MQTT client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get a mutable reference to the MQTT client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Subscribe and publish the full state after every (re)connect.
    ///
    /// Returns `true` if a (re)connect was handled on this call.
    pub fn sync_connection<M, B>(
        &mut self,
        controller: &MailboxController<'_, M, B>,
    ) -> Result<bool, C::Error>
    where
        M: MotorDriver,
        B: Buzzer,
    {
        let connected = self.client.is_connected();
        let fresh = connected && !self.was_connected;
        self.was_connected = connected;

        if !fresh {
            return Ok(false);
        }

        log::info!("mqtt: connected, subscribing to {}", self.config.topic("command"));
        self.client.subscribe(&self.config.topic("command"))?;
        let msg = StateMessage::new(controller.state(), controller.attribution());
        self.publish_state(&msg)?;
        Ok(true)
    }

    /// Apply every pending command message. Returns how many were accepted.
    ///
    /// Unknown payloads and messages on other topics are logged and dropped.
    pub fn poll<M, B>(
        &mut self,
        controller: &mut MailboxController<'_, M, B>,
        now_ms: u64,
    ) -> Result<usize, HardwareError<M::Error, B::Error>>
    where
        M: MotorDriver,
        B: Buzzer,
    {
        let command_topic = self.config.topic("command");
        let mut accepted = 0;

        while let Some(msg) = self.client.try_recv() {
            if msg.topic != command_topic.as_str() {
                log::debug!("mqtt: ignoring message on {}", msg.topic);
                continue;
            }

            let Some(cmd) = msg.payload_str().and_then(RemoteCommand::from_payload) else {
                log::warn!("mqtt: unknown command {:?}", msg.payload_str());
                continue;
            };

            let outcome = controller.apply(cmd, CommandSource::Mqtt, now_ms)?;
            if outcome.is_accepted() {
                accepted += 1;
            } else {
                log::info!("mqtt: {} not applied: {:?}", cmd.as_payload(), outcome);
            }
        }

        Ok(accepted)
    }

    /// Publish one state message per queued transition.
    ///
    /// While disconnected the queue is drained without publishing; the next
    /// [`sync_connection`](Self::sync_connection) sends the current state.
    pub fn publish_events<M, B>(
        &mut self,
        controller: &mut MailboxController<'_, M, B>,
    ) -> Result<usize, C::Error>
    where
        M: MotorDriver,
        B: Buzzer,
    {
        let connected = self.client.is_connected();
        let mut published = 0;

        while let Some(change) = controller.pop_event() {
            if !connected {
                continue;
            }
            self.publish_state(&StateMessage::from(&change))?;
            published += 1;
        }

        Ok(published)
    }

    fn publish_state(&mut self, msg: &StateMessage) -> Result<(), C::Error> {
        let Some(json) = encode_state(msg) else {
            log::error!("mqtt: state payload too large for {}", msg.state);
            return Ok(());
        };
        let topic = self.config.topic("state");
        self.client.publish(&topic, json.as_bytes(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hal::{MockBuzzer, MockMotor, MockMqtt};
    use crate::wiegand::WiegandLines;
    use crate::MailboxState;

    fn setup(lines: &WiegandLines) -> (MailboxController<'_, MockMotor, MockBuzzer>, MqttBridge<MockMqtt>) {
        let controller =
            MailboxController::new(MockMotor::new(), MockBuzzer::new(), lines, &Config::default());
        let bridge = MqttBridge::new(MockMqtt::new(), Config::default().mqtt);
        (controller, bridge)
    }

    #[test]
    fn subscribes_and_publishes_on_connect() {
        let lines = WiegandLines::new();
        let (controller, mut bridge) = setup(&lines);

        assert!(bridge.sync_connection(&controller).unwrap());
        assert!(bridge.client().is_subscribed("paketkasten/command"));
        assert_eq!(bridge.client().published_to("paketkasten/state").len(), 1);

        // no second publish while the connection holds
        assert!(!bridge.sync_connection(&controller).unwrap());
        assert_eq!(bridge.client().published.len(), 1);
    }

    #[test]
    fn republishes_after_reconnect() {
        let lines = WiegandLines::new();
        let (controller, mut bridge) = setup(&lines);

        bridge.sync_connection(&controller).unwrap();
        bridge.client_mut().connected = false;
        assert!(!bridge.sync_connection(&controller).unwrap());
        bridge.client_mut().connected = true;
        assert!(bridge.sync_connection(&controller).unwrap());
        assert_eq!(bridge.client().published.len(), 2);
    }

    #[test]
    fn open_command_applied_with_mqtt_attribution() {
        let lines = WiegandLines::new();
        let (mut controller, mut bridge) = setup(&lines);

        bridge
            .client_mut()
            .queue_message("paketkasten/command", b"OPEN_PARCEL".to_vec());
        assert_eq!(bridge.poll(&mut controller, 0).unwrap(), 1);
        assert_eq!(controller.state(), MailboxState::PreOpeningToParcel);
        assert_eq!(controller.attribution(), "mqtt");

        assert_eq!(bridge.publish_events(&mut controller).unwrap(), 1);
        let (topic, payload, retain) = bridge.client().published.last().unwrap();
        assert!(!retain);
        assert_eq!(topic, "paketkasten/state");
        assert_eq!(
            core::str::from_utf8(payload).unwrap(),
            r#"{"state":"PRE_OPENING_TO_PARCEL","last_used":"mqtt"}"#
        );
    }

    #[test]
    fn unknown_payload_and_foreign_topic_ignored() {
        let lines = WiegandLines::new();
        let (mut controller, mut bridge) = setup(&lines);

        bridge.client_mut().queue_message("paketkasten/command", b"EXPLODE".to_vec());
        bridge.client_mut().queue_message("other/command", b"OPEN_MAIL".to_vec());
        assert_eq!(bridge.poll(&mut controller, 0).unwrap(), 0);
        assert_eq!(controller.state(), MailboxState::Locked);
    }

    #[test]
    fn events_dropped_while_disconnected() {
        let lines = WiegandLines::new();
        let (mut controller, mut bridge) = setup(&lines);
        bridge.client_mut().connected = false;

        controller.request_open(crate::DoorKind::Mail, "webinterface", 0).unwrap();
        assert_eq!(bridge.publish_events(&mut controller).unwrap(), 0);
        assert!(controller.pop_event().is_none());
        assert!(bridge.client().published.is_empty());
    }
}
