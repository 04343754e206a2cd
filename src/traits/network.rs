//! Network abstraction trait for MQTT.
//!
//! The MQTT transport (connection, reconnect, TLS) lives outside this crate.
//! The controller only needs a way to publish state and poll for commands,
//! which this trait captures.
//!
//! # Topics
//!
//! With the default `paketkasten` prefix:
//!
//! ```text
//! paketkasten/command  - OPEN_PARCEL, OPEN_MAIL, CLOSE, RESET
//! paketkasten/state    - {"state":"LOCKED","last_used":"mqtt"}
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on the ESP32 (blocking
/// I/O) as well as on desktop, where an implementation can sit on top of an
/// async client and buffer messages in a channel.
///
/// # Implementation Notes
///
/// - `publish` and `subscribe` are synchronous
/// - `try_recv` is non-blocking for polling from the control loop
/// - The client should handle reconnection internally
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error;

    /// Publish a message to a topic.
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This must never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
#[derive(Clone, Debug)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
