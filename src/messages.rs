//! JSON payloads published over MQTT and served to the web interface.
//!
//! These types are `no_std` compatible and are encoded with
//! `serde-json-core` on the device. Tests and desktop tools can read them back
//! with `serde_json`.
//!
//! # Example
//!
//! ```
//! use rs_parcelbox::messages::{encode_state, StateMessage};
//! use rs_parcelbox::MailboxState;
//!
//! let msg = StateMessage::new(MailboxState::Locked, "mqtt");
//! let json = encode_state(&msg).unwrap();
//! assert_eq!(json.as_str(), r#"{"state":"LOCKED","last_used":"mqtt"}"#);
//! ```

use serde::{Deserialize, Serialize};

use crate::credentials::{label, Label};
use crate::mailbox::{Diagnostics, StateChange};
use crate::state::MailboxState;

/// Capacity of an encoded state payload.
pub const STATE_PAYLOAD_LEN: usize = 128;

/// Capacity of an encoded diagnostics payload.
pub const DIAGNOSTICS_PAYLOAD_LEN: usize = 160;

// ============================================================================
// Payload Types
// ============================================================================

/// Payload of the `<prefix>/state` topic.
///
/// # JSON Example
///
/// ```json
/// {"state": "MAIL_OPEN", "last_used": "owner1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Published state name.
    pub state: MailboxState,
    /// Attribution of the last accepted opening request.
    pub last_used: Label,
}

impl StateMessage {
    /// Create a state message.
    pub fn new(state: MailboxState, last_used: &str) -> Self {
        Self {
            state,
            last_used: label(last_used),
        }
    }
}

impl From<&StateChange> for StateMessage {
    fn from(change: &StateChange) -> Self {
        Self {
            state: change.to,
            last_used: change.attribution.clone(),
        }
    }
}

// ============================================================================
// Encoding Functions (serde-json-core, no_std)
// ============================================================================

/// Encode a state message.
///
/// Returns `None` only if the payload would not fit, which the label length
/// limit rules out.
#[cfg(feature = "serde-json-core")]
pub fn encode_state(msg: &StateMessage) -> Option<heapless::String<STATE_PAYLOAD_LEN>> {
    serde_json_core::to_string(msg).ok()
}

/// Parse a state message from JSON bytes.
///
/// ```
/// use rs_parcelbox::messages::parse_state;
/// use rs_parcelbox::MailboxState;
///
/// let msg = parse_state(br#"{"state":"MOTOR_ERROR","last_used":"Alice"}"#).unwrap();
/// assert_eq!(msg.state, MailboxState::MotorError);
/// assert_eq!(msg.last_used.as_str(), "Alice");
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_state(json: &[u8]) -> Option<StateMessage> {
    serde_json_core::from_slice(json).ok().map(|(msg, _)| msg)
}

/// Encode the diagnostics snapshot.
#[cfg(feature = "serde-json-core")]
pub fn encode_diagnostics(
    diagnostics: &Diagnostics,
) -> Option<heapless::String<DIAGNOSTICS_PAYLOAD_LEN>> {
    serde_json_core::to_string(diagnostics).ok()
}
