//! Remote command types and their outcomes.
//!
//! Door requests arrive from three places: the MQTT command topic, the web
//! interface, and the credential reader. All of them end up as calls on the
//! [`MailboxController`](crate::MailboxController); this module holds the
//! parsed form of the remote ones and the answer the controller gives back.
//!
//! # Command Flow
//!
//! 1. A payload arrives (`OPEN_MAIL` on `paketkasten/command`, or a web
//!    `open` request with `type=parcel`)
//! 2. It is parsed into a [`RemoteCommand`]
//! 3. The controller applies it and returns a [`CommandOutcome`]
//!
//! ```rust
//! use rs_parcelbox::{DoorKind, RemoteCommand};
//!
//! assert_eq!(
//!     RemoteCommand::from_payload("OPEN_PARCEL"),
//!     Some(RemoteCommand::Open(DoorKind::Parcel))
//! );
//! assert_eq!(RemoteCommand::from_payload("DANCE"), None);
//! ```

use crate::state::{DoorKind, MailboxState};

// ============================================================================
// Command Source
// ============================================================================

/// Where a door request came from.
///
/// The source's label is recorded as the attribution for remote requests.
/// Credential requests use the matched entry's label instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandSource {
    /// MQTT command topic.
    Mqtt,
    /// Browser on the configuration web interface.
    WebInterface,
    /// Wiegand credential reader.
    Credential,
}

impl CommandSource {
    /// Attribution label for requests from this source.
    ///
    /// ```rust
    /// use rs_parcelbox::CommandSource;
    ///
    /// assert_eq!(CommandSource::Mqtt.label(), "mqtt");
    /// assert_eq!(CommandSource::WebInterface.label(), "webinterface");
    /// ```
    pub const fn label(&self) -> &'static str {
        match self {
            CommandSource::Mqtt => "mqtt",
            CommandSource::WebInterface => "webinterface",
            CommandSource::Credential => "credential",
        }
    }
}

// ============================================================================
// Remote Commands
// ============================================================================

/// A parsed remote request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Open a door. Only honoured while locked.
    Open(DoorKind),
    /// Re-lock an open door before its dwell ends.
    Close,
    /// Leave `MotorError` by driving the latch closed again.
    ResetMotorError,
}

impl RemoteCommand {
    /// Parse an MQTT command payload.
    ///
    /// Accepts `OPEN_PARCEL`, `OPEN_MAIL`, `CLOSE` and `RESET`. Surrounding
    /// whitespace is ignored; anything else yields `None`.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload.trim() {
            "OPEN_PARCEL" => Some(RemoteCommand::Open(DoorKind::Parcel)),
            "OPEN_MAIL" => Some(RemoteCommand::Open(DoorKind::Mail)),
            "CLOSE" => Some(RemoteCommand::Close),
            "RESET" => Some(RemoteCommand::ResetMotorError),
            _ => None,
        }
    }

    /// Parse the `type` parameter of a web open request (`parcel` or `all`).
    pub fn from_web_type(open_type: &str) -> Option<Self> {
        DoorKind::from_text(open_type).map(RemoteCommand::Open)
    }

    /// The MQTT payload for this command.
    pub const fn as_payload(&self) -> &'static str {
        match self {
            RemoteCommand::Open(DoorKind::Parcel) => "OPEN_PARCEL",
            RemoteCommand::Open(DoorKind::Mail) => "OPEN_MAIL",
            RemoteCommand::Close => "CLOSE",
            RemoteCommand::ResetMotorError => "RESET",
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a door request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The request caused a transition.
    Accepted,
    /// The request was ignored; the state machine did not move.
    Ignored {
        /// Why it was ignored.
        reason: RejectReason,
        /// State at the time of the request.
        state: MailboxState,
    },
}

impl CommandOutcome {
    /// True for [`CommandOutcome::Accepted`].
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }
}

/// Why a request was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RejectReason {
    /// Open requests are only honoured while locked.
    NotLocked,
    /// Close requests need an open door.
    NotOpen,
    /// Reset requests need a motor error.
    NoMotorError,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RejectReason::NotLocked => f.write_str("box is not locked"),
            RejectReason::NotOpen => f.write_str("no door is open"),
            RejectReason::NoMotorError => f.write_str("no motor error to clear"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mqtt_payloads() {
        assert_eq!(
            RemoteCommand::from_payload("OPEN_MAIL"),
            Some(RemoteCommand::Open(DoorKind::Mail))
        );
        assert_eq!(RemoteCommand::from_payload("CLOSE\n"), Some(RemoteCommand::Close));
        assert_eq!(
            RemoteCommand::from_payload("RESET"),
            Some(RemoteCommand::ResetMotorError)
        );
        // payloads are case-sensitive
        assert_eq!(RemoteCommand::from_payload("open_mail"), None);
        assert_eq!(RemoteCommand::from_payload(""), None);
    }

    #[test]
    fn payload_round_trip() {
        for cmd in [
            RemoteCommand::Open(DoorKind::Parcel),
            RemoteCommand::Open(DoorKind::Mail),
            RemoteCommand::Close,
            RemoteCommand::ResetMotorError,
        ] {
            assert_eq!(RemoteCommand::from_payload(cmd.as_payload()), Some(cmd));
        }
    }

    #[test]
    fn web_open_types() {
        assert_eq!(
            RemoteCommand::from_web_type("parcel"),
            Some(RemoteCommand::Open(DoorKind::Parcel))
        );
        assert_eq!(
            RemoteCommand::from_web_type("all"),
            Some(RemoteCommand::Open(DoorKind::Mail))
        );
        assert_eq!(RemoteCommand::from_web_type("cellar"), None);
    }

    #[test]
    fn source_labels() {
        assert_eq!(CommandSource::Credential.label(), "credential");
    }

    #[test]
    fn outcome_helpers() {
        assert!(CommandOutcome::Accepted.is_accepted());
        let ignored = CommandOutcome::Ignored {
            reason: RejectReason::NotLocked,
            state: MailboxState::MailOpen,
        };
        assert!(!ignored.is_accepted());
        assert_eq!(RejectReason::NotLocked.to_string(), "box is not locked");
    }
}
