//! Mailbox states and the pure mappings derived from them.
//!
//! The controller owns exactly one [`MailboxState`]. Everything the outside
//! world sees about it (the published state name, LED pattern, whether the
//! motor may run) is a total `match` over this enum.

/// Which compartment an opening request targets.
///
/// The parcel door is the delivery compartment; "mail" opens the whole box
/// for the owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DoorKind {
    /// Parcel compartment (delivery codes, web `parcel`).
    Parcel,
    /// Whole box including mail (owner codes, web `all`).
    Mail,
}

impl DoorKind {
    /// Parse the door kind used by the web interface.
    ///
    /// Accepts `parcel` and the web form's `all` alias for the mail door, plus
    /// `mail`. Input is trimmed and case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_parcelbox::DoorKind;
    ///
    /// assert_eq!(DoorKind::from_text("parcel"), Some(DoorKind::Parcel));
    /// assert_eq!(DoorKind::from_text("all"), Some(DoorKind::Mail));
    /// assert_eq!(DoorKind::from_text(" MAIL "), Some(DoorKind::Mail));
    /// assert_eq!(DoorKind::from_text("garage"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("parcel") {
            Some(DoorKind::Parcel)
        } else if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("mail") {
            Some(DoorKind::Mail)
        } else {
            None
        }
    }
}

/// The door/lock state machine's current state.
///
/// Created as [`Locked`](Self::Locked) at boot and never destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MailboxState {
    /// Door latched, motor braked, accepting credentials.
    #[default]
    Locked,
    /// Parcel opening requested, melody playing before the motor starts.
    PreOpeningToParcel,
    /// Motor driving towards the parcel position.
    OpeningToParcel,
    /// Parcel door released, dwell timer running.
    ParcelOpen,
    /// Mail opening requested, melody playing before the motor starts.
    PreOpeningToMail,
    /// Motor driving towards the mail position.
    OpeningToMail,
    /// Mail door released, dwell timer running.
    MailOpen,
    /// Motor driving back to the closed position.
    Locking,
    /// A motor move timed out. Brake held until cleared externally.
    MotorError,
}

impl MailboxState {
    /// Every state, in declaration order.
    pub const ALL: [MailboxState; 9] = [
        MailboxState::Locked,
        MailboxState::PreOpeningToParcel,
        MailboxState::OpeningToParcel,
        MailboxState::ParcelOpen,
        MailboxState::PreOpeningToMail,
        MailboxState::OpeningToMail,
        MailboxState::MailOpen,
        MailboxState::Locking,
        MailboxState::MotorError,
    ];

    /// Returns the published name of the state.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_parcelbox::MailboxState;
    ///
    /// assert_eq!(MailboxState::Locked.as_str(), "LOCKED");
    /// assert_eq!(MailboxState::PreOpeningToMail.as_str(), "PRE_OPENING_TO_MAIL");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MailboxState::Locked => "LOCKED",
            MailboxState::PreOpeningToParcel => "PRE_OPENING_TO_PARCEL",
            MailboxState::OpeningToParcel => "OPENING_TO_PARCEL",
            MailboxState::ParcelOpen => "PARCEL_OPEN",
            MailboxState::PreOpeningToMail => "PRE_OPENING_TO_MAIL",
            MailboxState::OpeningToMail => "OPENING_TO_MAIL",
            MailboxState::MailOpen => "MAIL_OPEN",
            MailboxState::Locking => "LOCKING",
            MailboxState::MotorError => "MOTOR_ERROR",
        }
    }

    /// Parse a published state name back into a state.
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
    }

    /// True for the states in which the motor is driven.
    #[inline]
    pub const fn is_motor_driving(&self) -> bool {
        matches!(
            self,
            MailboxState::OpeningToParcel | MailboxState::OpeningToMail | MailboxState::Locking
        )
    }

    /// True while a door is released and the dwell timer runs.
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, MailboxState::ParcelOpen | MailboxState::MailOpen)
    }

    /// True for states the no-switch fail-safe may re-lock from.
    ///
    /// Motor moves carry their own timeout and `MotorError` must stay put,
    /// so only the resting and pre-opening states are guarded.
    #[inline]
    pub const fn is_inactivity_guarded(&self) -> bool {
        match self {
            MailboxState::Locked
            | MailboxState::PreOpeningToParcel
            | MailboxState::ParcelOpen
            | MailboxState::PreOpeningToMail
            | MailboxState::MailOpen => true,
            MailboxState::OpeningToParcel
            | MailboxState::OpeningToMail
            | MailboxState::Locking
            | MailboxState::MotorError => false,
        }
    }

    /// LED pattern shown for this state.
    ///
    /// Green means a door is (or may be) open, red means motion or an
    /// imminent move, both mean a motor error.
    pub const fn indicators(&self) -> LedPattern {
        match self {
            MailboxState::Locked => LedPattern::OFF,
            MailboxState::ParcelOpen | MailboxState::MailOpen => LedPattern {
                green: true,
                red: false,
            },
            MailboxState::PreOpeningToParcel
            | MailboxState::OpeningToParcel
            | MailboxState::PreOpeningToMail
            | MailboxState::OpeningToMail
            | MailboxState::Locking => LedPattern {
                green: false,
                red: true,
            },
            MailboxState::MotorError => LedPattern {
                green: true,
                red: true,
            },
        }
    }
}

impl core::fmt::Display for MailboxState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Levels for the two indicator LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedPattern {
    /// Green LED lit.
    pub green: bool,
    /// Red LED lit.
    pub red: bool,
}

impl LedPattern {
    /// Both LEDs dark.
    pub const OFF: LedPattern = LedPattern {
        green: false,
        red: false,
    };
}
