//! The mailbox controller: door/lock state machine plus the motor, melody and
//! credential plumbing around it.
//!
//! # Overview
//!
//! [`MailboxController`] owns the single [`MailboxState`] and every timestamp
//! the state machine needs. The main loop calls [`tick`](MailboxController::tick)
//! every few milliseconds with the current switch readings; each tick runs,
//! in order:
//!
//! 1. Timed transitions (opening delay, open dwell, motor timeout)
//! 2. The motor ramp write
//! 3. The melody step
//! 4. Switch edges and the no-switch fail-safe
//! 5. The Wiegand poll; frames are acted on only while locked
//!
//! Door requests from MQTT or the web interface go through
//! [`request_open`](MailboxController::request_open) and friends. Every
//! realized transition is queued as a [`StateChange`] for the caller to
//! publish.
//!
//! # Example
//!
//! ```rust
//! use rs_parcelbox::{
//!     config::Config, hal::{MockBuzzer, MockMotor}, wiegand::WiegandLines,
//!     Authorization, DoorKind, MailboxController, MailboxState, SwitchReadings,
//! };
//!
//! let lines = WiegandLines::new();
//! let mut controller =
//!     MailboxController::new(MockMotor::new(), MockBuzzer::new(), &lines, &Config::default());
//! let deny_all = |_: &str| Authorization::Denied;
//! let closed = SwitchReadings { closed: true, ..Default::default() };
//!
//! controller.tick(0, closed, &deny_all).unwrap();
//! controller.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
//! assert_eq!(controller.state(), MailboxState::PreOpeningToMail);
//!
//! // Motor starts once the opening delay has passed
//! controller.tick(701, closed, &deny_all).unwrap();
//! assert_eq!(controller.state(), MailboxState::OpeningToMail);
//! ```

use heapless::Deque;

use crate::commands::{CommandOutcome, CommandSource, RejectReason, RemoteCommand};
use crate::config::{Config, TimingConfig};
use crate::credentials::{label, Authorization, CredentialAuthorizer, Label};
use crate::melody::{MelodyId, MelodySequencer, ToneEvent};
use crate::motor::MotorRamp;
use crate::state::{DoorKind, LedPattern, MailboxState};
use crate::traits::{Buzzer, MotorDriver, PositionSwitch};
use crate::wiegand::{CodeHex, WiegandDecoder, WiegandLines};

/// Queued state changes kept before the oldest is dropped.
pub const EVENT_QUEUE_LEN: usize = 16;

/// Attribution reported before the first accepted opening.
pub const UNKNOWN_ATTRIBUTION: &str = "unknown";

// ============================================================================
// Errors
// ============================================================================

/// A hardware write failed.
///
/// The state machine itself never fails; only the motor and buzzer writes
/// it drives can.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HardwareError<ME, BE> {
    /// Motor bridge write failed.
    Motor(ME),
    /// Buzzer write failed.
    Buzzer(BE),
}

impl<ME: core::fmt::Debug, BE: core::fmt::Debug> core::fmt::Display for HardwareError<ME, BE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HardwareError::Motor(e) => write!(f, "motor write failed: {:?}", e),
            HardwareError::Buzzer(e) => write!(f, "buzzer write failed: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<ME: core::fmt::Debug, BE: core::fmt::Debug> std::error::Error for HardwareError<ME, BE> {}

// ============================================================================
// Inputs and outputs
// ============================================================================

/// One sample of the three door position switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchReadings {
    /// Latch fully closed.
    pub closed: bool,
    /// Latch at the parcel position.
    pub parcel: bool,
    /// Latch at the mail position.
    pub mail: bool,
}

impl SwitchReadings {
    /// Read all three switches.
    pub fn sample<C, P, M>(closed: &mut C, parcel: &mut P, mail: &mut M) -> Self
    where
        C: PositionSwitch + ?Sized,
        P: PositionSwitch + ?Sized,
        M: PositionSwitch + ?Sized,
    {
        Self {
            closed: closed.is_engaged(),
            parcel: parcel.is_engaged(),
            mail: mail.is_engaged(),
        }
    }

    /// True if any switch is engaged.
    #[inline]
    pub fn any(&self) -> bool {
        self.closed || self.parcel || self.mail
    }

    /// Switches that are engaged now but were not in `previous`.
    #[inline]
    pub fn rising_since(&self, previous: &SwitchReadings) -> SwitchReadings {
        SwitchReadings {
            closed: self.closed && !previous.closed,
            parcel: self.parcel && !previous.parcel,
            mail: self.mail && !previous.mail,
        }
    }
}

/// Notification for one realized transition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateChange {
    /// State left.
    pub from: MailboxState,
    /// State entered.
    pub to: MailboxState,
    /// Attribution of the last accepted opening request.
    pub attribution: Label,
    /// Loop time of the transition.
    pub at_ms: u64,
}

/// Snapshot for the diagnostics page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Last credential seen, in hex. Empty until the first frame.
    pub wiegand_id: CodeHex,
    /// Current state.
    pub mailbox_state: MailboxState,
    /// Closed switch level.
    pub closed_switch: bool,
    /// Parcel switch level.
    pub parcel_switch: bool,
    /// Mail switch level.
    pub mail_switch: bool,
}

// ============================================================================
// Controller
// ============================================================================

/// The mailbox controller.
///
/// # Type Parameters
///
/// - `M`: latch motor bridge ([`MotorDriver`])
/// - `B`: buzzer ([`Buzzer`])
///
/// The lifetime ties the controller to the [`WiegandLines`] the reader
/// interrupt writes into, usually a `static`.
pub struct MailboxController<'a, M: MotorDriver, B: Buzzer> {
    motor: M,
    buzzer: B,
    state: MailboxState,
    phase_entered_at: u64,
    motor_started_at: u64,
    no_switch_active_since: Option<u64>,
    attribution: Label,
    ramp: MotorRamp,
    timing: TimingConfig,
    melody: MelodySequencer,
    selected_melody: MelodyId,
    decoder: WiegandDecoder<'a>,
    switches: SwitchReadings,
    last_credential: CodeHex,
    events: Deque<StateChange, EVENT_QUEUE_LEN>,
}

type TickResult<M, B> =
    Result<(), HardwareError<<M as MotorDriver>::Error, <B as Buzzer>::Error>>;

impl<'a, M: MotorDriver, B: Buzzer> MailboxController<'a, M, B> {
    /// Create a controller in the `Locked` state.
    pub fn new(motor: M, buzzer: B, lines: &'a WiegandLines, config: &Config) -> Self {
        Self {
            motor,
            buzzer,
            state: MailboxState::Locked,
            phase_entered_at: 0,
            motor_started_at: 0,
            no_switch_active_since: None,
            attribution: label(UNKNOWN_ATTRIBUTION),
            ramp: MotorRamp::new(&config.motor),
            timing: config.timing.clone(),
            melody: MelodySequencer::new(),
            selected_melody: MelodyId::from_name(&config.selected_melody),
            decoder: WiegandDecoder::new(lines, &config.wiegand),
            switches: SwitchReadings::default(),
            last_credential: CodeHex::new(),
            events: Deque::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------------------

    /// Advance the controller. Call every loop iteration.
    ///
    /// The reader is drained in every state so `last_credential` stays
    /// current, but a frame is only matched against `authorizer` while
    /// `Locked`. A swipe during a door cycle is logged and discarded.
    pub fn tick<A>(&mut self, now_ms: u64, switches: SwitchReadings, authorizer: &A) -> TickResult<M, B>
    where
        A: CredentialAuthorizer + ?Sized,
    {
        self.timed_transitions(now_ms);

        let elapsed = now_ms.saturating_sub(self.motor_started_at);
        let cmd = self.ramp.command(self.state, elapsed);
        self.motor.set_duty(cmd).map_err(HardwareError::Motor)?;

        if let Some(event) = self.melody.tick(now_ms) {
            self.emit_tone(event)?;
        }

        self.switch_transitions(now_ms, switches);

        self.decoder.poll(now_ms);
        if let Some(frame) = self.decoder.take_available() {
            self.last_credential = frame.code_hex();
            log::info!(
                "wiegand: {} ({} bits)",
                self.last_credential,
                frame.bit_count
            );

            if self.state == MailboxState::Locked {
                let code = self.last_credential.clone();
                match authorizer.authorize(&code) {
                    Authorization::Owner(name) => {
                        self.request_open(DoorKind::Mail, &name, now_ms)?;
                    }
                    Authorization::Delivery(name) => {
                        self.request_open(DoorKind::Parcel, &name, now_ms)?;
                    }
                    Authorization::Denied => {
                        log::warn!("wiegand: no match for {}", code);
                    }
                }
            } else {
                log::debug!("wiegand: ignored {} in {}", self.last_credential, self.state);
            }
        }

        Ok(())
    }

    fn timed_transitions(&mut self, now_ms: u64) {
        let phase_age = now_ms.saturating_sub(self.phase_entered_at);
        let motor_age = now_ms.saturating_sub(self.motor_started_at);

        match self.state {
            MailboxState::PreOpeningToParcel
                if phase_age > self.timing.opening_delay_ms as u64 =>
            {
                self.transition(MailboxState::OpeningToParcel, now_ms);
            }
            MailboxState::PreOpeningToMail if phase_age > self.timing.opening_delay_ms as u64 => {
                self.transition(MailboxState::OpeningToMail, now_ms);
            }
            MailboxState::ParcelOpen | MailboxState::MailOpen
                if phase_age > self.timing.open_dwell_ms as u64 =>
            {
                self.transition(MailboxState::Locking, now_ms);
            }
            state
                if state.is_motor_driving()
                    && motor_age >= self.timing.motor_timeout_ms as u64 =>
            {
                log::error!("motor: {} timed out after {}ms", state, motor_age);
                self.transition(MailboxState::MotorError, now_ms);
            }
            _ => {}
        }
    }

    fn switch_transitions(&mut self, now_ms: u64, switches: SwitchReadings) {
        let rising = switches.rising_since(&self.switches);
        self.switches = switches;

        match self.state {
            MailboxState::OpeningToParcel if rising.parcel => {
                self.transition(MailboxState::ParcelOpen, now_ms);
            }
            MailboxState::OpeningToMail if rising.mail => {
                self.transition(MailboxState::MailOpen, now_ms);
            }
            // Level, not edge: after a RESET the latch may already be home
            MailboxState::Locking if switches.closed => {
                self.transition(MailboxState::Locked, now_ms);
            }
            _ => {}
        }

        if switches.any() {
            self.no_switch_active_since = None;
            return;
        }

        let since = *self.no_switch_active_since.get_or_insert(now_ms);
        let quiet_for = now_ms.saturating_sub(since);
        if self.state.is_inactivity_guarded() && quiet_for > self.timing.inactivity_ms as u64 {
            log::warn!("mailbox: no switch engaged for {}ms, re-locking", quiet_for);
            self.transition(MailboxState::Locking, now_ms);
        }
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Ask for a door to open on behalf of `requester`.
    ///
    /// Ignored unless the box is locked. On acceptance the attribution is
    /// recorded, the opening delay begins and the confirmation melody starts.
    ///
    /// A buzzer error is returned after the transition: the door still
    /// opens, only the melody is dropped.
    pub fn request_open(
        &mut self,
        door: DoorKind,
        requester: &str,
        now_ms: u64,
    ) -> Result<CommandOutcome, HardwareError<M::Error, B::Error>> {
        if self.state != MailboxState::Locked {
            log::debug!("mailbox: open {:?} by {} ignored in {}", door, requester, self.state);
            return Ok(self.ignored(RejectReason::NotLocked));
        }

        self.attribution = label(requester);
        let next = match door {
            DoorKind::Parcel => MailboxState::PreOpeningToParcel,
            DoorKind::Mail => MailboxState::PreOpeningToMail,
        };
        self.transition(next, now_ms);

        // The door cycle is already under way; a buzzer fault only loses the tune
        let tone = self.melody.start(self.selected_melody, now_ms);
        if let Err(e) = self.emit_tone(tone) {
            self.melody.stop();
            return Err(e);
        }
        Ok(CommandOutcome::Accepted)
    }

    /// Re-lock an open door without waiting for the dwell to end.
    pub fn request_close(&mut self, now_ms: u64) -> CommandOutcome {
        if !self.state.is_open() {
            return self.ignored(RejectReason::NotOpen);
        }
        self.transition(MailboxState::Locking, now_ms);
        CommandOutcome::Accepted
    }

    /// Leave `MotorError` by driving the latch closed again.
    ///
    /// The closed switch has to confirm the latch before the box counts as
    /// locked; a second timeout lands back in `MotorError`.
    pub fn clear_motor_error(&mut self, now_ms: u64) -> CommandOutcome {
        if self.state != MailboxState::MotorError {
            return self.ignored(RejectReason::NoMotorError);
        }
        log::info!("motor: error cleared, re-locking");
        self.transition(MailboxState::Locking, now_ms);
        CommandOutcome::Accepted
    }

    /// Apply a parsed remote command from `source`.
    pub fn apply(
        &mut self,
        command: RemoteCommand,
        source: CommandSource,
        now_ms: u64,
    ) -> Result<CommandOutcome, HardwareError<M::Error, B::Error>> {
        match command {
            RemoteCommand::Open(door) => self.request_open(door, source.label(), now_ms),
            RemoteCommand::Close => Ok(self.request_close(now_ms)),
            RemoteCommand::ResetMotorError => Ok(self.clear_motor_error(now_ms)),
        }
    }

    /// Preview a melody by name without touching the state machine.
    pub fn play_melody(&mut self, name: &str, now_ms: u64) -> Result<(), HardwareError<M::Error, B::Error>> {
        let tone = self.melody.start(MelodyId::from_name(name), now_ms);
        self.emit_tone(tone)
    }

    /// Change the melody played on accepted openings.
    pub fn set_selected_melody(&mut self, name: &str) {
        self.selected_melody = MelodyId::from_name(name);
    }

    // ------------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------------

    /// Next queued state change, oldest first.
    pub fn pop_event(&mut self) -> Option<StateChange> {
        self.events.pop_front()
    }

    /// Current state.
    pub fn state(&self) -> MailboxState {
        self.state
    }

    /// Label of the last accepted opening request.
    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    /// Last decoded credential in hex; empty until the first frame.
    pub fn last_credential(&self) -> &str {
        &self.last_credential
    }

    /// LED pattern for the current state.
    pub fn indicators(&self) -> LedPattern {
        self.state.indicators()
    }

    /// True while a melody is playing.
    pub fn is_melody_playing(&self) -> bool {
        self.melody.is_playing()
    }

    /// Snapshot for the diagnostics page.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            wiegand_id: self.last_credential.clone(),
            mailbox_state: self.state,
            closed_switch: self.switches.closed,
            parcel_switch: self.switches.parcel,
            mail_switch: self.switches.mail,
        }
    }

    /// The motor driver.
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// The buzzer.
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn transition(&mut self, to: MailboxState, now_ms: u64) {
        let from = self.state;
        self.state = to;
        self.phase_entered_at = now_ms;
        if to.is_motor_driving() {
            self.motor_started_at = now_ms;
        }

        log::info!("mailbox: {} -> {} ({})", from, to, self.attribution);

        let change = StateChange {
            from,
            to,
            attribution: self.attribution.clone(),
            at_ms: now_ms,
        };
        if self.events.is_full() {
            log::warn!("mailbox: event queue full, dropping oldest");
            self.events.pop_front();
        }
        // Room was made above
        let _ = self.events.push_back(change);
    }

    fn ignored(&self, reason: RejectReason) -> CommandOutcome {
        CommandOutcome::Ignored {
            reason,
            state: self.state,
        }
    }

    fn emit_tone(&mut self, event: ToneEvent) -> TickResult<M, B> {
        match event {
            ToneEvent::Play {
                frequency_hz,
                duration_ms,
            } => self.buzzer.play_tone(frequency_hz, duration_ms),
            ToneEvent::Silence => self.buzzer.silence(),
        }
        .map_err(HardwareError::Buzzer)
    }
}
