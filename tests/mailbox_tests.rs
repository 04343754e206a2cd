//! End-to-end tests for the mailbox controller against mock hardware.
//!
//! All timestamps are explicit milliseconds; nothing here sleeps.

use rs_parcelbox::{
    hal::{MockBuzzer, MockMotor},
    Authorization, CommandOutcome, CommandSource, Config, CredentialLists, DoorKind,
    MailboxController, MailboxState, MotorCommand, RejectReason, RemoteCommand, SwitchReadings,
    WiegandLine, WiegandLines,
};

const NONE: SwitchReadings = SwitchReadings {
    closed: false,
    parcel: false,
    mail: false,
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
const MAIL: SwitchReadings = SwitchReadings {
    closed: false,
    parcel: false,
    mail: true,
};

fn controller(lines: &WiegandLines) -> MailboxController<'_, MockMotor, MockBuzzer> {
    MailboxController::new(MockMotor::new(), MockBuzzer::new(), lines, &Config::default())
}

fn credentials() -> CredentialLists {
    CredentialLists::new()
        .with_owner("1A2B3C", "owner1")
        .with_delivery("99AA", "courier")
}

/// Shift `bits` bits of `code` into the lines, MSB first, all at `at_ms`.
fn swipe(lines: &WiegandLines, code: u32, bits: u8, at_ms: u32) {
    for i in (0..bits).rev() {
        let line = if (code >> i) & 1 == 1 {
            WiegandLine::One
        } else {
            WiegandLine::Zero
        };
        lines.on_edge(line, at_ms);
    }
}

fn drain_states(c: &mut MailboxController<'_, MockMotor, MockBuzzer>) -> Vec<MailboxState> {
    core::iter::from_fn(|| c.pop_event()).map(|e| e.to).collect()
}

// ============================================================================
// Full cycles
// ============================================================================

#[test]
fn owner_credential_runs_full_mail_cycle() {
    let lines = WiegandLines::new();
    let creds = credentials();
    let mut c = controller(&lines);

    c.tick(0, CLOSED, &creds).unwrap();
    swipe(&lines, 0x1A2B3C, 24, 0);

    // Still inside the quiet period
    c.tick(50, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);

    c.tick(100, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::PreOpeningToMail);
    assert_eq!(c.attribution(), "owner1");
    assert_eq!(c.last_credential(), "1A2B3C");

    // Opening delay is strict
    c.tick(800, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::PreOpeningToMail);
    c.tick(801, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::OpeningToMail);

    c.tick(900, NONE, &creds).unwrap();
    c.tick(1200, MAIL, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::MailOpen);

    c.tick(2200, MAIL, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::MailOpen);
    c.tick(2201, MAIL, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::Locking);

    c.tick(2400, NONE, &creds).unwrap();
    c.tick(2500, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);

    assert_eq!(
        drain_states(&mut c),
        [
            MailboxState::PreOpeningToMail,
            MailboxState::OpeningToMail,
            MailboxState::MailOpen,
            MailboxState::Locking,
            MailboxState::Locked,
        ]
    );
    assert_eq!(c.motor().last, Some(MotorCommand::BRAKE));
}

#[test]
fn delivery_credential_opens_parcel_door() {
    let lines = WiegandLines::new();
    let creds = credentials();
    let mut c = controller(&lines);

    swipe(&lines, 0x99AA, 16, 10);
    c.tick(100, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::PreOpeningToParcel);
    assert_eq!(c.attribution(), "courier");

    c.tick(801, CLOSED, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::OpeningToParcel);
    c.tick(1000, PARCEL, &creds).unwrap();
    assert_eq!(c.state(), MailboxState::ParcelOpen);

    let change = c.pop_event().unwrap();
    assert_eq!(change.from, MailboxState::Locked);
    assert_eq!(change.attribution.as_str(), "courier");
    assert_eq!(change.at_ms, 100);
}

#[test]
fn unknown_credential_is_denied() {
    let lines = WiegandLines::new();
    let creds = credentials();
    let mut c = controller(&lines);

    swipe(&lines, 0xDEAD, 16, 0);
    c.tick(100, CLOSED, &creds).unwrap();

    assert_eq!(c.state(), MailboxState::Locked);
    assert_eq!(c.last_credential(), "DEAD");
    assert!(c.pop_event().is_none());
    assert!(!c.is_melody_playing());
}

#[test]
fn credentials_ignored_unless_locked() {
    let lines = WiegandLines::new();
    let creds = credentials();
    let mut c = controller(&lines);

    c.request_open(DoorKind::Parcel, "mqtt", 0).unwrap();
    swipe(&lines, 0x1A2B3C, 24, 10);
    c.tick(100, CLOSED, &creds).unwrap();

    // Frame recorded for diagnostics but not acted on
    assert_eq!(c.last_credential(), "1A2B3C");
    assert_eq!(c.state(), MailboxState::PreOpeningToParcel);
    assert_eq!(c.attribution(), "mqtt");
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn second_open_keeps_first_attribution() {
    let lines = WiegandLines::new();
    let mut c = controller(&lines);

    let first = c.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
    let second = c.request_open(DoorKind::Parcel, "webinterface", 5).unwrap();

    assert_eq!(first, CommandOutcome::Accepted);
    assert_eq!(
        second,
        CommandOutcome::Ignored {
            reason: RejectReason::NotLocked,
            state: MailboxState::PreOpeningToMail,
        }
    );
    assert_eq!(c.attribution(), "mqtt");
    assert_eq!(drain_states(&mut c), [MailboxState::PreOpeningToMail]);
}

#[test]
fn close_request_cuts_dwell_short() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.apply(RemoteCommand::Open(DoorKind::Mail), CommandSource::WebInterface, 0)
        .unwrap();
    c.tick(701, CLOSED, &deny).unwrap();
    c.tick(900, MAIL, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::MailOpen);

    let outcome = c.apply(RemoteCommand::Close, CommandSource::Mqtt, 950).unwrap();
    assert!(outcome.is_accepted());
    assert_eq!(c.state(), MailboxState::Locking);
    assert_eq!(c.attribution(), "webinterface");
}

// ============================================================================
// Motor
// ============================================================================

#[test]
fn motor_timeout_fires_exactly_at_limit() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.request_open(DoorKind::Parcel, "mqtt", 0).unwrap();
    c.tick(701, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::OpeningToParcel);

    c.tick(2700, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::OpeningToParcel);

    c.tick(2701, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::MotorError);
    assert!(c.indicators().green && c.indicators().red);

    c.tick(2711, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::BRAKE));
}

#[test]
fn reset_recovers_from_motor_error() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
    c.tick(701, NONE, &deny).unwrap();
    c.tick(2701, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::MotorError);

    // Open is refused while in error
    let refused = c.request_open(DoorKind::Mail, "mqtt", 3000).unwrap();
    assert!(!refused.is_accepted());

    let reset = c
        .apply(RemoteCommand::ResetMotorError, CommandSource::Mqtt, 3000)
        .unwrap();
    assert!(reset.is_accepted());
    assert_eq!(c.state(), MailboxState::Locking);

    c.tick(3000, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_b(160)));

    c.tick(3500, CLOSED, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);
}

#[test]
fn reset_with_latch_already_home_locks() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
    c.tick(701, CLOSED, &deny).unwrap();
    c.tick(900, MAIL, &deny).unwrap();
    c.tick(1901, MAIL, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locking);

    // Latch reaches the closed switch only after the timeout
    c.tick(2000, NONE, &deny).unwrap();
    c.tick(3901, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::MotorError);
    c.tick(3910, CLOSED, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::MotorError);

    let reset = c
        .apply(RemoteCommand::ResetMotorError, CommandSource::Mqtt, 4000)
        .unwrap();
    assert!(reset.is_accepted());

    // The switch is still engaged: no new edge, but the door is confirmed
    c.tick(4010, CLOSED, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);
    c.tick(4020, CLOSED, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::BRAKE));
}

#[test]
fn opening_ramp_reaches_motor() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
    c.tick(701, CLOSED, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_a(160)));

    // Full power window ends at 100ms; ramp covers the next 10ms
    c.tick(801, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_a(160)));
    c.tick(806, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_a(140)));
    c.tick(811, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_a(120)));
    c.tick(1500, NONE, &deny).unwrap();
    assert_eq!(c.motor().last, Some(MotorCommand::drive_a(120)));

    // Never both channels partially driven
    assert!(c
        .motor()
        .history
        .iter()
        .all(|cmd| cmd.is_brake() || cmd.channel_a == 0 || cmd.channel_b == 0));
}

// ============================================================================
// Fail-safe
// ============================================================================

#[test]
fn no_switch_for_too_long_relocks() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.tick(0, NONE, &deny).unwrap();
    c.tick(10_000, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);

    c.tick(10_001, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locking);

    c.tick(10_300, CLOSED, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);
}

#[test]
fn engaged_switch_resets_inactivity_timer() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.tick(0, NONE, &deny).unwrap();
    c.tick(9_000, CLOSED, &deny).unwrap();
    c.tick(9_010, NONE, &deny).unwrap();
    c.tick(15_000, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locked);

    c.tick(19_011, NONE, &deny).unwrap();
    assert_eq!(c.state(), MailboxState::Locking);
}

// ============================================================================
// Melody
// ============================================================================

#[test]
fn accepted_open_plays_selected_melody() {
    let lines = WiegandLines::new();
    let deny = |_: &str| Authorization::Denied;
    let mut c = controller(&lines);

    c.request_open(DoorKind::Mail, "mqtt", 0).unwrap();
    assert_eq!(c.buzzer().tones, [(659, 166)]);

    // Silence after the note, next note after the 1.2x gap
    c.tick(166, CLOSED, &deny).unwrap();
    assert_eq!(c.buzzer().frequency_hz, None);
    c.tick(199, CLOSED, &deny).unwrap();
    assert_eq!(c.buzzer().tones.len(), 1);
    c.tick(200, CLOSED, &deny).unwrap();
    assert_eq!(c.buzzer().tones[1], (587, 166));
}

#[test]
fn selected_melody_can_change() {
    let lines = WiegandLines::new();
    let mut c = controller(&lines);

    c.set_selected_melody("intel_inside");
    c.request_open(DoorKind::Parcel, "mqtt", 0).unwrap();
    assert_eq!(c.buzzer().tones, [(311, 200)]);
}

#[test]
fn melody_preview_leaves_state_alone() {
    let lines = WiegandLines::new();
    let mut c = controller(&lines);

    c.play_melody("MARIO", 0).unwrap();
    assert!(c.is_melody_playing());
    assert_eq!(c.state(), MailboxState::Locked);
    assert!(c.pop_event().is_none());
}
