//! Built-in melodies and the non-blocking sequencer that plays them.
//!
//! A melody is a fixed table of `(pitch, divisor)` pairs. Each note sounds for
//! `whole_note_ms / divisor` and the next one starts after 120% of that, which
//! leaves a short gap between notes.
//!
//! The sequencer never touches hardware. It returns [`ToneEvent`]s that the
//! controller forwards to a [`Buzzer`](crate::traits::Buzzer).
//!
//! ```rust
//! use rs_parcelbox::melody::{MelodyId, MelodySequencer, ToneEvent};
//!
//! let mut seq = MelodySequencer::new();
//! let first = seq.start(MelodyId::from_name("INTEL_INSIDE"), 0);
//! assert_eq!(first, ToneEvent::Play { frequency_hz: 311, duration_ms: 200 });
//!
//! // Note ends, gap begins
//! assert_eq!(seq.tick(200), Some(ToneEvent::Silence));
//! // Gap over, next note
//! assert!(matches!(seq.tick(240), Some(ToneEvent::Play { .. })));
//! ```

/// Note frequencies in Hz. `REST` is silence.
pub mod pitch {
    #![allow(missing_docs)]
    pub const REST: u16 = 0;
    pub const D3: u16 = 147;
    pub const E3: u16 = 165;
    pub const F3: u16 = 175;
    pub const G3: u16 = 196;
    pub const A3: u16 = 220;
    pub const B3: u16 = 247;
    pub const CS4: u16 = 277;
    pub const D4: u16 = 294;
    pub const DS4: u16 = 311;
    pub const E4: u16 = 330;
    pub const F4: u16 = 349;
    pub const FS4: u16 = 370;
    pub const G4: u16 = 392;
    pub const GS4: u16 = 415;
    pub const A4: u16 = 440;
    pub const AS4: u16 = 466;
    pub const B4: u16 = 494;
    pub const C5: u16 = 523;
    pub const CS5: u16 = 554;
    pub const D5: u16 = 587;
    pub const DS5: u16 = 622;
    pub const E5: u16 = 659;
    pub const F5: u16 = 698;
    pub const G5: u16 = 784;
    pub const A5: u16 = 880;
}

use pitch::*;

/// One note of a melody.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    /// Pitch in Hz, 0 for a rest.
    pub frequency_hz: u16,
    /// Fraction of a whole note: 4 is a quarter, 8 an eighth.
    pub divisor: u8,
}

const fn n(frequency_hz: u16, divisor: u8) -> Note {
    Note {
        frequency_hz,
        divisor,
    }
}

impl Note {
    /// True for a rest.
    #[inline]
    pub const fn is_rest(&self) -> bool {
        self.frequency_hz == REST
    }
}

/// An immutable note table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Melody {
    /// Notes in playback order.
    pub notes: &'static [Note],
    /// Length of a whole note in milliseconds.
    pub whole_note_ms: u32,
}

impl Melody {
    /// Sounding time of `note`.
    #[inline]
    pub fn note_duration_ms(&self, note: &Note) -> u32 {
        self.whole_note_ms / note.divisor.max(1) as u32
    }

    /// Time from start until the sequencer reports the melody finished.
    pub fn playback_ms(&self) -> u64 {
        self.notes
            .iter()
            .map(|note| gap_threshold_ms(self.note_duration_ms(note)))
            .sum()
    }
}

// Smallest elapsed time with elapsed >= 1.2 * duration.
#[inline]
fn gap_threshold_ms(duration_ms: u32) -> u64 {
    (duration_ms as u64 * 6).div_ceil(5)
}

static NOKIA_TUNE: Melody = Melody {
    whole_note_ms: 1333,
    notes: &[
        n(E5, 8), n(D5, 8), n(FS4, 4), n(GS4, 4), n(CS5, 8), n(B4, 8), n(D4, 4), n(E4, 4),
        n(B4, 8), n(A4, 8), n(CS4, 4), n(E4, 4), n(A4, 2),
    ],
};

static IMPERIAL_MARCH: Melody = Melody {
    whole_note_ms: 1800,
    notes: &[
        n(A4, 4), n(A4, 4), n(A4, 4), n(F4, 5), n(C5, 16),
        n(A4, 4), n(F4, 5), n(C5, 16), n(A4, 2),
        n(E5, 4), n(E5, 4), n(E5, 4), n(F5, 5), n(C5, 16),
        n(G4, 4), n(F4, 5), n(C5, 16), n(A4, 2),
    ],
};

static MARIO: Melody = Melody {
    whole_note_ms: 1000,
    notes: &[
        n(E5, 8), n(E5, 8), n(REST, 8), n(E5, 8), n(REST, 8), n(C5, 8), n(E5, 8), n(REST, 8),
        n(G5, 4), n(REST, 8), n(REST, 8), n(REST, 8), n(G4, 4), n(REST, 8), n(REST, 8), n(REST, 8),
        n(C5, 4), n(REST, 8), n(REST, 8), n(G4, 4), n(REST, 8), n(REST, 8), n(E4, 4), n(REST, 8),
        n(REST, 8), n(A4, 4), n(REST, 8), n(B4, 4), n(REST, 8), n(AS4, 8), n(A4, 4), n(REST, 8),
        n(G4, 8), n(E5, 8), n(G5, 8), n(A5, 8), n(REST, 8), n(F5, 8), n(G5, 8),
        n(REST, 8), n(E5, 4), n(REST, 8), n(C5, 8), n(D5, 8), n(B4, 4), n(REST, 8), n(REST, 8),
    ],
};

static WINDOWS_XP_STARTUP: Melody = Melody {
    whole_note_ms: 1000,
    notes: &[
        n(DS5, 4), n(GS4, 8), n(AS4, 8), n(DS5, 2), n(GS4, 8), n(AS4, 8), n(DS5, 4),
    ],
};

static INTEL_INSIDE: Melody = Melody {
    whole_note_ms: 400,
    notes: &[n(DS4, 2), n(DS4, 2), n(GS4, 2), n(DS4, 2), n(AS4, 1)],
};

static TETRIS: Melody = Melody {
    whole_note_ms: 1000,
    notes: &[
        n(E5, 4), n(B4, 8), n(C5, 8), n(D5, 4), n(E5, 8), n(D5, 8), n(C5, 4), n(B4, 4),
        n(A4, 4), n(A4, 8), n(C5, 8), n(E5, 4), n(D5, 8), n(C5, 8), n(B4, 4),
        n(C5, 8), n(D5, 8), n(E5, 4), n(C5, 4), n(A4, 4), n(A4, 4), n(REST, 4),
        n(D5, 4), n(F5, 8), n(A5, 8), n(G5, 4), n(F5, 8), n(E5, 8),
        n(C5, 4), n(E5, 8), n(D5, 8), n(C5, 4), n(B4, 8), n(C5, 8), n(D5, 4), n(E5, 8),
        n(C5, 8), n(A4, 4), n(A4, 4),
    ],
};

static DEFAULT_TUNE: Melody = Melody {
    whole_note_ms: 2000,
    notes: &[
        n(CS4, 8), n(D4, 8), n(REST, 8), n(E4, 8), n(F4, 8), n(REST, 8), n(CS4, 8), n(D4, 8),
        n(E4, 8), n(F4, 8), n(B3, 8), n(D4, 8), n(CS4, 4), n(A3, 4), n(G3, 4), n(D3, 8),
        n(E3, 8), n(F3, 2),
    ],
};

/// Selectable melodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MelodyId {
    /// The classic ringtone.
    #[default]
    NokiaTune,
    /// Imperial March.
    ImperialMarch,
    /// Overworld theme.
    Mario,
    /// Startup chime.
    WindowsXpStartup,
    /// Five-note jingle.
    IntelInside,
    /// Korobeiniki.
    Tetris,
    /// Fallback for unknown names.
    Default,
}

impl MelodyId {
    /// Every melody, in selection-list order.
    pub const ALL: [MelodyId; 7] = [
        MelodyId::NokiaTune,
        MelodyId::ImperialMarch,
        MelodyId::Mario,
        MelodyId::WindowsXpStartup,
        MelodyId::IntelInside,
        MelodyId::Tetris,
        MelodyId::Default,
    ];

    /// Look up a melody by its configured name. Unknown names select
    /// [`MelodyId::Default`].
    ///
    /// ```
    /// use rs_parcelbox::melody::MelodyId;
    ///
    /// assert_eq!(MelodyId::from_name("TETRIS"), MelodyId::Tetris);
    /// assert_eq!(MelodyId::from_name("kazoo"), MelodyId::Default);
    /// ```
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(MelodyId::Default)
    }

    /// Configured name of the melody.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MelodyId::NokiaTune => "NOKIA_TUNE",
            MelodyId::ImperialMarch => "IMPERIAL_MARCH",
            MelodyId::Mario => "MARIO",
            MelodyId::WindowsXpStartup => "WINDOWS_XP_STARTUP",
            MelodyId::IntelInside => "INTEL_INSIDE",
            MelodyId::Tetris => "TETRIS",
            MelodyId::Default => "DEFAULT",
        }
    }

    /// The note table.
    pub fn melody(&self) -> &'static Melody {
        match self {
            MelodyId::NokiaTune => &NOKIA_TUNE,
            MelodyId::ImperialMarch => &IMPERIAL_MARCH,
            MelodyId::Mario => &MARIO,
            MelodyId::WindowsXpStartup => &WINDOWS_XP_STARTUP,
            MelodyId::IntelInside => &INTEL_INSIDE,
            MelodyId::Tetris => &TETRIS,
            MelodyId::Default => &DEFAULT_TUNE,
        }
    }
}

/// Output requested by the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneEvent {
    /// Start a tone.
    Play {
        /// Pitch in Hz, never zero.
        frequency_hz: u16,
        /// Sounding time.
        duration_ms: u32,
    },
    /// Stop the buzzer.
    Silence,
}

/// Playback cursor over one [`Melody`].
#[derive(Clone, Debug, Default)]
pub struct MelodySequencer {
    melody: Option<&'static Melody>,
    index: usize,
    note_started_at: u64,
    note_duration_ms: u32,
    sounding: bool,
    playing: bool,
}

impl MelodySequencer {
    /// An idle sequencer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart playback from the first note of `id`.
    pub fn start(&mut self, id: MelodyId, now_ms: u64) -> ToneEvent {
        let melody = id.melody();
        self.melody = Some(melody);
        self.index = 0;
        self.playing = true;
        log::debug!("melody: start {}", id.as_str());
        self.begin_note(melody, now_ms)
    }

    /// Stop playback immediately.
    pub fn stop(&mut self) -> Option<ToneEvent> {
        let was_playing = self.playing;
        self.playing = false;
        self.sounding = false;
        was_playing.then_some(ToneEvent::Silence)
    }

    /// Advance playback. Never blocks; returns at most one event per call.
    pub fn tick(&mut self, now_ms: u64) -> Option<ToneEvent> {
        if !self.playing {
            return None;
        }
        let melody = self.melody?;
        let elapsed = now_ms.saturating_sub(self.note_started_at);

        if elapsed >= gap_threshold_ms(self.note_duration_ms) {
            self.index += 1;
            if self.index < melody.notes.len() {
                return Some(self.begin_note(melody, now_ms));
            }
            self.playing = false;
            self.sounding = false;
            return Some(ToneEvent::Silence);
        }

        if self.sounding && elapsed >= self.note_duration_ms as u64 {
            self.sounding = false;
            return Some(ToneEvent::Silence);
        }

        None
    }

    /// True until the last note's gap has elapsed.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn begin_note(&mut self, melody: &'static Melody, now_ms: u64) -> ToneEvent {
        // Tables are never empty
        let note = melody.notes[self.index.min(melody.notes.len().saturating_sub(1))];
        self.note_started_at = now_ms;
        self.note_duration_ms = melody.note_duration_ms(&note);
        if note.is_rest() {
            self.sounding = false;
            ToneEvent::Silence
        } else {
            self.sounding = true;
            ToneEvent::Play {
                frequency_hz: note.frequency_hz,
                duration_ms: self.note_duration_ms,
            }
        }
    }
}
