//! Wiegand credential decoding.
//!
//! The reader signals each bit as a falling edge on one of two lines: D0 for
//! a `0`, D1 for a `1`. A frame ends when the lines stay quiet for the
//! configured quiet period.
//!
//! Decoding is split across two owners:
//!
//! - [`WiegandLines`] is touched from interrupt context. It is a pair of
//!   atomics and can live in a `static`.
//! - [`WiegandDecoder`] is owned by the main loop. It claims a finished
//!   accumulator with a compare-and-swap and keeps the result in plain fields.
//!
//! ```rust
//! use rs_parcelbox::wiegand::{WiegandDecoder, WiegandLine, WiegandLines};
//! use rs_parcelbox::config::WiegandConfig;
//!
//! static LINES: WiegandLines = WiegandLines::new();
//!
//! let mut decoder = WiegandDecoder::new(&LINES, &WiegandConfig::default());
//! for (i, line) in [WiegandLine::One, WiegandLine::Zero, WiegandLine::One, WiegandLine::One]
//!     .into_iter()
//!     .enumerate()
//! {
//!     LINES.on_edge(line, i as u32);
//! }
//!
//! decoder.poll(100);
//! let frame = decoder.take_available().unwrap();
//! assert_eq!(frame.code, 0b1011);
//! assert_eq!(frame.bit_count, 4);
//! assert_eq!(frame.code_hex().as_str(), "B");
//! ```

use core::fmt::Write as _;

use portable_atomic::{AtomicU32, AtomicU64, Ordering};

use crate::config::WiegandConfig;

// Packed accumulator: code in bits 0..32, edge count in bits 32..40.
const CODE_MASK: u64 = 0xFFFF_FFFF;
const COUNT_SHIFT: u32 = 32;
const MAX_SHIFTED_BITS: u8 = 32;

#[inline]
fn unpack(state: u64) -> (u32, u8) {
    ((state & CODE_MASK) as u32, (state >> COUNT_SHIFT) as u8)
}

#[inline]
fn pack(code: u32, count: u8) -> u64 {
    ((count as u64) << COUNT_SHIFT) | code as u64
}

/// Which data line produced an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WiegandLine {
    /// D0, shifts in a `0`.
    Zero,
    /// D1, shifts in a `1`.
    One,
}

/// A completed credential frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredentialFrame {
    /// First 32 bits received, most significant first.
    pub code: u32,
    /// Every edge seen in the frame, including those past 32.
    pub bit_count: u8,
    /// Loop time at which the frame was finalized.
    pub captured_at_ms: u64,
}

/// Upper-case hex text of a credential code.
pub type CodeHex = heapless::String<8>;

impl CredentialFrame {
    /// Code as upper-case hex without leading zeros, the form used by the
    /// credential lists.
    pub fn code_hex(&self) -> CodeHex {
        let mut out = CodeHex::new();
        // 8 hex digits always fit
        let _ = write!(out, "{:X}", self.code);
        out
    }
}

/// Interrupt-side accumulator shared with the main loop.
#[derive(Debug, Default)]
pub struct WiegandLines {
    state: AtomicU64,
    last_edge_ms: AtomicU32,
}

impl WiegandLines {
    /// An empty accumulator.
    pub const fn new() -> Self {
        Self {
            state: AtomicU64::new(0),
            last_edge_ms: AtomicU32::new(0),
        }
    }

    /// Record one falling edge. Safe to call from an interrupt handler.
    ///
    /// `now_ms` is a wrapping millisecond counter. It is stored before the
    /// accumulator update so a concurrent [`WiegandDecoder::poll`] never
    /// finalizes against a stale timestamp.
    pub fn on_edge(&self, line: WiegandLine, now_ms: u32) {
        self.last_edge_ms.store(now_ms, Ordering::Release);

        let bit = match line {
            WiegandLine::Zero => 0,
            WiegandLine::One => 1,
        };

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let (code, count) = unpack(current);
            let code = if count < MAX_SHIFTED_BITS {
                (code << 1) | bit
            } else {
                code
            };
            let next = pack(code, count.saturating_add(1));

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Edges in the frame currently being received.
    pub fn pending_bits(&self) -> u8 {
        unpack(self.state.load(Ordering::Acquire)).1
    }
}

/// Main-loop side of the decoder.
#[derive(Debug)]
pub struct WiegandDecoder<'a> {
    lines: &'a WiegandLines,
    quiet_period_ms: u32,
    min_bits: u8,
    available: Option<CredentialFrame>,
}

impl<'a> WiegandDecoder<'a> {
    /// Create a decoder over `lines`.
    pub fn new(lines: &'a WiegandLines, config: &WiegandConfig) -> Self {
        Self {
            lines,
            quiet_period_ms: config.quiet_period_ms,
            min_bits: config.min_bits,
            available: None,
        }
    }

    /// Finalize the frame in progress once the lines have gone quiet.
    ///
    /// Short frames are dropped as noise. A frame that is long enough
    /// replaces any frame not yet taken.
    pub fn poll(&mut self, now_ms: u64) {
        let state = self.lines.state.load(Ordering::Acquire);
        let (code, bit_count) = unpack(state);
        if bit_count == 0 {
            return;
        }

        let last = self.lines.last_edge_ms.load(Ordering::Acquire);
        if (now_ms as u32).wrapping_sub(last) <= self.quiet_period_ms {
            return;
        }

        // An edge landed since the load; retry on the next tick.
        if self
            .lines
            .state
            .compare_exchange(state, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        if bit_count < self.min_bits {
            log::debug!("wiegand: dropped {}-bit frame", bit_count);
            return;
        }

        if self.available.is_some() {
            log::warn!("wiegand: unread frame overwritten");
        }
        self.available = Some(CredentialFrame {
            code,
            bit_count,
            captured_at_ms: now_ms,
        });
    }

    /// Take the finalized frame, if any. Returns it only once.
    pub fn take_available(&mut self) -> Option<CredentialFrame> {
        self.available.take()
    }

    /// True if a finalized frame is waiting.
    pub fn has_available(&self) -> bool {
        self.available.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(lines: &WiegandLines, bits: &[u8], start_ms: u32) {
        for (i, bit) in bits.iter().enumerate() {
            let line = if *bit == 1 {
                WiegandLine::One
            } else {
                WiegandLine::Zero
            };
            lines.on_edge(line, start_ms + i as u32);
        }
    }

    #[test]
    fn frame_not_finalized_before_quiet_period() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        send(&lines, &[1, 0, 1, 0, 1, 0], 1000);
        // last edge at 1005
        decoder.poll(1030);
        assert!(decoder.take_available().is_none());
        decoder.poll(1055);
        assert!(decoder.take_available().is_none());

        decoder.poll(1056);
        let frame = decoder.take_available().unwrap();
        assert_eq!(frame.code, 0b101010);
        assert_eq!(frame.bit_count, 6);
        assert_eq!(frame.captured_at_ms, 1056);
    }

    #[test]
    fn short_frame_is_discarded() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        send(&lines, &[1, 1, 1], 0);
        decoder.poll(200);
        assert!(decoder.take_available().is_none());
        assert_eq!(lines.pending_bits(), 0);
    }

    #[test]
    fn count_beyond_32_keeps_first_32_bits() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        let mut bits = [0u8; 34];
        bits[0] = 1;
        bits[31] = 1;
        // trailing bits past 32 must not shift in
        bits[32] = 1;
        bits[33] = 1;
        send(&lines, &bits, 0);

        decoder.poll(500);
        let frame = decoder.take_available().unwrap();
        assert_eq!(frame.bit_count, 34);
        assert_eq!(frame.code, 0x8000_0001);
    }

    #[test]
    fn take_available_is_one_shot() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        send(&lines, &[1, 1, 1, 1], 0);
        decoder.poll(100);
        assert!(decoder.has_available());
        assert!(decoder.take_available().is_some());
        assert!(decoder.take_available().is_none());
    }

    #[test]
    fn newer_frame_overwrites_unread() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        send(&lines, &[1, 1, 1, 1], 0);
        decoder.poll(100);
        send(&lines, &[0, 0, 0, 1], 200);
        decoder.poll(300);

        assert_eq!(decoder.take_available().unwrap().code, 1);
        assert!(decoder.take_available().is_none());
    }

    #[test]
    fn quiet_period_survives_counter_wrap() {
        let lines = WiegandLines::new();
        let mut decoder = WiegandDecoder::new(&lines, &WiegandConfig::default());

        send(&lines, &[1, 0, 0, 1], u32::MAX - 10);
        // 0x1_0000_0030 truncates to 0x30, 56ms after the last edge
        decoder.poll(0x1_0000_0030);
        assert_eq!(decoder.take_available().unwrap().code, 0b1001);
    }

    #[test]
    fn code_hex_upper_case_without_padding() {
        let frame = CredentialFrame {
            code: 0x001A_2B3C,
            bit_count: 26,
            captured_at_ms: 0,
        };
        assert_eq!(frame.code_hex().as_str(), "1A2B3C");
    }

    #[test]
    fn count_saturates() {
        let lines = WiegandLines::new();
        for i in 0..300u32 {
            lines.on_edge(WiegandLine::Zero, i);
        }
        assert_eq!(lines.pending_bits(), u8::MAX);
    }
}
