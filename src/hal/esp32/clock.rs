//! Millisecond time from the ESP-IDF high-resolution timer.

use crate::traits::Clock;
use esp_idf_hal::sys::esp_timer_get_time;

/// Milliseconds since boot, read from `esp_timer`.
///
/// ```ignore
/// use rs_parcelbox::hal::esp32::Esp32Clock;
/// use rs_parcelbox::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// controller.tick(clock.now_ms(), switches, &credentials)?;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// The boot-relative clock.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn micros_since_boot() -> i64 {
    // Plain counter read; the function lives in IRAM so ISRs may call it too
    unsafe { esp_timer_get_time() }
}

/// Truncated millisecond counter for the reader interrupts.
///
/// Wraps after about 49 days; the Wiegand quiet-period check is wrap-safe.
#[inline]
pub(super) fn isr_now_ms() -> u32 {
    (micros_since_boot() / 1000) as u32
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        (micros_since_boot() / 1000) as u64
    }
}
