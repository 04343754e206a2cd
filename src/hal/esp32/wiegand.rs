//! Falling-edge interrupts for the Wiegand D0/D1 lines.
//!
//! The reader pulls a line low for about 50µs per bit, too short to poll.
//! Both pins get a GPIO interrupt that feeds [`WiegandLines::on_edge`];
//! the main loop drains the result through a `WiegandDecoder`.
//!
//! `PinDriver::subscribe` disarms the interrupt after every trigger, which
//! would drop bits of a 26-bit burst, so the ISR service is set up directly.

use super::clock::isr_now_ms;
use super::pins;
use crate::wiegand::{WiegandLine, WiegandLines};
use esp_idf_hal::sys::{self, esp, EspError};

unsafe extern "C" fn on_d0(arg: *mut core::ffi::c_void) {
    // arg is the `&'static WiegandLines` registered below
    let lines = &*(arg as *const WiegandLines);
    lines.on_edge(WiegandLine::Zero, isr_now_ms());
}

unsafe extern "C" fn on_d1(arg: *mut core::ffi::c_void) {
    let lines = &*(arg as *const WiegandLines);
    lines.on_edge(WiegandLine::One, isr_now_ms());
}

/// Configure D0/D1 as pulled-up inputs and attach the edge handlers.
///
/// The lines must live for the rest of the program, typically as a `static`.
///
/// # Errors
///
/// Returns an error if GPIO or ISR service setup fails. An ISR service that
/// is already installed is not an error.
pub fn install_wiegand_isr(lines: &'static WiegandLines) -> Result<(), EspError> {
    let io_conf = sys::gpio_config_t {
        pin_bit_mask: (1u64 << pins::WIEGAND_D0) | (1u64 << pins::WIEGAND_D1),
        mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: sys::gpio_int_type_t_GPIO_INTR_NEGEDGE,
        ..Default::default()
    };
    esp!(unsafe { sys::gpio_config(&io_conf) })?;

    let err = unsafe { sys::gpio_install_isr_service(0) };
    if err != sys::ESP_ERR_INVALID_STATE as sys::esp_err_t {
        esp!(err)?;
    }

    let arg = lines as *const WiegandLines as *mut core::ffi::c_void;
    esp!(unsafe { sys::gpio_isr_handler_add(pins::WIEGAND_D0, Some(on_d0), arg) })?;
    esp!(unsafe { sys::gpio_isr_handler_add(pins::WIEGAND_D1, Some(on_d1), arg) })?;

    log::info!(
        "wiegand: edge interrupts on GPIO{} (D0) and GPIO{} (D1)",
        pins::WIEGAND_D0,
        pins::WIEGAND_D1
    );
    Ok(())
}
