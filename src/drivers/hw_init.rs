//! One-shot edge-input initialization.
//!
//! Configures the input pin (pull-up, falling-edge interrupt), installs
//! the per-pin GPIO ISR service and registers [`edge_isr`] using raw
//! ESP-IDF sys calls.  Called once from `main()` before the tasks start.
//! The output pin is owned by an `esp_idf_hal` `PinDriver` instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::error::HardwareError;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Input pin ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_edge_gpio() -> Result<(), HardwareError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::INPUT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        ..Default::default()
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HardwareError::GpioConfigFailed(ret));
    }
    info!("hw_init: GPIO{} input, pull-up, falling edge", pins::INPUT_GPIO);
    Ok(())
}

/// Map an ISR-setup return code onto [`HardwareError::IsrInstallFailed`].
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn check_isr(ret: i32) -> Result<(), HardwareError> {
    // 0 is ESP_OK.
    if ret == 0 {
        Ok(())
    } else {
        Err(HardwareError::IsrInstallFailed(ret))
    }
}

// ── GPIO ISR ──────────────────────────────────────────────────

/// Runs in interrupt context: one atomic store, nothing else.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_isr(_arg: *mut core::ffi::c_void) {
    let _ = crate::signal::EDGE_SIGNAL.signal();
}

/// Configure the input pin and hook its falling edge to
/// [`EDGE_SIGNAL`](crate::signal::EDGE_SIGNAL).
#[cfg(target_os = "espidf")]
pub fn init_edge_input() -> Result<(), HardwareError> {
    // SAFETY: called once from main() before any task that reads the pin;
    // the registered handler only touches an atomic.
    unsafe {
        init_edge_gpio()?;

        // ESP_ERR_INVALID_STATE means the service is already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_ERR_INVALID_STATE as i32 {
            check_isr(ret)?;
        }

        check_isr(gpio_isr_handler_add(
            pins::INPUT_GPIO,
            Some(edge_isr),
            core::ptr::null_mut(),
        ))?;
        check_isr(gpio_intr_enable(pins::INPUT_GPIO))?;
    }
    info!("hw_init: edge ISR registered on GPIO{}", pins::INPUT_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_edge_input() -> Result<(), HardwareError> {
    log::info!("hw_init(sim): edge input skipped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isr_return_codes_are_checked() {
        assert_eq!(check_isr(0), Ok(()));
        // ESP_ERR_INVALID_ARG
        assert_eq!(check_isr(0x102), Err(HardwareError::IsrInstallFailed(0x102)));
        assert_eq!(check_isr(-1), Err(HardwareError::IsrInstallFailed(-1)));
    }

    #[test]
    fn sim_init_succeeds() {
        assert_eq!(init_edge_input(), Ok(()));
    }
}
