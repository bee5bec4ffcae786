//! One-shot boot-time hardware initialisation.
//!
//! Wires the PFM probe's GPIO edge interrupt to
//! [`pfm_isr_handler`](crate::sensors::pfm::pfm_isr_handler) using raw
//! ESP-IDF sys calls. Called once from `main()` before the first
//! measurement; without it the pulse counter never increments and every
//! reading is a false 0 Hz.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::sensors::pfm::pfm_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pfm_gpio_isr(_arg: *mut core::ffi::c_void) {
    pfm_isr_handler();
}

/// Configure the probe pin and attach the rising-edge ISR.
///
/// The signal wire idles low (the probe drives pulses high), so the pin
/// gets a pull-down and a positive-edge trigger.
#[cfg(target_os = "espidf")]
pub fn init_sensor_isr(gpio: i32) -> Result<(), SensorError> {
    // SAFETY: called once from the main task before any measurement;
    // gpio_install_isr_service is idempotent (ESP_ERR_INVALID_STATE means
    // already installed). The handler only touches a static atomic.
    unsafe {
        let mut ret = gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
        if ret != ESP_OK {
            return Err(SensorError::IsrRegisterFailed);
        }
        ret = gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_PULLDOWN_ONLY);
        if ret != ESP_OK {
            return Err(SensorError::IsrRegisterFailed);
        }

        ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(SensorError::IsrRegisterFailed);
        }

        ret = gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_POSEDGE);
        if ret != ESP_OK {
            return Err(SensorError::IsrRegisterFailed);
        }
        ret = gpio_isr_handler_add(gpio, Some(pfm_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK {
            return Err(SensorError::IsrRegisterFailed);
        }
        ret = gpio_intr_enable(gpio);
        if ret != ESP_OK {
            return Err(SensorError::IsrRegisterFailed);
        }
    }
    info!("hw_init: PFM edge ISR attached to GPIO{gpio}");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_sensor_isr(gpio: i32) -> Result<(), SensorError> {
    info!("hw_init(sim): PFM ISR skipped (GPIO{gpio})");
    Ok(())
}
