//! PFM moisture probe frequency meters.
//!
//! Two implementations of the [`FrequencySensor`] port:
//!
//! - [`PfmSensor`] — ISR-driven. A rising-edge GPIO interrupt increments a
//!   static atomic counter; `measure` zeroes it, sleeps the window, and
//!   reads it back. This is the production path on the device.
//! - [`PolledPfmMeter`] — portable polled edge counter generic over
//!   `embedded-hal` traits, for bench rigs and host tests where no ISR is
//!   available.
//!
//! Both actively time the window (never "count until N edges"), so a
//! silent or disconnected probe yields 0 Hz after exactly one window
//! instead of blocking forever. Worst-case call latency is therefore
//! `window_secs` plus fixed overhead.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::app::ports::FrequencySensor;
use crate::error::SensorError;
use crate::sensors::frequency_hz;

// ---------------------------------------------------------------------------
// ISR-driven meter
// ---------------------------------------------------------------------------

/// Global atomic counter incremented by the GPIO ISR.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
static PFM_PULSE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Called from the GPIO ISR on each rising edge of the probe signal.
pub fn pfm_isr_handler() {
    PFM_PULSE_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// ISR-driven pulse-frequency meter.
///
/// The edge interrupt is registered at boot (see `adapters::hardware` on
/// the device build); this type only owns the sampling arithmetic.
pub struct PfmSensor {
    /// GPIO pin number (stored for diagnostics / re-init).
    _gpio: i32,
}

impl PfmSensor {
    pub fn new(gpio: i32) -> Self {
        Self { _gpio: gpio }
    }

    #[cfg(target_os = "espidf")]
    fn sleep_window(window_secs: f32) {
        esp_idf_hal::delay::FreeRtos::delay_ms((window_secs * 1000.0) as u32);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_window(window_secs: f32) {
        std::thread::sleep(std::time::Duration::from_secs_f32(window_secs));
    }
}

impl FrequencySensor for PfmSensor {
    fn measure(&mut self, window_secs: f32) -> Result<f32, SensorError> {
        if !(window_secs > 0.0) {
            return Err(SensorError::InvalidWindow);
        }

        // Discard edges accumulated since the previous cycle, then count
        // for exactly one window.
        PFM_PULSE_COUNT.store(0, Ordering::Relaxed);
        Self::sleep_window(window_secs);
        let count = PFM_PULSE_COUNT.swap(0, Ordering::Relaxed);

        Ok(frequency_hz(count, window_secs))
    }
}

// ---------------------------------------------------------------------------
// Polled meter (embedded-hal generic)
// ---------------------------------------------------------------------------

/// Polled rising-edge counter over any `embedded-hal` input pin.
///
/// Samples the pin every `poll_interval_us` microseconds for the requested
/// window. The poll rate bounds the measurable frequency (Nyquist); the
/// default 1 ms interval comfortably covers the probe's 0–35 Hz range.
pub struct PolledPfmMeter<P, D> {
    pin: P,
    delay: D,
    poll_interval_us: u32,
}

impl<P: InputPin, D: DelayNs> PolledPfmMeter<P, D> {
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            pin,
            delay,
            poll_interval_us: 1_000,
        }
    }

    /// Override the poll interval (microseconds, must be non-zero).
    pub fn with_poll_interval_us(mut self, us: u32) -> Self {
        self.poll_interval_us = us.max(1);
        self
    }
}

impl<P: InputPin, D: DelayNs> FrequencySensor for PolledPfmMeter<P, D> {
    fn measure(&mut self, window_secs: f32) -> Result<f32, SensorError> {
        if !(window_secs > 0.0) {
            return Err(SensorError::InvalidWindow);
        }

        let window_us = (window_secs * 1_000_000.0) as u64;
        let polls = (window_us / u64::from(self.poll_interval_us)).max(1);

        let mut edges: u32 = 0;
        let mut last_high = self
            .pin
            .is_high()
            .map_err(|_| SensorError::PinReadFailed)?;

        for _ in 0..polls {
            self.delay.delay_us(self.poll_interval_us);
            let high = self
                .pin
                .is_high()
                .map_err(|_| SensorError::PinReadFailed)?;
            if high && !last_high {
                edges += 1;
            }
            last_high = high;
        }

        Ok(frequency_hz(edges, window_secs))
    }
}
