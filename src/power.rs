//! Duty-cycle sleep management.
//!
//! Between cycles the device light-sleeps: the CPU halts on a timer wakeup
//! while RAM stays powered, so the calibration snapshot and the loop state
//! survive without re-reading flash every minute. On the host build the
//! suspend is a plain thread sleep.

use core::time::Duration;

use log::{debug, warn};

/// Computes and executes the inter-cycle sleep.
pub struct PowerManager {
    cycle_period: Duration,
}

impl PowerManager {
    /// Shortest sleep ever issued. Keeps a slow cycle from busy-looping
    /// and gives the serial log time to drain before the CPU halts.
    pub const MIN_SLEEP: Duration = Duration::from_secs(1);

    pub fn new(cycle_period_secs: u32) -> Self {
        Self {
            cycle_period: Duration::from_secs(u64::from(cycle_period_secs)),
        }
    }

    /// Sleep for whatever remains of the cycle period after `active` time
    /// spent measuring and rendering, floored at [`Self::MIN_SLEEP`].
    pub fn sleep_remainder(&self, active: Duration) {
        let remainder = self.remainder(active);
        debug!(
            "cycle active {:.1}s, sleeping {:.1}s",
            active.as_secs_f32(),
            remainder.as_secs_f32()
        );
        Self::suspend(remainder);
    }

    /// The sleep duration for a cycle that was busy for `active`.
    pub fn remainder(&self, active: Duration) -> Duration {
        if active >= self.cycle_period {
            warn!(
                "cycle overran its period ({:.1}s active, {:.1}s period)",
                active.as_secs_f32(),
                self.cycle_period.as_secs_f32()
            );
            return Self::MIN_SLEEP;
        }
        (self.cycle_period - active).max(Self::MIN_SLEEP)
    }

    #[cfg(target_os = "espidf")]
    fn suspend(duration: Duration) {
        // Timer-only wakeup; peripherals were already powered down by the
        // cycle itself.
        unsafe {
            esp_idf_sys::esp_sleep_enable_timer_wakeup(duration.as_micros() as u64);
            esp_idf_sys::esp_light_sleep_start();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn suspend(duration: Duration) {
        std::thread::sleep(duration);
    }
}
