//! Time adapter: monotonic uptime, wall clock, and boot-time SNTP sync.
//!
//! - **`target_os = "espidf"`** — uptime from `esp_timer_get_time()`
//!   (microsecond, monotonic); wall clock from `gettimeofday` +
//!   `localtime_r`, valid only after SNTP has set the system clock.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` uptime; wall
//!   clock always absent, matching a device that never synced.
//!
//! An unsynced ESP32 boots with its clock near the epoch, so any reading
//! before 2020-01-01 is treated as "never synced" rather than rendered as
//! a 1970 timestamp.

use core::time::Duration;

use log::info;

use crate::app::events::WallClock;
use crate::app::ports::TimeSyncPort;
use crate::error::CommsError;

/// Wall-clock plausibility floor: 2020-01-01T00:00:00Z.
#[cfg(target_os = "espidf")]
const EPOCH_2020: i64 = 1_577_836_800;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

pub struct Clock {
    /// Civil-time offset from UTC, applied when formatting the wall clock.
    tz_offset_hours: i8,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Clock {
    pub fn new(tz_offset_hours: i8) -> Self {
        Self {
            tz_offset_hours,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Monotonic time since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime(&self) -> Duration {
        Duration::from_micros(unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u64)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    /// Current civil time, `None` until a successful sync.
    #[cfg(target_os = "espidf")]
    pub fn wall_clock(&self) -> Option<WallClock> {
        use core::ptr;

        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if tv.tv_sec < EPOCH_2020 {
            return None;
        }

        let local = tv.tv_sec + i64::from(self.tz_offset_hours) * 3600;
        let secs = local as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }

        Some(WallClock {
            year: (tm.tm_year + 1900) as u16,
            month: (tm.tm_mon + 1) as u8,
            day: tm.tm_mday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
            second: tm.tm_sec as u8,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn wall_clock(&self) -> Option<WallClock> {
        let _ = self.tz_offset_hours;
        None
    }
}

// ───────────────────────────────────────────────────────────────
// SNTP sync
// ───────────────────────────────────────────────────────────────

/// One-shot boot-time SNTP client behind [`TimeSyncPort`].
pub struct SntpSync;

impl SntpSync {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SntpSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSyncPort for SntpSync {
    #[cfg(target_os = "espidf")]
    fn sync(&mut self, timeout_secs: u16) -> Result<(), CommsError> {
        use esp_idf_svc::sntp::{EspSntp, SyncStatus};

        let sntp = EspSntp::new_default().map_err(|e| {
            log::warn!("SNTP init failed: {e}");
            CommsError::SyncFailed
        })?;

        let deadline_ms = u32::from(timeout_secs) * 1000;
        let mut waited_ms = 0u32;
        while waited_ms < deadline_ms {
            if sntp.get_sync_status() == SyncStatus::Completed {
                info!("SNTP: system clock set");
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(250);
            waited_ms += 250;
        }
        Err(CommsError::SyncTimeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync(&mut self, _timeout_secs: u16) -> Result<(), CommsError> {
        info!("SNTP(sim): sync complete");
        Ok(())
    }
}
