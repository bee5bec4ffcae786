//! System configuration parameters
//!
//! All tunable parameters for the Grow moisture monitor. Defaults carry the
//! shipped firmware constants; a deployment can override them with a JSON
//! record next to the calibration file.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Core monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Duty cycle ---
    /// Seconds between readings (one full wake/sleep cycle).
    pub cycle_period_secs: u32,
    /// Seconds to count sensor pulses for one reading.
    pub sample_window_secs: f32,
    /// Seconds the display stays on after rendering, before power-down.
    pub display_hold_secs: u16,

    // --- Calibration procedure ---
    /// Countdown given to the operator to reposition the sensor per step.
    pub cal_prep_secs: u16,
    /// Pulse-count window for each calibration sample.
    pub cal_sample_window_secs: f32,
    /// Samples averaged per calibration step.
    pub cal_sample_count: u8,

    // --- Calibration plausibility band ---
    /// A dry (in-air) frequency below this is rejected as implausible.
    pub min_dry_freq_hz: f32,
    /// A wet (in-water) frequency above this is rejected as implausible.
    pub max_wet_freq_hz: f32,

    // --- Boot-time network sync ---
    /// WiFi association timeout. Expiry is non-fatal.
    pub wifi_timeout_secs: u16,
    /// SNTP sync timeout. Expiry is non-fatal.
    pub sntp_timeout_secs: u16,
    /// Hours added to the synced UTC clock when rendering timestamps.
    pub timezone_offset_hours: i8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Duty cycle
            cycle_period_secs: 60,
            sample_window_secs: 2.0,
            display_hold_secs: 10,

            // Calibration
            cal_prep_secs: 10,
            cal_sample_window_secs: 3.0,
            cal_sample_count: 3,

            // Plausibility: dry (air) reads ~20-30 Hz, wet (water) ~0-5 Hz
            min_dry_freq_hz: 15.0,
            max_wet_freq_hz: 10.0,

            // Network
            wifi_timeout_secs: 15,
            sntp_timeout_secs: 10,
            timezone_offset_hours: 0,
        }
    }
}

/// Range-check a configuration before use. Invalid values are rejected,
/// not silently clamped.
pub fn validate_config(cfg: &MonitorConfig) -> Result<(), Error> {
    if !(10..=86_400).contains(&cfg.cycle_period_secs) {
        return Err(Error::Init("cycle_period_secs must be 10–86400"));
    }
    if !(0.1..=30.0).contains(&cfg.sample_window_secs) {
        return Err(Error::Init("sample_window_secs must be 0.1–30.0"));
    }
    if u32::from(cfg.display_hold_secs) >= cfg.cycle_period_secs {
        return Err(Error::Init("display_hold_secs must be < cycle_period_secs"));
    }
    if !(0.5..=30.0).contains(&cfg.cal_sample_window_secs) {
        return Err(Error::Init("cal_sample_window_secs must be 0.5–30.0"));
    }
    if cfg.cal_sample_count == 0 {
        return Err(Error::Init("cal_sample_count must be >= 1"));
    }
    if cfg.min_dry_freq_hz <= cfg.max_wet_freq_hz {
        return Err(Error::Init(
            "min_dry_freq_hz must be above max_wet_freq_hz",
        ));
    }
    if cfg.wifi_timeout_secs == 0 || cfg.sntp_timeout_secs == 0 {
        return Err(Error::Init("network timeouts must be >= 1 second"));
    }
    Ok(())
}
