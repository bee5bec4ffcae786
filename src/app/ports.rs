//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (the PFM sensor, the OLED display, the calibration
//! store, SNTP) implement these traits. The
//! [`MonitorService`](super::service::MonitorService) and
//! [`CalibrationProcedure`](crate::calibration::procedure::CalibrationProcedure)
//! consume them via generics, so the domain core never touches hardware
//! directly.

use crate::calibration::CalibrationData;
use crate::error::{CommsError, DisplayError, SensorError, StoreError};

use super::events::{AppEvent, ReadingData};

// ───────────────────────────────────────────────────────────────
// Frequency sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Pulse-frequency measurement over an actively timed window.
///
/// Contract:
/// - the call blocks for `window_secs` plus fixed overhead, never longer —
///   a silent/stuck sensor yields `Ok(0.0)`, not a hang;
/// - zero observed edges is a valid reading (fully saturated soil), not an
///   error;
/// - the result is non-negative Hz.
pub trait FrequencySensor {
    fn measure(&mut self, window_secs: f32) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → collaborator)
// ───────────────────────────────────────────────────────────────

/// The monochrome display collaborator, specified at its interface
/// boundary only — blitting, pixel buffers, and I2C transactions live
/// behind the adapter.
///
/// Rendering failure must never be fatal to a cycle: the scheduler logs
/// and continues.
pub trait DisplayPort {
    /// Power the panel up. Idempotent.
    fn power_on(&mut self) -> Result<(), DisplayError>;

    /// Power the panel down. Idempotent; must succeed on error paths too.
    fn power_off(&mut self) -> Result<(), DisplayError>;

    /// Whether the panel is currently powered.
    fn is_powered(&self) -> bool;

    /// Render a completed reading (percentage, icon, raw Hz, timestamp).
    fn render(&mut self, reading: &ReadingData) -> Result<(), DisplayError>;

    /// Show up to four lines of status/instruction text.
    fn show_message(&mut self, lines: &[&str]) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Calibration store port (driven adapter: domain ↔ persistence)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the two-point calibration.
///
/// Implementations MUST validate before persisting and MUST replace the
/// previous record atomically — a crash mid-write may never leave a
/// half-written calibration observable.
pub trait CalibrationStore {
    /// Load the persisted calibration.
    ///
    /// Fails softly: a missing, unparsable, or invalid record returns
    /// `None` (the expected first-boot / corrupted-flash state) and must
    /// not crash the caller.
    fn load(&self) -> Option<CalibrationData>;

    /// Validate and atomically persist a calibration.
    ///
    /// Rejects with [`StoreError::Rejected`] without touching storage when
    /// the validation policy fails; previously persisted data stays intact.
    fn save(&mut self, data: &CalibrationData) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Time sync port (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// One-shot boot-time clock synchronisation.
///
/// Must be bounded by `timeout_secs` — an unreachable network cannot be
/// allowed to stall the device. Failure is non-fatal everywhere.
pub trait TimeSyncPort {
    fn sync(&mut self, timeout_secs: u16) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (serial log today).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
