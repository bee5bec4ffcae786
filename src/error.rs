//! Unified error types for the Grow monitor firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! duty-cycle loop's error handling uniform. All variants are `Copy` so they
//! can be cheaply passed through the cycle report without allocation.
//!
//! The propagation policy is deliberate: everything below the scheduler is
//! caught and degrades the current cycle; only bus/peripheral initialisation
//! at boot is allowed to halt the process.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pulse sensor could not be read.
    Sensor(SensorError),
    /// A calibration record failed the validation policy.
    Calibration(CalibrationError),
    /// The persisted calibration could not be read or written.
    Store(StoreError),
    /// No valid calibration is available; the estimator refuses to guess.
    Uncalibrated,
    /// WiFi or time-sync failure (always non-fatal to sensing).
    Comms(CommsError),
    /// Display I/O error during a cycle.
    Display(DisplayError),
    /// Peripheral initialisation failed at boot.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Uncalibrated => write!(f, "no valid calibration loaded"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Failures while measuring the PFM pulse frequency.
///
/// A zero-edge window is NOT an error: it is a legitimate fully-wet reading.
/// "Sensor disconnected" is indistinguishable at this layer (same 0 Hz) and
/// is only flagged heuristically by the scheduler's since-boot diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    PinReadFailed,
    /// Edge-interrupt registration failed.
    IsrRegisterFailed,
    /// The requested sampling window is zero or negative.
    InvalidWindow,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinReadFailed => write!(f, "GPIO read failed"),
            Self::IsrRegisterFailed => write!(f, "edge ISR registration failed"),
            Self::InvalidWindow => write!(f, "sampling window must be > 0"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration validation errors
// ---------------------------------------------------------------------------

/// Reasons a two-point calibration is rejected. Each maps to an
/// operator-facing diagnostic during the calibration procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// `dry_freq <= wet_freq` — the measurements were almost certainly taken
    /// in the wrong order (capacitive sensors are inverse: dry is HIGH).
    Swapped,
    /// Dry frequency below the plausibility floor — sensor probably was not
    /// actually in air.
    DryTooLow,
    /// Wet frequency above the plausibility ceiling — sensor probably was
    /// not actually submerged.
    WetTooHigh,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swapped => write!(f, "dry frequency must be higher than wet (swapped readings?)"),
            Self::DryTooLow => write!(f, "dry frequency implausibly low (sensor not in air?)"),
            Self::WetTooHigh => write!(f, "wet frequency implausibly high (sensor not in water?)"),
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Calibration store failures. `NotFound` and `Corrupted` are the expected
/// first-boot / bad-flash states and must degrade to uncalibrated mode,
/// never crash the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No persisted calibration exists (first boot).
    NotFound,
    /// Stored record is unparsable or fails validation.
    Corrupted,
    /// A calibration was rejected by the validation policy before persisting.
    Rejected(CalibrationError),
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no calibration stored"),
            Self::Corrupted => write!(f, "stored calibration corrupted"),
            Self::Rejected(e) => write!(f, "rejected: {e}"),
            Self::Io => write!(f, "storage I/O error"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// No WiFi credentials file / record found.
    NoCredentials,
    /// Credentials present but malformed (bad ssid/password shape).
    InvalidCredentials,
    /// Association with the access point failed or timed out.
    WifiConnectFailed,
    /// SNTP did not deliver a timestamp within the timeout.
    SyncTimeout,
    /// SNTP responded but the result was unusable.
    SyncFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid"),
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::SyncTimeout => write!(f, "time sync timed out"),
            Self::SyncFailed => write!(f, "time sync failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// I2C transaction failed.
    BusError,
    /// Power-state change (poweron/poweroff) failed.
    PowerFailed,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C transaction failed"),
            Self::PowerFailed => write!(f, "display power toggle failed"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
