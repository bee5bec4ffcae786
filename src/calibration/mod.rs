//! Two-point calibration data and its validation policy.
//!
//! Capacitive soil sensors have an INVERSE frequency relationship:
//! dry (air) reads HIGH (~20-30 Hz), wet (water) reads LOW (~0-5 Hz).
//! A calibration that violates this ordering was almost certainly taken
//! with the steps swapped and must never be persisted.

pub mod procedure;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// The sole unit of durable state: the dry/wet reference frequencies.
///
/// Overwritten wholesale on recalibration; loaded once at startup and
/// treated as immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Frequency measured with the sensor in air (Hz, expected high).
    pub dry_freq: f32,
    /// Frequency measured with the sensor in water (Hz, expected low).
    pub wet_freq: f32,
}

impl CalibrationData {
    pub fn new(dry_freq: f32, wet_freq: f32) -> Self {
        Self { dry_freq, wet_freq }
    }

    /// Apply the validation policy: strict ordering plus a generous
    /// plausibility band that catches swapped-order mistakes.
    ///
    /// Accept only if `dry_freq > wet_freq` AND `dry_freq > min_dry` AND
    /// `wet_freq < max_wet`. The ordering check runs first so a fully
    /// swapped pair reports `Swapped` rather than a band violation.
    pub fn validate(&self, min_dry_hz: f32, max_wet_hz: f32) -> Result<(), CalibrationError> {
        if !(self.dry_freq > self.wet_freq) {
            return Err(CalibrationError::Swapped);
        }
        if self.dry_freq <= min_dry_hz {
            return Err(CalibrationError::DryTooLow);
        }
        if self.wet_freq >= max_wet_hz {
            return Err(CalibrationError::WetTooHigh);
        }
        Ok(())
    }

    /// Width of the calibrated range in Hz.
    pub fn span_hz(&self) -> f32 {
        self.dry_freq - self.wet_freq
    }
}
