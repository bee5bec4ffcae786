//! Frequency → moisture percentage mapping and icon classification.
//!
//! The mapping is the inverse linear interpolation between the two
//! calibration points:
//!
//! ```text
//! percent = clamp((dry_freq - raw) / (dry_freq - wet_freq) * 100, 0, 100)
//! ```
//!
//! Readings outside the calibrated range saturate at 0 % / 100 % rather
//! than producing out-of-band values or demanding recalibration.

use log::warn;

use crate::calibration::CalibrationData;
use crate::error::{Error, Result};

/// Moisture level in percent, 0 (bone dry) to 100 (saturated).
pub type MoisturePercent = f32;

// ---------------------------------------------------------------------------
// Icon classification
// ---------------------------------------------------------------------------

/// The three-state display icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconClass {
    /// 0–33 %: empty drop (time to water).
    Empty,
    /// 34–66 %: half drop.
    Half,
    /// 67–100 %: full drop.
    Full,
}

/// Ordered `(exclusive upper bound, icon)` table. Thresholds are data, not
/// chained comparisons; the final row's bound is unreachable by a clamped
/// percentage and acts as the catch-all.
pub const ICON_TABLE: [(f32, IconClass); 3] = [
    (34.0, IconClass::Empty),
    (67.0, IconClass::Half),
    (f32::INFINITY, IconClass::Full),
];

impl IconClass {
    /// Select the icon for a moisture percentage using [`ICON_TABLE`].
    pub fn for_percent(percent: MoisturePercent) -> Self {
        Self::classify(percent, &ICON_TABLE)
    }

    /// Table-driven classification: first row whose upper bound exceeds
    /// `percent` wins. The table must be sorted by bound and end with an
    /// unbounded row.
    pub fn classify(percent: MoisturePercent, table: &[(f32, IconClass)]) -> Self {
        for &(upper, icon) in table {
            if percent < upper {
                return icon;
            }
        }
        // Unreachable with a well-formed table; saturate rather than panic.
        IconClass::Full
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Map a raw frequency reading onto the calibrated moisture scale.
///
/// Clamps to `[0, 100]`: a reading above `dry_freq` (drier than the
/// calibration's dry point) yields 0 %, below `wet_freq` yields 100 %.
pub fn estimate(raw_hz: f32, cal: &CalibrationData) -> MoisturePercent {
    let span = cal.span_hz();
    if span <= 0.0 {
        // Degenerate calibration should have been rejected at save time;
        // report dry rather than dividing by zero.
        warn!("degenerate calibration (span {span:.2} Hz), reporting 0%");
        return 0.0;
    }
    let percent = (cal.dry_freq - raw_hz) / span * 100.0;
    percent.clamp(0.0, 100.0)
}

/// The estimator proper: holds the immutable calibration snapshot loaded
/// once at startup (or none, for the first-boot uncalibrated state).
#[derive(Debug, Clone, Copy)]
pub struct MoistureEstimator {
    snapshot: Option<CalibrationData>,
}

impl MoistureEstimator {
    /// Build from the store's load result. `None` puts the estimator in
    /// uncalibrated mode, where it refuses to produce a percentage. A
    /// degenerate snapshot (non-positive span) is demoted to uncalibrated
    /// rather than carried into every cycle's arithmetic.
    pub fn new(snapshot: Option<CalibrationData>) -> Self {
        let snapshot = match snapshot {
            Some(cal) if cal.span_hz() <= 0.0 => {
                warn!("degenerate calibration snapshot discarded, running uncalibrated");
                None
            }
            other => other,
        };
        Self { snapshot }
    }

    pub fn is_calibrated(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The loaded snapshot, if any.
    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.snapshot.as_ref()
    }

    /// Convert a raw reading, or signal the explicit uncalibrated condition.
    pub fn estimate(&self, raw_hz: f32) -> Result<MoisturePercent> {
        let cal = self.snapshot.as_ref().ok_or(Error::Uncalibrated)?;
        Ok(estimate(raw_hz, cal))
    }
}
