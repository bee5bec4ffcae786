//! Sensor subsystem — pulse-frequency acquisition from the PFM moisture probe.
//!
//! The Grow probe encodes moisture as pulse frequency on its signal wire
//! (PFM). Everything here turns edges-over-a-window into Hz; the
//! calibrated interpretation lives in [`crate::moisture`].

pub mod pfm;

/// Edge count over a window → average frequency in Hz.
///
/// Guards the degenerate window so a misconfigured caller gets 0 Hz
/// instead of an infinity that would poison the estimator.
pub fn frequency_hz(edge_count: u32, window_secs: f32) -> f32 {
    if window_secs > 0.0 {
        edge_count as f32 / window_secs
    } else {
        0.0
    }
}
