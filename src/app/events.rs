//! Outbound application events and shared value types.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — log to serial, or later a
//! telemetry uplink.

use core::fmt;

use crate::error::{CommsError, DisplayError, SensorError};
use crate::moisture::IconClass;

/// Civil wall-clock time, valid only after a successful NTP sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// One completed reading, as handed to the display collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingData {
    /// Raw pulse frequency in Hz.
    pub raw_hz: f32,
    /// Calibrated moisture percentage (0–100).
    pub percent: f32,
    /// Icon class derived from the percentage.
    pub icon: IconClass,
    /// Wall-clock timestamp, `None` when NTP never synced.
    pub timestamp: Option<WallClock>,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The monitor service has started (carries calibration presence).
    Started { calibrated: bool },

    /// A cycle produced and rendered a reading.
    CycleCompleted(ReadingData),

    /// A cycle ran without calibration (indicator shown instead of a value).
    Uncalibrated,

    /// 0 Hz read and no edge has ever been observed since boot — the
    /// probe may be disconnected. The cycle still completes; 0 Hz remains
    /// a valid fully-wet reading.
    ProbeSilent,

    /// The sensor could not be read this cycle.
    SensorFault(SensorError),

    /// The reading was produced but the display rejected it.
    RenderFailed(DisplayError),

    /// Boot-time NTP sync succeeded.
    TimeSynced(WallClock),

    /// Boot-time NTP sync failed or timed out (cycle proceeds regardless).
    TimeSyncFailed(CommsError),
}
