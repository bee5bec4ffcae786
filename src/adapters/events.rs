//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC on the device). A telemetry uplink would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { calibrated } => {
                info!("START | calibrated={calibrated}");
            }
            AppEvent::CycleCompleted(r) => {
                info!(
                    "CYCLE | {:5.1}% | {:.2} Hz | icon={:?}",
                    r.percent, r.raw_hz, r.icon
                );
            }
            AppEvent::Uncalibrated => {
                warn!("CYCLE | uncalibrated, no percentage produced");
            }
            AppEvent::ProbeSilent => {
                warn!("PROBE | 0 Hz and no signal since boot — check wiring");
            }
            AppEvent::SensorFault(e) => {
                warn!("FAULT | sensor: {e}");
            }
            AppEvent::RenderFailed(e) => {
                warn!("FAULT | display: {e}");
            }
            AppEvent::TimeSynced(ts) => {
                info!("TIME  | synced: {ts}");
            }
            AppEvent::TimeSyncFailed(e) => {
                warn!("TIME  | sync failed ({e}), timestamps disabled");
            }
        }
    }
}
