//! The duty-cycle core: one measurement cycle, start to finish.
//!
//! A cycle is strictly sequential — power the display, measure, estimate,
//! render, hold, power down — and every exit path, error or not, ends with
//! the display powered off. The panel draws more than the MCU; leaving it
//! lit after a fault would drain the battery faster than the fault itself.
//!
//! The service owns no hardware. It drives the [`FrequencySensor`] and
//! [`DisplayPort`] ports handed to it each cycle and reports what happened
//! through the [`EventSink`] and the returned [`CycleOutcome`].

use log::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{DisplayError, SensorError};
use crate::moisture::{IconClass, MoistureEstimator};

use super::events::{AppEvent, ReadingData, WallClock};
use super::ports::{DisplayPort, EventSink, FrequencySensor};

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// What a single cycle produced. The scheduler sleeps the same either way;
/// the outcome only drives logging and (later) telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// A reading was produced and rendered.
    Rendered(ReadingData),
    /// No calibration loaded; the uncalibrated indicator was shown instead.
    Uncalibrated,
    /// The sensor could not be read; nothing was rendered.
    SensorFault(SensorError),
    /// A reading was produced but the display rejected it.
    RenderFailed(ReadingData, DisplayError),
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Runs measurement cycles against a fixed calibration snapshot.
///
/// The snapshot is immutable for the life of the process: recalibrating
/// requires a restart, which keeps every cycle's arithmetic consistent and
/// removes any estimator locking.
pub struct MonitorService<E: EventSink> {
    estimator: MoistureEstimator,
    sample_window_secs: f32,
    display_hold_secs: u16,
    events: E,
    signal_seen_since_boot: bool,
}

impl<E: EventSink> MonitorService<E> {
    pub fn new(estimator: MoistureEstimator, cfg: &MonitorConfig, events: E) -> Self {
        Self {
            estimator,
            sample_window_secs: cfg.sample_window_secs,
            display_hold_secs: cfg.display_hold_secs,
            events,
            signal_seen_since_boot: false,
        }
    }

    /// The event sink, for inspection by tests and diagnostics.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Announce startup. Call once, before the first cycle.
    pub fn start(&mut self) {
        let calibrated = self.estimator.is_calibrated();
        if calibrated {
            info!("monitor started, calibration loaded");
        } else {
            warn!("monitor started UNCALIBRATED — run the calibrate mode");
        }
        self.events.emit(&AppEvent::Started { calibrated });
    }

    /// Run one full measurement cycle.
    ///
    /// `now` is the wall-clock timestamp for the rendered frame, `None`
    /// when NTP never synced at boot.
    pub fn run_cycle(
        &mut self,
        sensor: &mut impl FrequencySensor,
        display: &mut impl DisplayPort,
        now: Option<WallClock>,
    ) -> CycleOutcome {
        if let Err(e) = display.power_on() {
            // Keep measuring: the reading still reaches the log even if
            // the panel stays dark this cycle.
            warn!("display power-on failed: {e}");
        }

        let raw_hz = match sensor.measure(self.sample_window_secs) {
            Ok(hz) => hz,
            Err(e) => {
                warn!("sensor fault: {e}");
                self.events.emit(&AppEvent::SensorFault(e));
                self.finish(display);
                return CycleOutcome::SensorFault(e);
            }
        };
        debug!("raw frequency: {raw_hz:.2} Hz");
        self.note_signal(raw_hz);

        let percent = match self.estimator.estimate(raw_hz) {
            Ok(p) => p,
            Err(_) => {
                info!("uncalibrated cycle: raw {raw_hz:.2} Hz, no percentage");
                if let Err(e) = display.show_message(&["NOT", "CALIBRATED", "", "Run calibrate"]) {
                    warn!("uncalibrated indicator failed: {e}");
                }
                self.events.emit(&AppEvent::Uncalibrated);
                self.hold();
                self.finish(display);
                return CycleOutcome::Uncalibrated;
            }
        };

        let reading = ReadingData {
            raw_hz,
            percent,
            icon: IconClass::for_percent(percent),
            timestamp: now,
        };
        info!(
            "moisture {percent:.1}% ({raw_hz:.2} Hz, {:?})",
            reading.icon
        );

        let outcome = match display.render(&reading) {
            Ok(()) => {
                self.events.emit(&AppEvent::CycleCompleted(reading));
                self.hold();
                CycleOutcome::Rendered(reading)
            }
            Err(e) => {
                warn!("render failed: {e}");
                self.events.emit(&AppEvent::RenderFailed(e));
                CycleOutcome::RenderFailed(reading, e)
            }
        };

        self.finish(display);
        outcome
    }

    // ── Internal ──────────────────────────────────────────────

    /// Track whether the probe has ever produced an edge. 0 Hz is a valid
    /// fully-wet reading, but 0 Hz on every cycle since boot more likely
    /// means a disconnected signal wire; flag it without failing the cycle.
    fn note_signal(&mut self, raw_hz: f32) {
        if raw_hz > 0.0 {
            self.signal_seen_since_boot = true;
        } else if !self.signal_seen_since_boot {
            warn!("0 Hz and no signal observed since boot — probe disconnected?");
            self.events.emit(&AppEvent::ProbeSilent);
        }
    }

    /// Keep the frame visible before the panel goes dark.
    fn hold(&self) {
        if self.display_hold_secs == 0 {
            return;
        }
        #[cfg(target_os = "espidf")]
        esp_idf_hal::delay::FreeRtos::delay_ms(u32::from(self.display_hold_secs) * 1000);
        #[cfg(not(target_os = "espidf"))]
        std::thread::sleep(std::time::Duration::from_secs(u64::from(
            self.display_hold_secs,
        )));
    }

    /// Unconditional end-of-cycle power-down. A failure here is logged and
    /// swallowed: there is nothing better to do, and the next cycle's
    /// power-on is idempotent.
    fn finish(&mut self, display: &mut impl DisplayPort) {
        if let Err(e) = display.power_off() {
            warn!("display power-off failed: {e}");
        }
    }
}
