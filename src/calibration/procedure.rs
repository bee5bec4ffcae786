//! Guided two-step calibration procedure.
//!
//! A button-less, time-staged state machine:
//!
//! ```text
//!  IDLE ──start()──▶ AWAITING-DRY ──[countdown, then sample]──▶ AWAITING-WET
//!    ▲                                                              │
//!    │                                              [countdown, then sample]
//!    │                                                              ▼
//!    └───────[rejected: reason shown, retry]──── VALIDATING ──▶ SAVED
//! ```
//!
//! Each `Awaiting*` step gives the operator a countdown to position the
//! probe (in air for dry, in water for wet), then averages several
//! frequency samples over a short window — averaging damps contact jitter
//! from manual positioning. `Validating` applies the store's policy; a
//! rejection surfaces its specific reason and drops back to `Idle` with
//! nothing persisted, so the operator can simply run the steps again.
//!
//! One `tick()` advances one second of procedure time, which keeps the
//! whole machine deterministic under test; the binary paces ticks against
//! the real clock.

use log::{info, warn};

use crate::app::ports::{CalibrationStore, DisplayPort, FrequencySensor};
use crate::calibration::CalibrationData;
use crate::config::MonitorConfig;
use crate::error::{CalibrationError, SensorError, StoreError};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Procedure state. `Saved` is terminal; `Rejected` reports for one tick
/// and then returns to `Idle` for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureState {
    Idle,
    AwaitingDrySample { remaining_secs: u16 },
    AwaitingWetSample { remaining_secs: u16 },
    Validating,
    Saved,
    Rejected(CalibrationError),
}

impl ProcedureState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Saved)
    }
}

// ---------------------------------------------------------------------------
// Procedure
// ---------------------------------------------------------------------------

/// The guided dry/wet acquisition sequence.
pub struct CalibrationProcedure {
    state: ProcedureState,
    prep_secs: u16,
    sample_window_secs: f32,
    sample_count: u8,
    min_dry_hz: f32,
    max_wet_hz: f32,
    dry_freq: Option<f32>,
    wet_freq: Option<f32>,
}

impl CalibrationProcedure {
    pub fn new(cfg: &MonitorConfig) -> Self {
        Self {
            state: ProcedureState::Idle,
            prep_secs: cfg.cal_prep_secs,
            sample_window_secs: cfg.cal_sample_window_secs,
            sample_count: cfg.cal_sample_count,
            min_dry_hz: cfg.min_dry_freq_hz,
            max_wet_hz: cfg.max_wet_freq_hz,
            dry_freq: None,
            wet_freq: None,
        }
    }

    pub fn state(&self) -> ProcedureState {
        self.state
    }

    /// Kick off the procedure: announce step 1 and start its countdown.
    pub fn start(&mut self, display: &mut impl DisplayPort) {
        if self.state != ProcedureState::Idle {
            warn!("calibration start ignored in {:?}", self.state);
            return;
        }
        self.dry_freq = None;
        self.wet_freq = None;
        info!("calibration: step 1 (DRY) — hold the sensor in air");
        show(display, &["STEP 1:", "Remove sensor", "Hold in AIR", ""]);
        self.transition(ProcedureState::AwaitingDrySample {
            remaining_secs: self.prep_secs,
        });
    }

    /// Advance one second of procedure time.
    ///
    /// Countdown ticks return quickly; the tick that ends a countdown
    /// blocks for `sample_count × sample_window_secs` while measuring.
    pub fn tick(
        &mut self,
        sensor: &mut impl FrequencySensor,
        display: &mut impl DisplayPort,
        store: &mut impl CalibrationStore,
    ) -> ProcedureState {
        match self.state {
            ProcedureState::Idle | ProcedureState::Saved => {}

            ProcedureState::AwaitingDrySample { remaining_secs } => {
                if remaining_secs > 0 {
                    countdown(display, "DRY - hold in air", remaining_secs);
                    self.state = ProcedureState::AwaitingDrySample {
                        remaining_secs: remaining_secs - 1,
                    };
                } else {
                    show(display, &["Measuring...", "DRY reading", "Hold still!", ""]);
                    match self.sample_average(sensor) {
                        Ok(hz) => {
                            info!("calibration: dry frequency {hz:.2} Hz");
                            show_reading(display, "DRY reading:", hz);
                            self.dry_freq = Some(hz);
                            show(display, &["STEP 2:", "Put sensor", "in WATER", ""]);
                            self.transition(ProcedureState::AwaitingWetSample {
                                remaining_secs: self.prep_secs,
                            });
                        }
                        Err(e) => self.abort_on_sensor_fault(display, e),
                    }
                }
            }

            ProcedureState::AwaitingWetSample { remaining_secs } => {
                if remaining_secs > 0 {
                    countdown(display, "WET - put in water", remaining_secs);
                    self.state = ProcedureState::AwaitingWetSample {
                        remaining_secs: remaining_secs - 1,
                    };
                } else {
                    show(display, &["Measuring...", "WET reading", "Hold still!", ""]);
                    match self.sample_average(sensor) {
                        Ok(hz) => {
                            info!("calibration: wet frequency {hz:.2} Hz");
                            show_reading(display, "WET reading:", hz);
                            self.wet_freq = Some(hz);
                            self.transition(ProcedureState::Validating);
                        }
                        Err(e) => self.abort_on_sensor_fault(display, e),
                    }
                }
            }

            ProcedureState::Validating => {
                // Both samples are present by construction of the machine.
                let (Some(dry), Some(wet)) = (self.dry_freq, self.wet_freq) else {
                    warn!("calibration: validating without both samples, resetting");
                    self.transition(ProcedureState::Idle);
                    return self.state;
                };
                let data = CalibrationData::new(dry, wet);

                match data.validate(self.min_dry_hz, self.max_wet_hz) {
                    Ok(()) => match store.save(&data) {
                        Ok(()) => {
                            info!(
                                "calibration saved: dry={dry:.2} Hz, wet={wet:.2} Hz (span {:.2} Hz)",
                                data.span_hz()
                            );
                            show(display, &["Calibration", "COMPLETE!", "", "Saved!"]);
                            self.transition(ProcedureState::Saved);
                        }
                        Err(StoreError::Rejected(reason)) => self.reject(display, reason),
                        Err(e) => {
                            // Persistence failed after a valid measurement;
                            // nothing was overwritten, so a retry is safe.
                            warn!("calibration save failed: {e}");
                            show(display, &["Save FAILED", "", "Try again", ""]);
                            self.transition(ProcedureState::Idle);
                        }
                    },
                    Err(reason) => self.reject(display, reason),
                }
            }

            ProcedureState::Rejected(_) => {
                // Reported last tick; ready for another attempt.
                self.transition(ProcedureState::Idle);
            }
        }

        self.state
    }

    // ── Internal ──────────────────────────────────────────────

    /// Average `sample_count` measurements over the configured window.
    fn sample_average(&self, sensor: &mut impl FrequencySensor) -> Result<f32, SensorError> {
        let mut sum = 0.0;
        for _ in 0..self.sample_count {
            sum += sensor.measure(self.sample_window_secs)?;
        }
        Ok(sum / f32::from(self.sample_count))
    }

    fn reject(&mut self, display: &mut impl DisplayPort, reason: CalibrationError) {
        warn!("calibration rejected: {reason}");
        let line = match reason {
            CalibrationError::Swapped => "Dry <= Wet",
            CalibrationError::DryTooLow => "Low dry freq",
            CalibrationError::WetTooHigh => "High wet freq",
        };
        show(display, &["ERROR!", line, "Try again", ""]);
        self.transition(ProcedureState::Rejected(reason));
    }

    fn abort_on_sensor_fault(&mut self, display: &mut impl DisplayPort, e: SensorError) {
        warn!("calibration aborted, sensor fault: {e}");
        show(display, &["Sensor FAULT", "", "Check wiring", ""]);
        self.transition(ProcedureState::Idle);
    }

    fn transition(&mut self, next: ProcedureState) {
        info!("calibration: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

// ---------------------------------------------------------------------------
// Display helpers (failure is never fatal to the procedure)
// ---------------------------------------------------------------------------

fn show(display: &mut impl DisplayPort, lines: &[&str]) {
    if let Err(e) = display.show_message(lines) {
        warn!("calibration display write failed: {e}");
    }
}

fn countdown(display: &mut impl DisplayPort, message: &str, secs: u16) {
    use core::fmt::Write;
    let mut line: heapless::String<16> = heapless::String::new();
    let _ = write!(line, "{secs} seconds...");
    info!("{message} - {secs} seconds remaining");
    show(display, &[message, "", line.as_str(), "Get ready!"]);
}

fn show_reading(display: &mut impl DisplayPort, label: &str, hz: f32) {
    use core::fmt::Write;
    let mut line: heapless::String<16> = heapless::String::new();
    let _ = write!(line, "{hz:.1} Hz");
    show(display, &[label, line.as_str(), "", "Step done!"]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
