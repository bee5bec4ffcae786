//! Guided calibration flow against mock adapters, plus the
//! store → estimator handoff across a simulated restart.

use growmon::app::ports::CalibrationStore;
use growmon::calibration::procedure::{CalibrationProcedure, ProcedureState};
use growmon::calibration::CalibrationData;
use growmon::config::MonitorConfig;
use growmon::error::CalibrationError;
use growmon::moisture::MoistureEstimator;

use crate::mock_hw::{MemStore, MockDisplay, ScriptedSensor};

fn quick_config() -> MonitorConfig {
    MonitorConfig {
        cal_prep_secs: 1,
        cal_sample_count: 3,
        ..Default::default()
    }
}

fn run_to_settled(
    procedure: &mut CalibrationProcedure,
    sensor: &mut ScriptedSensor,
    display: &mut MockDisplay,
    store: &mut MemStore,
) -> ProcedureState {
    for _ in 0..30 {
        let state = procedure.tick(sensor, display, store);
        if matches!(state, ProcedureState::Saved | ProcedureState::Rejected(_)) {
            return state;
        }
    }
    procedure.state()
}

#[test]
fn full_procedure_persists_and_feeds_the_estimator() {
    let mut procedure = CalibrationProcedure::new(&quick_config());
    let mut sensor = ScriptedSensor::new(&[27.0, 27.5, 27.5, 0.3, 0.3, 0.3]);
    let mut display = MockDisplay::new();
    let mut store = MemStore::empty();

    procedure.start(&mut display);
    let end = run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);
    assert_eq!(end, ProcedureState::Saved);

    // Simulated restart: a fresh estimator snapshots the stored record.
    let estimator = MoistureEstimator::new(store.load());
    assert!(estimator.is_calibrated());
    let percent = estimator.estimate(14.0).unwrap();
    assert!(percent > 0.0 && percent < 100.0);
}

#[test]
fn calibration_samples_use_the_calibration_window() {
    let cfg = quick_config();
    let mut procedure = CalibrationProcedure::new(&cfg);
    let mut sensor = ScriptedSensor::new(&[27.0, 27.0, 27.0, 0.3, 0.3, 0.3]);
    let mut display = MockDisplay::new();
    let mut store = MemStore::empty();

    procedure.start(&mut display);
    run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);

    assert_eq!(sensor.windows_requested.len(), 6);
    assert!(sensor
        .windows_requested
        .iter()
        .all(|&w| (w - cfg.cal_sample_window_secs).abs() < 1e-6));
}

#[test]
fn swapped_steps_rejected_and_nothing_persisted() {
    let mut procedure = CalibrationProcedure::new(&quick_config());
    let mut sensor = ScriptedSensor::new(&[0.5, 0.5, 0.5, 25.0, 25.0, 25.0]);
    let mut display = MockDisplay::new();
    let mut store = MemStore::empty();

    procedure.start(&mut display);
    let end = run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);
    assert_eq!(end, ProcedureState::Rejected(CalibrationError::Swapped));
    assert!(store.saved.is_none());
    assert!(!MoistureEstimator::new(store.load()).is_calibrated());
}

#[test]
fn rejection_keeps_previous_calibration_intact() {
    let previous = CalibrationData::new(27.33, 0.33);
    let mut procedure = CalibrationProcedure::new(&quick_config());
    // Wet step implausibly high: sensor left in air both times.
    let mut sensor = ScriptedSensor::new(&[26.0, 26.0, 26.0, 22.0, 22.0, 22.0]);
    let mut display = MockDisplay::new();
    let mut store = MemStore::with(previous);

    procedure.start(&mut display);
    let end = run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);
    assert_eq!(end, ProcedureState::Rejected(CalibrationError::WetTooHigh));
    assert_eq!(store.saved, Some(previous));
}

#[test]
fn retry_after_rejection_can_succeed() {
    let mut procedure = CalibrationProcedure::new(&quick_config());
    let mut display = MockDisplay::new();
    let mut store = MemStore::empty();

    // First attempt: swapped.
    let mut sensor = ScriptedSensor::new(&[0.5, 0.5, 0.5, 25.0, 25.0, 25.0]);
    procedure.start(&mut display);
    run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);

    // Leave the reporting state, then run the steps correctly.
    procedure.tick(&mut sensor, &mut display, &mut store);
    assert_eq!(procedure.state(), ProcedureState::Idle);

    let mut sensor = ScriptedSensor::new(&[27.0, 27.0, 27.0, 0.3, 0.3, 0.3]);
    procedure.start(&mut display);
    let end = run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);
    assert_eq!(end, ProcedureState::Saved);
    assert!(store.saved.is_some());
}

#[test]
fn operator_prompts_cover_both_steps() {
    let mut procedure = CalibrationProcedure::new(&quick_config());
    let mut sensor = ScriptedSensor::new(&[27.0, 27.0, 27.0, 0.3, 0.3, 0.3]);
    let mut display = MockDisplay::new();
    let mut store = MemStore::empty();

    procedure.start(&mut display);
    run_to_settled(&mut procedure, &mut sensor, &mut display, &mut store);

    let messages = display.messages().join("\n");
    assert!(messages.contains("STEP 1"));
    assert!(messages.contains("AIR"));
    assert!(messages.contains("STEP 2"));
    assert!(messages.contains("WATER"));
    assert!(messages.contains("COMPLETE"));
}
