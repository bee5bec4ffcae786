//! End-to-end duty-cycle tests: service + estimator against mock adapters.

use growmon::app::events::{AppEvent, WallClock};
use growmon::app::ports::CalibrationStore;
use growmon::app::service::{CycleOutcome, MonitorService};
use growmon::calibration::CalibrationData;
use growmon::config::MonitorConfig;
use growmon::error::SensorError;
use growmon::moisture::{IconClass, MoistureEstimator};

use crate::mock_hw::{DisplayCall, EventLog, MemStore, MockDisplay, ScriptedSensor};

fn test_config() -> MonitorConfig {
    MonitorConfig {
        display_hold_secs: 0,
        ..Default::default()
    }
}

fn calibrated_service() -> MonitorService<EventLog> {
    let store = MemStore::with(CalibrationData::new(27.33, 0.33));
    let estimator = MoistureEstimator::new(store.load());
    MonitorService::new(estimator, &test_config(), EventLog::new())
}

#[test]
fn full_cycle_renders_percentage_and_icon() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[18.5]);
    let mut display = MockDisplay::new();

    let outcome = svc.run_cycle(&mut sensor, &mut display, None);
    let CycleOutcome::Rendered(reading) = outcome else {
        panic!("expected Rendered, got {outcome:?}");
    };
    assert!((reading.percent - 32.7).abs() < 0.1);
    assert_eq!(reading.icon, IconClass::Empty);

    // Power up, render, power down — nothing else.
    assert!(matches!(display.calls[0], DisplayCall::PowerOn));
    assert!(matches!(display.calls[1], DisplayCall::Render(_)));
    assert!(matches!(display.calls[2], DisplayCall::PowerOff));
    assert!(!display.powered);
}

#[test]
fn cycle_uses_configured_sample_window() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[18.5]);
    let mut display = MockDisplay::new();

    svc.run_cycle(&mut sensor, &mut display, None);
    assert_eq!(sensor.windows_requested, vec![2.0]);
}

#[test]
fn sensor_fault_powers_display_down_and_skips_render() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::with_results(vec![Err(SensorError::PinReadFailed)]);
    let mut display = MockDisplay::new();

    let outcome = svc.run_cycle(&mut sensor, &mut display, None);
    assert_eq!(
        outcome,
        CycleOutcome::SensorFault(SensorError::PinReadFailed)
    );
    assert!(!display.powered, "display must be off after a faulted cycle");
    assert!(display.rendered().is_empty());
}

#[test]
fn render_failure_still_powers_down() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[18.5]);
    let mut display = MockDisplay {
        fail_render: true,
        ..Default::default()
    };

    let outcome = svc.run_cycle(&mut sensor, &mut display, None);
    assert!(matches!(outcome, CycleOutcome::RenderFailed(..)));
    assert!(!display.powered);
    assert!(svc
        .events()
        .0
        .iter()
        .any(|e| matches!(e, AppEvent::RenderFailed(_))));
}

#[test]
fn uncalibrated_monitor_shows_indicator_and_keeps_cycling() {
    let estimator = MoistureEstimator::new(MemStore::empty().load());
    let mut svc = MonitorService::new(estimator, &test_config(), EventLog::new());
    let mut sensor = ScriptedSensor::new(&[18.5, 19.0, 17.2]);
    let mut display = MockDisplay::new();

    for _ in 0..3 {
        let outcome = svc.run_cycle(&mut sensor, &mut display, None);
        assert_eq!(outcome, CycleOutcome::Uncalibrated);
    }
    assert!(display.rendered().is_empty());
    assert!(display.messages().iter().all(|m| m.contains("CALIBRATED")));
    assert!(!display.powered);
}

#[test]
fn zero_hz_renders_fully_wet_not_fault() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[0.0]);
    let mut display = MockDisplay::new();

    let CycleOutcome::Rendered(reading) = svc.run_cycle(&mut sensor, &mut display, None) else {
        panic!("0 Hz must render");
    };
    assert_eq!(reading.percent, 100.0);
    assert_eq!(reading.icon, IconClass::Full);
}

#[test]
fn zero_hz_before_any_edge_emits_probe_silent() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[0.0]);
    let mut display = MockDisplay::new();

    svc.run_cycle(&mut sensor, &mut display, None);
    assert!(svc
        .events()
        .0
        .iter()
        .any(|e| matches!(e, AppEvent::ProbeSilent)));
}

#[test]
fn zero_hz_after_a_real_edge_is_not_flagged() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[18.5, 0.0]);
    let mut display = MockDisplay::new();

    svc.run_cycle(&mut sensor, &mut display, None);
    svc.run_cycle(&mut sensor, &mut display, None);
    assert!(!svc
        .events()
        .0
        .iter()
        .any(|e| matches!(e, AppEvent::ProbeSilent)));
}

#[test]
fn reading_above_dry_point_clamps_to_zero_percent() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[30.0]);
    let mut display = MockDisplay::new();

    let CycleOutcome::Rendered(reading) = svc.run_cycle(&mut sensor, &mut display, None) else {
        panic!("expected Rendered");
    };
    assert_eq!(reading.percent, 0.0);
    assert_eq!(reading.icon, IconClass::Empty);
}

#[test]
fn timestamp_appears_on_rendered_frame() {
    let now = WallClock {
        year: 2026,
        month: 8,
        day: 26,
        hour: 7,
        minute: 30,
        second: 0,
    };
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::new(&[10.0]);
    let mut display = MockDisplay::new();

    svc.run_cycle(&mut sensor, &mut display, Some(now));
    assert_eq!(display.rendered()[0].timestamp, Some(now));
}

#[test]
fn consecutive_cycles_are_independent() {
    let mut svc = calibrated_service();
    let mut sensor = ScriptedSensor::with_results(vec![
        Ok(18.5),
        Err(SensorError::PinReadFailed),
        Ok(10.0),
    ]);
    let mut display = MockDisplay::new();

    assert!(matches!(
        svc.run_cycle(&mut sensor, &mut display, None),
        CycleOutcome::Rendered(_)
    ));
    assert!(matches!(
        svc.run_cycle(&mut sensor, &mut display, None),
        CycleOutcome::SensorFault(_)
    ));
    // The fault does not poison the next cycle.
    assert!(matches!(
        svc.run_cycle(&mut sensor, &mut display, None),
        CycleOutcome::Rendered(_)
    ));
    assert!(!display.powered);
}

#[test]
fn events_trace_the_whole_session() {
    let mut svc = calibrated_service();
    svc.start();
    let mut sensor = ScriptedSensor::new(&[18.5]);
    let mut display = MockDisplay::new();
    svc.run_cycle(&mut sensor, &mut display, None);

    let events = &svc.events().0;
    assert!(matches!(events[0], AppEvent::Started { calibrated: true }));
    assert!(matches!(events[1], AppEvent::CycleCompleted(_)));
}
