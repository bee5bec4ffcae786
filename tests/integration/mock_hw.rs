//! Mock hardware adapters for integration tests.
//!
//! Records every port call so tests can assert on the full interaction
//! history without touching real GPIO or flash.

use std::collections::VecDeque;

use growmon::app::events::{AppEvent, ReadingData};
use growmon::app::ports::{CalibrationStore, DisplayPort, EventSink, FrequencySensor};
use growmon::calibration::CalibrationData;
use growmon::error::{DisplayError, SensorError, StoreError};

// ── Scripted frequency sensor ─────────────────────────────────

/// Replays a queue of measurement results, then fails.
pub struct ScriptedSensor {
    readings: VecDeque<Result<f32, SensorError>>,
    pub windows_requested: Vec<f32>,
}

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new(readings: &[f32]) -> Self {
        Self {
            readings: readings.iter().map(|&hz| Ok(hz)).collect(),
            windows_requested: Vec::new(),
        }
    }

    pub fn with_results(results: Vec<Result<f32, SensorError>>) -> Self {
        Self {
            readings: results.into(),
            windows_requested: Vec::new(),
        }
    }
}

impl FrequencySensor for ScriptedSensor {
    fn measure(&mut self, window_secs: f32) -> Result<f32, SensorError> {
        self.windows_requested.push(window_secs);
        self.readings
            .pop_front()
            .unwrap_or(Err(SensorError::PinReadFailed))
    }
}

// ── Display call recording ────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    PowerOn,
    PowerOff,
    Render(ReadingData),
    Message(String),
}

/// Display double: records the call sequence, tracks power state, and can
/// be told to fail any entry point.
#[derive(Default)]
pub struct MockDisplay {
    pub calls: Vec<DisplayCall>,
    pub powered: bool,
    pub fail_render: bool,
    pub fail_power_on: bool,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Vec<&ReadingData> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DisplayPort for MockDisplay {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::PowerOn);
        if self.fail_power_on {
            return Err(DisplayError::PowerFailed);
        }
        self.powered = true;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::PowerOff);
        self.powered = false;
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.powered
    }

    fn render(&mut self, reading: &ReadingData) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::Render(*reading));
        if self.fail_render {
            return Err(DisplayError::BusError);
        }
        Ok(())
    }

    fn show_message(&mut self, lines: &[&str]) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::Message(lines.join("|")));
        Ok(())
    }
}

// ── In-memory calibration store ───────────────────────────────

/// Store double with the same validation policy as the real adapter.
pub struct MemStore {
    pub saved: Option<CalibrationData>,
    pub min_dry_hz: f32,
    pub max_wet_hz: f32,
    pub fail_writes: bool,
    pub save_attempts: u32,
}

#[allow(dead_code)]
impl MemStore {
    pub fn empty() -> Self {
        Self {
            saved: None,
            min_dry_hz: 15.0,
            max_wet_hz: 10.0,
            fail_writes: false,
            save_attempts: 0,
        }
    }

    pub fn with(data: CalibrationData) -> Self {
        Self {
            saved: Some(data),
            ..Self::empty()
        }
    }
}

impl CalibrationStore for MemStore {
    fn load(&self) -> Option<CalibrationData> {
        self.saved
    }

    fn save(&mut self, data: &CalibrationData) -> Result<(), StoreError> {
        self.save_attempts += 1;
        data.validate(self.min_dry_hz, self.max_wet_hz)
            .map_err(StoreError::Rejected)?;
        if self.fail_writes {
            return Err(StoreError::Io);
        }
        self.saved = Some(*data);
        Ok(())
    }
}

// ── Event recording ───────────────────────────────────────────

#[derive(Default)]
pub struct EventLog(pub Vec<AppEvent>);

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(*event);
    }
}
