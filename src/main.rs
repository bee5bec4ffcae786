//! Grow Monitor — Main Entry Point
//!
//! Hexagonal architecture around a strictly sequential duty cycle:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  PfmSensor        LogDisplay      CalStore    SntpSync   │
//! │  (FrequencySensor)(DisplayPort)   (CalStore)  (TimeSync) │
//! │                                                          │
//! │  ───────────── Port Trait Boundary ─────────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │       MonitorService (pure logic)              │      │
//! │  │  MoistureEstimator · CalibrationProcedure      │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  PowerManager (light-sleep remainder of each cycle)      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Two modes share the binary: the default monitoring loop, and a guided
//! calibration run selected with the `calibrate` argument (the operator
//! has a serial console attached in that case anyway).
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use growmon::adapters::display::LogDisplay;
use growmon::adapters::events::LogEventSink;
use growmon::adapters::store::CalStore;
use growmon::adapters::time::{Clock, SntpSync};
use growmon::adapters::wifi;
use growmon::app::events::AppEvent;
use growmon::app::ports::{CalibrationStore, DisplayPort, EventSink, TimeSyncPort};
use growmon::app::service::MonitorService;
use growmon::calibration::procedure::{CalibrationProcedure, ProcedureState};
use growmon::config::{validate_config, MonitorConfig};
use growmon::error::CommsError;
use growmon::moisture::MoistureEstimator;
use growmon::power::PowerManager;
use growmon::sensors::pfm::PfmSensor;

/// PFM signal wire input.
const SENSOR_GPIO: i32 = 26;

#[cfg(target_os = "espidf")]
const CONFIG_PATH: &str = "/spiffs/growmon_config.json";
#[cfg(not(target_os = "espidf"))]
const CONFIG_PATH: &str = "growmon_config.json";

#[cfg(not(target_os = "espidf"))]
const CALIBRATION_PATH: &str = "moisture_config.json";

#[cfg(target_os = "espidf")]
const WIFI_PATH: &str = "/spiffs/wifi_config.json";
#[cfg(not(target_os = "espidf"))]
const WIFI_PATH: &str = "wifi_config.json";

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Grow Monitor v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    validate_config(&config).map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // ── 3. Hardware init + adapters ───────────────────────────
    // The probe is useless without its edge interrupt; treat failure the
    // same as any other peripheral-init fault and halt at boot.
    growmon::adapters::hardware::init_sensor_isr(SENSOR_GPIO)
        .map_err(|e| anyhow::anyhow!("sensor ISR init failed: {e}"))?;
    let mut sensor = PfmSensor::new(SENSOR_GPIO);
    let mut display = LogDisplay::new();
    let mut store = calibration_store(&config);
    let mut events = LogEventSink::new();
    let clock = Clock::new(config.timezone_offset_hours);

    // ── 4. Mode dispatch ──────────────────────────────────────
    if std::env::args().nth(1).as_deref() == Some("calibrate") {
        return run_calibration(&config, &mut sensor, &mut display, &mut store);
    }

    // ── 5. Boot splash + one-shot clock sync (never fatal) ────
    if let Err(e) = display.power_on() {
        warn!("display power-on failed: {e}");
    }
    if let Err(e) = display.show_message(&[
        "Grow Monitor",
        concat!("v", env!("CARGO_PKG_VERSION")),
        "",
        "Starting...",
    ]) {
        warn!("boot splash failed: {e}");
    }
    sync_clock_once(&config, &clock, &mut display, &mut events);

    // ── 6. Load calibration, build the estimator snapshot ─────
    let estimator = MoistureEstimator::new(store.load());
    let mut service = MonitorService::new(estimator, &config, events);
    service.start();

    // ── 7. Duty-cycle loop ────────────────────────────────────
    let power = PowerManager::new(config.cycle_period_secs);
    loop {
        let cycle_start = clock.uptime();
        let _outcome = service.run_cycle(&mut sensor, &mut display, clock.wall_clock());
        let active = clock.uptime().saturating_sub(cycle_start);
        power.sleep_remainder(active);
    }
}

fn load_config() -> MonitorConfig {
    match std::fs::read(CONFIG_PATH) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(cfg) => {
                info!("configuration loaded from {CONFIG_PATH}");
                cfg
            }
            Err(e) => {
                warn!("configuration unparsable ({e}), using defaults");
                MonitorConfig::default()
            }
        },
        Err(_) => {
            info!("no configuration file, using defaults");
            MonitorConfig::default()
        }
    }
}

#[cfg(target_os = "espidf")]
fn calibration_store(config: &MonitorConfig) -> CalStore {
    CalStore::new(config.min_dry_freq_hz, config.max_wet_freq_hz)
}

#[cfg(not(target_os = "espidf"))]
fn calibration_store(config: &MonitorConfig) -> CalStore {
    CalStore::new(
        CALIBRATION_PATH,
        config.min_dry_freq_hz,
        config.max_wet_freq_hz,
    )
}

/// Connect, SNTP-sync, disconnect. Runs once per boot; every failure is
/// logged and swallowed — a monitor with no network still monitors, its
/// frames just carry no timestamp.
fn sync_clock_once(
    config: &MonitorConfig,
    clock: &Clock,
    display: &mut impl DisplayPort,
    events: &mut impl EventSink,
) {
    let creds = match wifi_credentials() {
        Ok(c) => c,
        Err(CommsError::NoCredentials) => {
            info!("no WiFi credentials, skipping clock sync");
            events.emit(&AppEvent::TimeSyncFailed(CommsError::NoCredentials));
            return;
        }
        Err(e) => {
            warn!("WiFi credentials unusable: {e}");
            events.emit(&AppEvent::TimeSyncFailed(e));
            return;
        }
    };

    if let Err(e) = display.show_message(&["Connecting", "WiFi...", "", ""]) {
        warn!("sync progress message failed: {e}");
    }
    let mut link = match wifi::WifiLink::new(creds) {
        Ok(l) => l,
        Err(e) => {
            events.emit(&AppEvent::TimeSyncFailed(e));
            return;
        }
    };
    if let Err(e) = link.connect(config.wifi_timeout_secs) {
        events.emit(&AppEvent::TimeSyncFailed(e));
        return;
    }

    if let Err(e) = display.show_message(&["Syncing", "time...", "", ""]) {
        warn!("sync progress message failed: {e}");
    }
    let result = SntpSync::new().sync(config.sntp_timeout_secs);
    link.disconnect();

    match result {
        Ok(()) => match clock.wall_clock() {
            Some(now) => events.emit(&AppEvent::TimeSynced(now)),
            None => {
                warn!("SNTP reported success but the clock is still unset");
                events.emit(&AppEvent::TimeSyncFailed(CommsError::SyncFailed));
            }
        },
        Err(e) => events.emit(&AppEvent::TimeSyncFailed(e)),
    }
}

fn wifi_credentials() -> core::result::Result<wifi::WifiCredentials, CommsError> {
    #[cfg(target_os = "espidf")]
    {
        match std::fs::read(WIFI_PATH) {
            Ok(bytes) => wifi::WifiCredentials::from_json(&bytes),
            Err(_) => Err(CommsError::NoCredentials),
        }
    }
    #[cfg(not(target_os = "espidf"))]
    wifi::load_credentials(std::path::Path::new(WIFI_PATH))
}

/// Drive the guided calibration to completion, pacing one tick per second.
fn run_calibration(
    config: &MonitorConfig,
    sensor: &mut PfmSensor,
    display: &mut LogDisplay,
    store: &mut CalStore,
) -> Result<()> {
    info!("=== Moisture Sensor Calibration ===");
    if let Err(e) = display.power_on() {
        warn!("display power-on failed: {e}");
    }

    let mut procedure = CalibrationProcedure::new(config);
    procedure.start(display);

    let outcome = loop {
        let state = procedure.tick(sensor, display, store);
        match state {
            ProcedureState::Saved => break Ok(()),
            ProcedureState::Rejected(reason) => {
                // Report and stop; the operator re-runs the command.
                break Err(anyhow::anyhow!("calibration rejected: {reason}"));
            }
            ProcedureState::Idle => {
                break Err(anyhow::anyhow!("calibration aborted"));
            }
            _ => pace_one_second(),
        }
    };

    if let Err(e) = display.power_off() {
        warn!("display power-off failed: {e}");
    }
    match &outcome {
        Ok(()) => info!("calibration complete — restart the monitor to use it"),
        Err(e) => warn!("{e}"),
    }
    outcome
}

fn pace_one_second() {
    #[cfg(target_os = "espidf")]
    esp_idf_hal::delay::FreeRtos::delay_ms(1000);
    #[cfg(not(target_os = "espidf"))]
    std::thread::sleep(std::time::Duration::from_secs(1));
}
