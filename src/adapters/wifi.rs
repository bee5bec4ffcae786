//! WiFi station-mode adapter.
//!
//! The radio exists for exactly one job: carry the boot-time SNTP
//! exchange. Connect, sync, disconnect, and the radio stays dark for the
//! rest of the uptime — it is the single largest power draw on the board.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF STA calls via
//!   `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub for host-side tests.
//!
//! Credentials come from a small JSON document (`ssid` / `password`),
//! validated before the radio is touched.

use log::{error, info};
use serde::Deserialize;

use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// WiFi credentials, bounded to 802.11 field sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    #[serde(default)]
    pub password: heapless::String<64>,
}

impl WifiCredentials {
    /// Parse from the credentials JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CommsError> {
        let creds: Self =
            serde_json::from_slice(bytes).map_err(|_| CommsError::InvalidCredentials)?;
        creds.validate()?;
        Ok(creds)
    }

    /// SSID must be 1–32 printable ASCII bytes; password 8–64 bytes for
    /// WPA2, or empty for an open network.
    pub fn validate(&self) -> Result<(), CommsError> {
        if self.ssid.is_empty() || !is_printable_ascii(&self.ssid) {
            return Err(CommsError::InvalidCredentials);
        }
        if !self.password.is_empty() && self.password.len() < 8 {
            return Err(CommsError::InvalidCredentials);
        }
        Ok(())
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Load credentials from the platform's config location.
///
/// Missing file is the expected no-network deployment and maps to
/// [`CommsError::NoCredentials`]; the caller skips sync and carries on.
#[cfg(not(target_os = "espidf"))]
pub fn load_credentials(path: &std::path::Path) -> Result<WifiCredentials, CommsError> {
    match std::fs::read(path) {
        Ok(bytes) => WifiCredentials::from_json(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CommsError::NoCredentials),
        Err(e) => {
            log::warn!("credentials file read failed: {e}");
            Err(CommsError::NoCredentials)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Station link
// ───────────────────────────────────────────────────────────────

/// A short-lived station association.
pub struct WifiLink {
    creds: WifiCredentials,
    connected: bool,
    #[cfg(target_os = "espidf")]
    driver: Option<esp_idf_svc::wifi::EspWifi<'static>>,
}

impl WifiLink {
    pub fn new(creds: WifiCredentials) -> Result<Self, CommsError> {
        creds.validate()?;
        Ok(Self {
            creds,
            connected: false,
            #[cfg(target_os = "espidf")]
            driver: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Associate with the AP, bounded by `timeout_secs`.
    pub fn connect(&mut self, timeout_secs: u16) -> Result<(), CommsError> {
        if self.connected {
            return Ok(());
        }
        info!(
            "WiFi: connecting to '{}' (timeout {timeout_secs}s)",
            self.creds.ssid
        );
        match self.platform_connect(timeout_secs) {
            Ok(()) => {
                self.connected = true;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connect failed: {e}");
                Err(e)
            }
        }
    }

    /// Drop the association and power the radio down.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.platform_disconnect();
        self.connected = false;
        info!("WiFi: disconnected, radio off");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_secs: u16) -> Result<(), CommsError> {
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

        // Full driver bring-up: this is the only consumer of the modem
        // peripheral, taken here and stopped again after the sync.
        let peripherals = Peripherals::take().map_err(|_| CommsError::WifiConnectFailed)?;
        let sysloop = EspSystemEventLoop::take().map_err(|_| CommsError::WifiConnectFailed)?;
        let nvs = EspDefaultNvsPartition::take().ok();

        let mut wifi = EspWifi::new(peripherals.modem, sysloop, nvs)
            .map_err(|_| CommsError::WifiConnectFailed)?;

        let auth_method = if self.creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: self
                .creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| CommsError::InvalidCredentials)?,
            password: self
                .creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| CommsError::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|_| CommsError::WifiConnectFailed)?;

        wifi.start().map_err(|_| CommsError::WifiConnectFailed)?;
        wifi.connect().map_err(|_| CommsError::WifiConnectFailed)?;

        let deadline_ms = u32::from(timeout_secs) * 1000;
        let mut waited_ms = 0u32;
        while waited_ms < deadline_ms {
            if wifi.is_up().unwrap_or(false) {
                self.driver = Some(wifi);
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(250);
            waited_ms += 250;
        }

        let _ = wifi.stop();
        Err(CommsError::WifiConnectFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _timeout_secs: u16) -> Result<(), CommsError> {
        info!("WiFi(sim): connected to '{}'", self.creds.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(mut wifi) = self.driver.take() {
            let _ = wifi.disconnect();
            let _ = wifi.stop();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }
}

impl Drop for WifiLink {
    fn drop(&mut self) {
        // The link must never outlive its one job.
        self.disconnect();
    }
}
