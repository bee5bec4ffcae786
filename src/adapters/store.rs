//! Persistent calibration store.
//!
//! Implements [`CalibrationStore`] over the platform's storage:
//!
//! - **`target_os = "espidf"`** — a JSON blob in its own NVS namespace.
//!   `nvs_set_blob` + `nvs_commit` gives the atomic replace the port
//!   contract requires.
//! - **all other targets** — a JSON file, replaced via write-to-temp then
//!   rename so a crash mid-write leaves either the old record or the new
//!   one, never a torn file.
//!
//! The record is JSON with semantic field names (`dry_freq`, `wet_freq`)
//! so a technician can inspect or hand-edit it; hand-edited garbage is
//! caught by the same validation as a fresh save and degrades to the
//! uncalibrated state.
//!
//! Every load re-validates. A record that was valid when saved but fails
//! the current policy (tightened plausibility band after a firmware
//! update) is treated as absent, not trusted.

use log::{info, warn};

use crate::app::ports::CalibrationStore;
use crate::calibration::CalibrationData;
use crate::error::StoreError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &[u8] = b"growmon\0";
#[cfg(target_os = "espidf")]
const NVS_KEY: &[u8] = b"moistcal\0";
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 256;

/// Calibration persistence with validate-before-write and soft-fail reads.
pub struct CalStore {
    /// Plausibility band applied on both save and load.
    min_dry_hz: f32,
    max_wet_hz: f32,
    #[cfg(not(target_os = "espidf"))]
    path: std::path::PathBuf,
}

impl CalStore {
    #[cfg(not(target_os = "espidf"))]
    pub fn new(path: impl Into<std::path::PathBuf>, min_dry_hz: f32, max_wet_hz: f32) -> Self {
        Self {
            min_dry_hz,
            max_wet_hz,
            path: path.into(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn new(min_dry_hz: f32, max_wet_hz: f32) -> Self {
        Self {
            min_dry_hz,
            max_wet_hz,
        }
    }

    /// Parse + validate a raw record. Shared by both backends.
    fn decode(&self, bytes: &[u8]) -> Result<CalibrationData, StoreError> {
        let data: CalibrationData =
            serde_json::from_slice(bytes).map_err(|_| StoreError::Corrupted)?;
        data.validate(self.min_dry_hz, self.max_wet_hz)
            .map_err(|e| {
                warn!("stored calibration fails validation: {e}");
                StoreError::Corrupted
            })?;
        Ok(data)
    }

    fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            match std::fs::read(&self.path) {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
                Err(e) => {
                    warn!("calibration file read failed: {e}");
                    Err(StoreError::Io)
                }
            }
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;
                // First call sizes the blob.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        NVS_KEY.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(StoreError::NotFound);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(StoreError::Io);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        NVS_KEY.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(StoreError::Io);
                }
                Ok(buf)
            })
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            use std::io::Write;

            let tmp = self.path.with_extension("tmp");
            let mut file = std::fs::File::create(&tmp).map_err(|e| {
                warn!("calibration temp file create failed: {e}");
                StoreError::Io
            })?;
            file.write_all(bytes).map_err(|_| StoreError::Io)?;
            file.sync_all().map_err(|_| StoreError::Io)?;
            drop(file);
            std::fs::rename(&tmp, &self.path).map_err(|e| {
                warn!("calibration file rename failed: {e}");
                StoreError::Io
            })
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        NVS_KEY.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(StoreError::Io);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(StoreError::Io);
                }
                Ok(())
            })
        }
    }

    /// Open the namespace, run `f`, close the handle.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, StoreError>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        if ret != ESP_OK {
            return Err(StoreError::Io);
        }
        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl CalibrationStore for CalStore {
    fn load(&self) -> Option<CalibrationData> {
        match self.read_raw().and_then(|bytes| self.decode(&bytes)) {
            Ok(data) => {
                info!(
                    "calibration loaded: dry={:.2} Hz, wet={:.2} Hz",
                    data.dry_freq, data.wet_freq
                );
                Some(data)
            }
            Err(StoreError::NotFound) => {
                info!("no stored calibration (first boot)");
                None
            }
            Err(e) => {
                warn!("calibration load failed ({e}), running uncalibrated");
                None
            }
        }
    }

    fn save(&mut self, data: &CalibrationData) -> Result<(), StoreError> {
        data.validate(self.min_dry_hz, self.max_wet_hz)
            .map_err(StoreError::Rejected)?;

        let bytes = serde_json::to_vec(data).map_err(|_| StoreError::Io)?;
        self.write_raw(&bytes)?;
        info!(
            "calibration saved: dry={:.2} Hz, wet={:.2} Hz",
            data.dry_freq, data.wet_freq
        );
        Ok(())
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::error::CalibrationError;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("growmon_store_{name}_{}.json", std::process::id()));
        p
    }

    fn store(name: &str) -> CalStore {
        let path = temp_path(name);
        let _ = std::fs::remove_file(&path);
        CalStore::new(path, 15.0, 10.0)
    }

    #[test]
    fn missing_file_loads_none() {
        let s = store("missing");
        assert!(s.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut s = store("roundtrip");
        let data = CalibrationData::new(27.33, 0.33);
        s.save(&data).unwrap();

        let loaded = s.load().expect("saved record loads");
        assert_eq!(loaded, data);
        let _ = std::fs::remove_file(&s.path);
    }

    #[test]
    fn record_is_human_readable_json() {
        let mut s = store("json");
        s.save(&CalibrationData::new(27.0, 0.5)).unwrap();

        let text = std::fs::read_to_string(&s.path).unwrap();
        assert!(text.contains("dry_freq"));
        assert!(text.contains("wet_freq"));
        let _ = std::fs::remove_file(&s.path);
    }

    #[test]
    fn invalid_data_rejected_without_touching_storage() {
        let mut s = store("reject");
        s.save(&CalibrationData::new(27.0, 0.5)).unwrap();

        let err = s.save(&CalibrationData::new(3.0, 20.0)).unwrap_err();
        assert_eq!(err, StoreError::Rejected(CalibrationError::Swapped));

        // Previous record survives the rejection.
        let loaded = s.load().expect("old record intact");
        assert_eq!(loaded, CalibrationData::new(27.0, 0.5));
        let _ = std::fs::remove_file(&s.path);
    }

    #[test]
    fn corrupted_file_loads_none() {
        let s = store("corrupt");
        std::fs::write(&s.path, b"{ not json").unwrap();
        assert!(s.load().is_none());
        let _ = std::fs::remove_file(&s.path);
    }

    #[test]
    fn hand_edited_implausible_record_loads_none() {
        let s = store("implausible");
        // Parses fine but fails the plausibility band.
        std::fs::write(&s.path, br#"{"dry_freq": 5.0, "wet_freq": 1.0}"#).unwrap();
        assert!(s.load().is_none());
        let _ = std::fs::remove_file(&s.path);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let mut s = store("tmpclean");
        s.save(&CalibrationData::new(27.0, 0.5)).unwrap();
        assert!(!s.path.with_extension("tmp").exists());
        let _ = std::fs::remove_file(&s.path);
    }
}
