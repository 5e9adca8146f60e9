//! Service configuration loaded from a YAML file.
//!
//! A missing or invalid file is never fatal: the documented defaults apply
//! and a warning is logged. Loaded once at construction; the camera section
//! may carry extra scalar entries that are pushed to the device at startup.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraSection,
    pub capture: CaptureSection,
    pub log_settings: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    /// Preferred camera name for connection selection.
    pub name: String,
    /// Readiness-poll timeout in seconds.
    pub connection_timeout: u64,
    /// Extra scalar device settings applied at startup (best effort).
    #[serde(flatten)]
    pub startup_settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    pub save_directory: String,
    pub preview_directory: String,
    pub retry_attempts: u32,
    /// Delay between capture attempts, in seconds.
    pub retry_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub console_level: String,
    pub file_level: String,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            name: "Default Camera".to_string(),
            connection_timeout: 10,
            startup_settings: BTreeMap::new(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            save_directory: "./images".to_string(),
            preview_directory: "./previews".to_string(),
            retry_attempts: 3,
            retry_delay: 1.0,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            console_level: "ERROR".to_string(),
            file_level: "DEBUG".to_string(),
        }
    }
}

impl CameraSection {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

impl CaptureSection {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay)
    }
}

impl AppConfig {
    /// Default config file location, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("tethercam.yaml")
    }

    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults. A file that parses but fails
    /// validation also yields the defaults, with a warning.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::config_load(format!("failed to read config file: {e}")))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .map_err(|e| CameraError::config_load(format!("failed to parse config file: {e}")))?;

        if let Err(reason) = config.validate() {
            log::warn!("config file {:?} is invalid ({reason}), using defaults", path);
            return Ok(Self::default());
        }

        log::info!("loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from the given location, downgrading any failure to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|e| {
            log::warn!("failed to load config, using defaults: {e}");
            Self::default()
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.connection_timeout == 0 {
            return Err("connection_timeout must be at least 1 second".to_string());
        }
        if self.capture.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        if !self.capture.retry_delay.is_finite() || self.capture.retry_delay < 0.0 {
            return Err("retry_delay must be a non-negative number of seconds".to_string());
        }
        if self.capture.save_directory.is_empty() || self.capture.preview_directory.is_empty() {
            return Err("capture directories must not be empty".to_string());
        }
        Ok(())
    }
}
