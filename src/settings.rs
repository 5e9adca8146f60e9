//! Device setting reads and writes with device-reported validation.
//!
//! Every operation re-queries the live configuration tree through the
//! session's transaction accessors; nothing here caches device state.

use crate::config::AppConfig;
use crate::errors::CameraError;
use crate::session::CameraSession;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SettingsService {
    session: Arc<Mutex<CameraSession>>,
}

impl SettingsService {
    pub fn new(session: Arc<Mutex<CameraSession>>) -> Self {
        Self { session }
    }

    /// Push the config file's extra camera-section scalars to the device.
    ///
    /// Best effort: does nothing unless a camera is already connected, and
    /// logs per-setting failures without escalating them.
    pub async fn apply_startup_settings(&self, config: &AppConfig) {
        let startup = &config.camera.startup_settings;
        if startup.is_empty() {
            return;
        }
        if !self.session.lock().await.is_connected() {
            log::debug!("no camera connected, skipping startup settings");
            return;
        }

        for (name, result) in self.set_multiple(startup).await {
            if let Err(e) = result {
                log::warn!("startup setting '{name}' not applied: {e}");
            }
        }
    }

    /// Current device-reported value of a setting.
    pub async fn get_value(&self, name: &str) -> Result<String, CameraError> {
        let mut session = self.session.lock().await;
        let tree = session.read_config_tree()?;
        let node = tree
            .child(name)
            .ok_or_else(|| CameraError::setting_not_found(name))?;
        log::debug!("current value of {name} is {}", node.value);
        Ok(node.value.clone())
    }

    /// Read several settings independently; partial failure is per-key.
    pub async fn get_multiple(
        &self,
        names: &[&str],
    ) -> BTreeMap<String, Result<String, CameraError>> {
        let mut results = BTreeMap::new();
        for name in names {
            results.insert((*name).to_string(), self.get_value(name).await);
        }
        results
    }

    /// Set one setting, validating enumerated values against the
    /// device-reported choice list.
    ///
    /// An invalid value for a radio/menu setting is coerced to the first
    /// valid choice and logged, never rejected.
    pub async fn set_value(&self, name: &str, value: &str) -> Result<(), CameraError> {
        let mut session = self.session.lock().await;
        let applied = session.update_config_tree(|tree| {
            let node = tree
                .child_mut(name)
                .ok_or_else(|| CameraError::setting_not_found(name))?;

            let mut applied = value.to_string();
            if node.kind.is_enumerated()
                && !node.choices.is_empty()
                && !node.choices.iter().any(|choice| choice == value)
            {
                log::warn!(
                    "invalid value '{value}' for {name}; valid choices are {:?}, defaulting to {}",
                    node.choices,
                    node.choices[0]
                );
                applied = node.choices[0].clone();
            }

            node.value = applied.clone();
            Ok(applied)
        })?;

        log::info!("set {name} to {applied}");
        Ok(())
    }

    /// Apply several settings independently, with no transactional
    /// guarantee. Structured (nested) values are silently skipped and do not
    /// appear in the result map; each scalar entry reports its own outcome.
    pub async fn set_multiple(
        &self,
        settings: &BTreeMap<String, Value>,
    ) -> BTreeMap<String, Result<(), CameraError>> {
        if settings.is_empty() {
            log::warn!("no settings provided to set");
            return BTreeMap::new();
        }

        let mut results = BTreeMap::new();
        for (name, value) in settings {
            let Some(scalar) = scalar_value(value) else {
                continue;
            };
            results.insert(name.clone(), self.set_value(name, &scalar).await);
        }
        results
    }
}

/// Scalar rendering of a JSON value; `None` for nested or null values.
fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
