//! Camera session lifecycle.
//!
//! [`CameraSession`] exclusively owns the one live device handle per
//! process: detection, connection, disconnection, reset, summary retrieval,
//! and remote-release signalling all go through it. Other components borrow
//! the handle per-call via the config-tree and capture accessors and never
//! hold it themselves.
//!
//! The session is not internally locked; a multi-threaded host must
//! serialize access (the HTTP layer wraps it in a mutex), because the
//! underlying device protocol cannot tolerate interleaved operations.

use crate::backend::{self, CameraBackend, CameraHandle};
use crate::config::AppConfig;
use crate::errors::{CameraError, ErrorKind};
use crate::types::{CameraDescriptor, ConfigTree, DeviceFile};
use std::path::Path;

/// Default remote-control action looked up on the device configuration tree.
pub const REMOTE_RELEASE_ACTION: &str = "remote-release";

/// An open device handle paired with the descriptor it was opened for.
///
/// Living in one `Option` makes the handle-iff-descriptor invariant
/// structural: partial connection state cannot be represented.
struct ActiveConnection {
    handle: Box<dyn CameraHandle>,
    descriptor: CameraDescriptor,
}

pub struct CameraSession {
    backend: Box<dyn CameraBackend>,
    config: AppConfig,
    active: Option<ActiveConnection>,
}

impl CameraSession {
    /// Session over the process-default backend.
    pub fn new(config: AppConfig) -> Self {
        Self::with_backend(backend::default_backend(), config)
    }

    pub fn with_backend(backend: Box<dyn CameraBackend>, config: AppConfig) -> Self {
        Self {
            backend,
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Descriptor of the connected camera, if any.
    pub fn connected_camera(&self) -> Option<&CameraDescriptor> {
        self.active.as_ref().map(|conn| &conn.descriptor)
    }

    /// Enumerate attached cameras.
    ///
    /// A communication failure is soft: it is logged and reported as an
    /// empty set, never as an error.
    pub fn detect(&mut self) -> Vec<CameraDescriptor> {
        match self.backend.detect() {
            Ok(cameras) => {
                log::info!("detected {} camera(s)", cameras.len());
                if !cameras.is_empty() {
                    let names: Vec<&str> = cameras.iter().map(|c| c.name.as_str()).collect();
                    log::debug!("camera names: {}", names.join(", "));
                }
                cameras
            }
            Err(e) => {
                log::error!("camera detection failed: {}", CameraError::device_io(&e));
                Vec::new()
            }
        }
    }

    /// Detect and connect to a camera.
    ///
    /// Selection order: the `preferred_name` argument if it matches a
    /// detected camera, else the configured camera name if it matches, else
    /// the first detected camera, logging the fallback whenever a requested
    /// name has no match. On failure the session is left fully disconnected.
    pub fn connect(&mut self, preferred_name: Option<&str>) -> Result<CameraDescriptor, CameraError> {
        if self.active.is_some() {
            log::debug!("connect requested while connected, disconnecting first");
            let _ = self.disconnect();
        }

        let available = self.detect();
        if available.is_empty() {
            let error = CameraError::no_camera_found();
            log::error!("{error}");
            return Err(error);
        }

        let selected = self.select_camera(&available, preferred_name);
        log::debug!(
            "connecting to camera: {} at port: {}",
            selected.name,
            selected.port
        );

        let handle = self.backend.open(&selected).map_err(|e| {
            let error = CameraError::connection_failed(&selected.name, &e);
            log::error!("{error}");
            error
        })?;

        self.active = Some(ActiveConnection {
            handle,
            descriptor: selected.clone(),
        });
        log::info!(
            "connected to camera: {} at port: {}",
            selected.name,
            selected.port
        );
        Ok(selected)
    }

    fn select_camera(
        &self,
        available: &[CameraDescriptor],
        preferred_name: Option<&str>,
    ) -> CameraDescriptor {
        if let Some(wanted) = preferred_name {
            if let Some(found) = available.iter().find(|c| c.name == wanted) {
                return found.clone();
            }
            log::warn!("no camera named '{wanted}', falling back to first detected");
            return available[0].clone();
        }

        let configured = &self.config.camera.name;
        if let Some(found) = available.iter().find(|c| &c.name == configured) {
            log::debug!("using camera name from config: {configured}");
            return found.clone();
        }
        log::warn!("no camera named '{configured}', falling back to first detected");
        available[0].clone()
    }

    /// Disconnect the current camera.
    ///
    /// The handle and descriptor are cleared regardless of whether the
    /// device close succeeds. Calling while disconnected yields a non-fatal
    /// `NotConnected` error value.
    pub fn disconnect(&mut self) -> Result<(), CameraError> {
        match self.active.take() {
            Some(mut conn) => match conn.handle.close() {
                Ok(()) => {
                    log::info!("camera disconnected");
                    Ok(())
                }
                Err(e) => {
                    let error = CameraError::device_io(&e);
                    log::error!("error during camera disconnection: {error}");
                    Err(error)
                }
            },
            None => Err(CameraError::new(
                ErrorKind::NotConnected,
                "no camera to disconnect",
            )),
        }
    }

    /// Disconnect (ignoring the outcome) and reconnect with no name override.
    pub fn reset(&mut self) -> Result<CameraDescriptor, CameraError> {
        if self.active.is_some() {
            log::debug!("resetting camera: disconnecting existing connection");
            let _ = self.disconnect();
        }
        self.connect(None)
    }

    /// Retrieve the device summary text.
    pub fn summary(&mut self) -> Result<String, CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        conn.handle
            .summary()
            .map_err(|e| CameraError::device_io(&e))
    }

    /// Trip a named remote-control action on the device.
    pub fn send_signal(&mut self, action: Option<&str>) -> Result<(), CameraError> {
        let action = action.unwrap_or(REMOTE_RELEASE_ACTION);
        self.update_config_tree(|tree| {
            let node = tree
                .child_mut(action)
                .ok_or_else(|| CameraError::unsupported_action(action))?;
            node.value = press_value(&node.choices);
            Ok(())
        })?;
        log::info!("camera signal '{action}' sent");
        Ok(())
    }

    /// Read the live device configuration tree.
    pub fn read_config_tree(&mut self) -> Result<ConfigTree, CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        conn.handle
            .read_config_tree()
            .map_err(|e| CameraError::device_io(&e))
    }

    /// Read-modify-write transaction on the device configuration tree.
    ///
    /// Fetches the live tree, applies `mutate`, and pushes the tree back.
    /// The write-back is skipped when `mutate` fails, so a failed lookup
    /// never touches the device.
    pub fn update_config_tree<T>(
        &mut self,
        mutate: impl FnOnce(&mut ConfigTree) -> Result<T, CameraError>,
    ) -> Result<T, CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        let mut tree = conn
            .handle
            .read_config_tree()
            .map_err(|e| CameraError::device_io(&e))?;
        let out = mutate(&mut tree)?;
        conn.handle
            .write_config_tree(&tree)
            .map_err(|e| CameraError::device_io(&e))?;
        Ok(out)
    }

    /// Trigger an image capture, returning the on-camera file path.
    pub fn trigger_capture(&mut self) -> Result<DeviceFile, CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        conn.handle
            .trigger_capture()
            .map_err(|e| CameraError::device_io(&e))
    }

    /// Download a captured file from the camera to local storage.
    pub fn download_file(&mut self, file: &DeviceFile, dest: &Path) -> Result<(), CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        conn.handle
            .download_file(file, dest)
            .map_err(|e| CameraError::device_io(&e))
    }

    /// Capture a live-view preview frame to local storage.
    pub fn capture_preview_to(&mut self, dest: &Path) -> Result<(), CameraError> {
        let conn = self.active.as_mut().ok_or_else(CameraError::not_connected)?;
        conn.handle
            .capture_preview(dest)
            .map_err(|e| CameraError::device_io(&e))
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.active.is_some() {
            let _ = self.disconnect();
        }
    }
}

/// Value written to a release widget: `Press Full` where the device offers
/// it, else the first reported choice, else a plain toggle.
fn press_value(choices: &[String]) -> String {
    if choices.iter().any(|c| c == "Press Full") {
        "Press Full".to_string()
    } else if let Some(first) = choices.first() {
        first.clone()
    } else {
        "1".to_string()
    }
}
