//! Device backend seam.
//!
//! The session layer talks to cameras exclusively through these traits so
//! the tethering SDK stays swappable: the production backend drives locally
//! attached cameras, and the scriptable mock in [`crate::testing`] stands in
//! for offline test runs.

pub mod webcam;

use crate::errors::DeviceError;
use crate::types::{CameraDescriptor, ConfigTree, DeviceFile};
use std::path::Path;

/// Environment switch selecting the mock backend (set to `1`).
pub const MOCK_ENV: &str = "TETHERCAM_USE_MOCK";

/// Detection and connection entry point of a camera subsystem.
pub trait CameraBackend: Send {
    /// Enumerate attached cameras.
    fn detect(&self) -> Result<Vec<CameraDescriptor>, DeviceError>;

    /// Open a live handle to a detected camera.
    fn open(&self, descriptor: &CameraDescriptor) -> Result<Box<dyn CameraHandle>, DeviceError>;
}

/// Live connection to one camera.
///
/// The session owns exactly one of these at a time; all other components
/// borrow it per-call through the session.
pub trait CameraHandle: Send {
    /// Device summary text.
    fn summary(&mut self) -> Result<String, DeviceError>;

    /// Read the live configuration tree. Never cached by callers.
    fn read_config_tree(&mut self) -> Result<ConfigTree, DeviceError>;

    /// Push a mutated configuration tree back to the device.
    fn write_config_tree(&mut self, tree: &ConfigTree) -> Result<(), DeviceError>;

    /// Trigger an image capture on the device, returning the on-camera file.
    fn trigger_capture(&mut self) -> Result<DeviceFile, DeviceError>;

    /// Download a captured file from the camera to local storage.
    fn download_file(&mut self, file: &DeviceFile, dest: &Path) -> Result<(), DeviceError>;

    /// Capture a live-view preview frame straight to local storage.
    fn capture_preview(&mut self, dest: &Path) -> Result<(), DeviceError>;

    /// Close the connection. The session clears its state regardless of the
    /// outcome.
    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Select the backend for this process.
pub fn default_backend() -> Box<dyn CameraBackend> {
    if std::env::var(MOCK_ENV).map(|v| v == "1").unwrap_or(false) {
        log::info!("using mock camera backend ({MOCK_ENV}=1)");
        Box::new(crate::testing::MockBackend::new())
    } else {
        Box::new(webcam::WebcamBackend::new())
    }
}
