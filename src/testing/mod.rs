//! Testing utilities.
//!
//! Provides a scriptable mock camera backend for offline runs, selectable in
//! place of the real backend with `TETHERCAM_USE_MOCK=1`. Failure switches
//! and call counters live in a shared [`MockState`] so tests can both steer
//! the device and observe exactly what the services did to it.

use crate::backend::{CameraBackend, CameraHandle};
use crate::errors::DeviceError;
use crate::interpreter::codes;
use crate::types::{CameraDescriptor, ConfigTree, DeviceFile, SettingDescriptor, SettingKind};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Minimal but valid JPEG payload written by mock downloads and previews.
const JPEG_STUB: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Shared, observable state of a [`MockBackend`] and its handles.
#[derive(Default)]
pub struct MockState {
    pub detect_calls: AtomicUsize,
    pub open_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub config_reads: AtomicUsize,
    pub config_writes: AtomicUsize,
    pub trigger_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub preview_calls: AtomicUsize,

    pub fail_detect: AtomicBool,
    pub fail_open: AtomicBool,
    pub fail_close: AtomicBool,
    pub fail_config_read: AtomicBool,
    pub fail_config_write: AtomicBool,
    pub fail_trigger: AtomicBool,
    pub fail_download: AtomicBool,
    pub fail_preview: AtomicBool,

    /// Number of config reads that report Camera Busy before the device
    /// counts as ready. Zero means ready immediately.
    pub ready_after: AtomicU32,

    /// Current setting values, updated by config-tree writes.
    values: Mutex<BTreeMap<String, String>>,
}

impl MockState {
    /// Current value of a setting as the device would report it.
    pub fn value(&self, name: &str) -> Option<String> {
        self.values.lock().expect("lock poisoned").get(name).cloned()
    }
}

/// Scriptable stand-in for a camera subsystem.
pub struct MockBackend {
    cameras: Vec<CameraDescriptor>,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Backend with a single attached mock camera.
    pub fn new() -> Self {
        Self::with_cameras(vec![CameraDescriptor::new("Mock Camera", "usb:001,004")])
    }

    pub fn with_cameras(cameras: Vec<CameraDescriptor>) -> Self {
        Self {
            cameras,
            state: Arc::new(MockState::default()),
        }
    }

    /// Shared state handle for steering and assertions.
    pub fn state(&self) -> Arc<MockState> {
        self.state.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for MockBackend {
    fn detect(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        self.state.detect_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_detect.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::USB, "usb enumeration failure"));
        }
        Ok(self.cameras.clone())
    }

    fn open(&self, descriptor: &CameraDescriptor) -> Result<Box<dyn CameraHandle>, DeviceError> {
        self.state.open_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAMERA_BUSY, "camera busy"));
        }
        Ok(Box::new(MockHandle {
            descriptor: descriptor.clone(),
            state: self.state.clone(),
        }))
    }
}

struct MockHandle {
    descriptor: CameraDescriptor,
    state: Arc<MockState>,
}

impl MockHandle {
    fn default_tree(&self) -> ConfigTree {
        let values = self.state.values.lock().expect("lock poisoned");
        let node = |name: &str, kind: SettingKind, default: &str, choices: &[&str]| {
            let value = values
                .get(name)
                .cloned()
                .unwrap_or_else(|| default.to_string());
            let mut node = SettingDescriptor::new(name, kind, value);
            if !choices.is_empty() {
                node = node.with_choices(choices.iter().map(|c| (*c).to_string()).collect());
            }
            node
        };

        ConfigTree::new(vec![
            node(
                "iso",
                SettingKind::Radio,
                "Auto",
                &["Auto", "100", "200", "400", "800", "1600", "3200"],
            ),
            node(
                "aperture",
                SettingKind::Radio,
                "2.8",
                &["1.8", "2.8", "4", "5.6", "8"],
            ),
            node(
                "shutterspeed",
                SettingKind::Radio,
                "1/125",
                &["1/1000", "1/500", "1/250", "1/125", "1/60", "1/30"],
            ),
            node(
                "whitebalance",
                SettingKind::Radio,
                "Auto",
                &["Auto", "Daylight", "Cloudy", "Tungsten", "Fluorescent"],
            ),
            node("artist", SettingKind::Text, "", &[]),
            node(
                "remote-release",
                SettingKind::Radio,
                "None",
                &["None", "Press Half", "Press Full", "Release Full"],
            ),
        ])
    }
}

impl CameraHandle for MockHandle {
    fn summary(&mut self) -> Result<String, DeviceError> {
        Ok(format!(
            "Model: {}\nPort: {}\nManufacturer: Tethercam Mock Works",
            self.descriptor.name, self.descriptor.port
        ))
    }

    fn read_config_tree(&mut self) -> Result<ConfigTree, DeviceError> {
        let reads = self.state.config_reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.fail_config_read.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAMERA_IO, "config read failure"));
        }
        if (reads as u32) <= self.state.ready_after.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAMERA_BUSY, "device still busy"));
        }
        Ok(self.default_tree())
    }

    fn write_config_tree(&mut self, tree: &ConfigTree) -> Result<(), DeviceError> {
        self.state.config_writes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_config_write.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAMERA_IO, "config write failure"));
        }
        let mut values = self.state.values.lock().expect("lock poisoned");
        for node in tree.nodes() {
            values.insert(node.name.clone(), node.value.clone());
        }
        Ok(())
    }

    fn trigger_capture(&mut self) -> Result<DeviceFile, DeviceError> {
        let n = self.state.trigger_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.fail_trigger.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAPTURE_FAILED, "shutter jammed"));
        }
        Ok(DeviceFile {
            folder: "/store_00010001/DCIM/100MOCK".to_string(),
            name: format!("IMG_{n:04}.JPG"),
        })
    }

    fn download_file(&mut self, file: &DeviceFile, dest: &Path) -> Result<(), DeviceError> {
        self.state.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_download.load(Ordering::SeqCst) {
            return Err(DeviceError::new(
                codes::FILE_NOT_FOUND,
                format!("{}/{} vanished from storage", file.folder, file.name),
            ));
        }
        std::fs::write(dest, JPEG_STUB)
            .map_err(|e| DeviceError::new(codes::CAMERA_IO, format!("local write failed: {e}")))
    }

    fn capture_preview(&mut self, dest: &Path) -> Result<(), DeviceError> {
        self.state.preview_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_preview.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::PREVIEW_FAILED, "liveview unavailable"));
        }
        std::fs::write(dest, JPEG_STUB)
            .map_err(|e| DeviceError::new(codes::CAMERA_IO, format!("local write failed: {e}")))
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(DeviceError::new(codes::CAMERA_IO, "device detached mid-close"));
        }
        Ok(())
    }
}
