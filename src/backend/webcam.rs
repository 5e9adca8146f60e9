//! Production backend for locally attached cameras.
//!
//! Drives whatever the host exposes through the native capture stack. The
//! configuration tree offered here is the common control set of UVC-class
//! devices; tethered still cameras expose far richer trees through the same
//! trait.

use crate::backend::{CameraBackend, CameraHandle};
use crate::errors::DeviceError;
use crate::interpreter::codes;
use crate::types::{CameraDescriptor, ConfigTree, DeviceFile, SettingDescriptor, SettingKind};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    CallbackCamera,
};
use std::collections::HashMap;
use std::path::Path;

// Common UVC control set; value application is backend-specific and stubbed
// where the native stack exposes no control channel.
const CONTROL_TABLE: &[(&str, SettingKind, &str, &[&str])] = &[
    (
        "whitebalance",
        SettingKind::Radio,
        "Auto",
        &["Auto", "Daylight", "Cloudy", "Tungsten", "Fluorescent"],
    ),
    ("brightness", SettingKind::Range, "50", &[]),
    ("contrast", SettingKind::Range, "50", &[]),
    ("saturation", SettingKind::Range, "50", &[]),
    ("hue", SettingKind::Range, "0", &[]),
    ("artist", SettingKind::Text, "", &[]),
];

/// Backend over the native capture stack.
#[derive(Default)]
pub struct WebcamBackend;

impl WebcamBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for WebcamBackend {
    fn detect(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        let cameras = query(ApiBackend::Auto).map_err(|e| {
            DeviceError::new(codes::CAMERA_NOT_FOUND, format!("failed to query cameras: {e}"))
        })?;

        Ok(cameras
            .iter()
            .map(|info| CameraDescriptor::new(info.human_name(), info.index().to_string()))
            .collect())
    }

    fn open(&self, descriptor: &CameraDescriptor) -> Result<Box<dyn CameraHandle>, DeviceError> {
        let index = descriptor.port.parse::<u32>().map_err(|_| {
            DeviceError::new(
                codes::UNKNOWN_PORT,
                format!("invalid camera port: {}", descriptor.port),
            )
        })?;

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested, |_| {})
            .map_err(|e| {
                DeviceError::new(codes::CAMERA_IO, format!("failed to initialize camera: {e}"))
            })?;

        camera.open_stream().map_err(|e| {
            DeviceError::new(codes::CAMERA_IO, format!("failed to open stream: {e}"))
        })?;

        log::debug!(
            "opened camera '{}' at port {}",
            descriptor.name,
            descriptor.port
        );

        Ok(Box::new(WebcamHandle {
            camera,
            descriptor: descriptor.clone(),
            applied: HashMap::new(),
            pending: None,
            sequence: 0,
        }))
    }
}

/// Open handle to a locally attached camera.
pub struct WebcamHandle {
    camera: CallbackCamera,
    descriptor: CameraDescriptor,
    /// Values applied through the config tree, overlaying the defaults.
    applied: HashMap<String, String>,
    /// Frame held between trigger and download.
    pending: Option<image::DynamicImage>,
    sequence: u64,
}

impl WebcamHandle {
    fn grab_frame(&mut self) -> Result<image::DynamicImage, DeviceError> {
        let frame = self.camera.poll_frame().map_err(|e| {
            DeviceError::new(codes::CAPTURE_FAILED, format!("failed to capture frame: {e}"))
        })?;

        let rgb = image::RgbImage::from_vec(
            frame.resolution().width_x,
            frame.resolution().height_y,
            frame.buffer_bytes().to_vec(),
        )
        .ok_or_else(|| {
            DeviceError::new(
                codes::CAPTURE_FAILED,
                "frame buffer did not match reported resolution",
            )
        })?;

        Ok(image::DynamicImage::ImageRgb8(rgb))
    }
}

impl CameraHandle for WebcamHandle {
    fn summary(&mut self) -> Result<String, DeviceError> {
        let stream_open = self.camera.is_stream_open().map_err(|e| {
            DeviceError::new(codes::CAMERA_IO, format!("failed to query stream state: {e}"))
        })?;
        Ok(format!(
            "Camera: {}\nPort: {}\nStream open: {}",
            self.descriptor.name,
            self.descriptor.port,
            stream_open
        ))
    }

    fn read_config_tree(&mut self) -> Result<ConfigTree, DeviceError> {
        let mut nodes = Vec::with_capacity(CONTROL_TABLE.len());
        for (name, kind, default, choices) in CONTROL_TABLE {
            let value = self
                .applied
                .get(*name)
                .cloned()
                .unwrap_or_else(|| (*default).to_string());
            let mut node = SettingDescriptor::new(*name, *kind, value);
            if !choices.is_empty() {
                node = node.with_choices(choices.iter().map(|c| (*c).to_string()).collect());
            }
            nodes.push(node);
        }
        Ok(ConfigTree::new(nodes))
    }

    fn write_config_tree(&mut self, tree: &ConfigTree) -> Result<(), DeviceError> {
        // The native stack exposes no portable control channel; record the
        // values so subsequent reads reflect them.
        for node in tree.nodes() {
            self.applied.insert(node.name.clone(), node.value.clone());
        }
        Ok(())
    }

    fn trigger_capture(&mut self) -> Result<DeviceFile, DeviceError> {
        let frame = self.grab_frame()?;
        self.sequence += 1;
        let name = format!("IMG_{:04}.jpg", self.sequence);
        self.pending = Some(frame);
        Ok(DeviceFile {
            folder: "/".to_string(),
            name,
        })
    }

    fn download_file(&mut self, file: &DeviceFile, dest: &Path) -> Result<(), DeviceError> {
        let frame = self.pending.take().ok_or_else(|| {
            DeviceError::new(
                codes::FILE_NOT_FOUND,
                format!("no pending frame for {}/{}", file.folder, file.name),
            )
        })?;

        frame
            .save_with_format(dest, image::ImageFormat::Jpeg)
            .map_err(|e| {
                DeviceError::new(codes::CAMERA_IO, format!("failed to save frame: {e}"))
            })
    }

    fn capture_preview(&mut self, dest: &Path) -> Result<(), DeviceError> {
        let frame = self.grab_frame().map_err(|e| {
            DeviceError::new(codes::PREVIEW_FAILED, format!("preview capture: {}", e.message))
        })?;

        frame
            .save_with_format(dest, image::ImageFormat::Jpeg)
            .map_err(|e| {
                DeviceError::new(codes::CAMERA_IO, format!("failed to save preview: {e}"))
            })
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.camera.stop_stream().map_err(|e| {
            DeviceError::new(codes::CAMERA_IO, format!("failed to stop stream: {e}"))
        })
    }
}
