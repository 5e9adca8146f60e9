//! Core types shared across the session, settings, and capture layers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifying metadata for a detected, not-yet-opened camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub name: String,
    pub port: String,
}

impl CameraDescriptor {
    pub fn new(name: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
        }
    }
}

/// Widget kind of a device configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Radio,
    Menu,
    Text,
    Toggle,
    Range,
}

impl SettingKind {
    /// Radio and menu settings are restricted to a device-reported choice list.
    pub fn is_enumerated(self) -> bool {
        matches!(self, SettingKind::Radio | SettingKind::Menu)
    }
}

/// One entry of the device's live configuration tree, queried on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub name: String,
    pub kind: SettingKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl SettingDescriptor {
    pub fn new(name: impl Into<String>, kind: SettingKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }
}

/// Snapshot of the device configuration tree.
///
/// Always re-read from the device before use; never cached across operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTree {
    nodes: Vec<SettingDescriptor>,
}

impl ConfigTree {
    pub fn new(nodes: Vec<SettingDescriptor>) -> Self {
        Self { nodes }
    }

    pub fn child(&self, name: &str) -> Option<&SettingDescriptor> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut SettingDescriptor> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    pub fn nodes(&self) -> &[SettingDescriptor] {
        &self.nodes
    }
}

/// Path of a file on the camera's own storage, produced by a capture trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFile {
    pub folder: String,
    pub name: String,
}

/// Result datum of a successful capture: where the image landed locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureArtifact {
    pub save_path: PathBuf,
}
