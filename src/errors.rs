use crate::interpreter;
use std::fmt;
use thiserror::Error;

/// Raw failure reported by a device backend, carrying the protocol-level
/// error code. Codes are translated for humans by [`crate::interpreter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device error {code}: {message}")]
pub struct DeviceError {
    pub code: i32,
    pub message: String,
}

impl DeviceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Human-readable category for this error's code.
    pub fn interpreted(&self) -> String {
        interpreter::interpret(self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotConnected,
    NoCameraFound,
    ConnectionFailed,
    SettingNotFound,
    UnsupportedAction,
    CaptureFailed,
    DeviceIo,
    ConfigLoad,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CameraError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_connected() -> Self {
        Self {
            kind: ErrorKind::NotConnected,
            message: "no camera connected".to_string(),
        }
    }

    pub fn no_camera_found() -> Self {
        Self {
            kind: ErrorKind::NoCameraFound,
            message: "camera detection failed or no cameras found".to_string(),
        }
    }

    pub fn connection_failed(name: &str, error: &DeviceError) -> Self {
        Self {
            kind: ErrorKind::ConnectionFailed,
            message: format!("failed to connect to camera '{name}': {}", error.interpreted()),
        }
    }

    pub fn setting_not_found(name: &str) -> Self {
        Self {
            kind: ErrorKind::SettingNotFound,
            message: format!("setting '{name}' not found"),
        }
    }

    pub fn unsupported_action(name: &str) -> Self {
        Self {
            kind: ErrorKind::UnsupportedAction,
            message: format!("remote action '{name}' not supported by this camera"),
        }
    }

    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::CaptureFailed,
            message: message.into(),
        }
    }

    pub fn device_io(error: &DeviceError) -> Self {
        let interpreted = error.interpreted();
        let message = if error.message.is_empty() {
            interpreted
        } else {
            format!("{interpreted} ({})", error.message)
        };
        Self {
            kind: ErrorKind::DeviceIo,
            message,
        }
    }

    pub fn config_load(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ConfigLoad,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            message: "operation cancelled".to_string(),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CameraError {}

impl From<&DeviceError> for CameraError {
    fn from(error: &DeviceError) -> Self {
        CameraError::device_io(error)
    }
}
