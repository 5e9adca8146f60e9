//! Tethercam: remote control of tethered digital cameras behind an HTTP API.
//!
//! This crate manages a single stateful camera session per process —
//! detection, connection, configuration, capture — over an unreliable
//! hardware link, and exposes it through a small JSON API.
//!
//! # Features
//! - Single-session camera lifecycle (connect, disconnect, reset)
//! - Setting reads/writes validated against device-reported choices
//! - Readiness polling and retry-bounded image capture
//! - Preview capture to local storage
//! - Scriptable mock backend for offline testing
//!
//! # Usage
//! Run the bundled server:
//! ```text
//! tethercam-server --config tethercam.yaml --port 5555
//! ```
//!
//! Or embed the services:
//! ```rust,no_run
//! use std::sync::Arc;
//! use tethercam::{config::AppConfig, session::CameraSession, capture::CaptureService};
//! use tokio::sync::Mutex;
//!
//! # async fn run() {
//! let config = AppConfig::load_or_default(AppConfig::default_path());
//! let session = Arc::new(Mutex::new(CameraSession::new(config.clone())));
//! session.lock().await.connect(None).ok();
//! let capture = CaptureService::new(session.clone(), &config);
//! if capture.wait_until_ready(None).await {
//!     let _ = capture.capture_image(None).await;
//! }
//! # }
//! ```

pub mod backend;
pub mod capture;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod session;
pub mod settings;
pub mod types;
pub mod web;

// Testing utilities - the mock backend for offline runs
pub mod testing;

// Re-exports for convenience
pub use capture::CaptureService;
pub use config::AppConfig;
pub use errors::{CameraError, DeviceError, ErrorKind};
pub use session::CameraSession;
pub use settings::SettingsService;
pub use types::{CameraDescriptor, CaptureArtifact, ConfigTree, SettingDescriptor, SettingKind};

/// Initialize logging, seeding `RUST_LOG` with the configured console level
/// when the environment does not already set one.
pub fn init_logging(console_level: &str) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var(
            "RUST_LOG",
            format!("tethercam={}", console_level.to_lowercase()),
        );
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
