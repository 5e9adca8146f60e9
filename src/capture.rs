//! Image and preview capture with readiness polling and bounded retry.

use crate::config::AppConfig;
use crate::errors::CameraError;
use crate::session::CameraSession;
use crate::types::CaptureArtifact;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as SyncMutex;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Fixed cadence of the readiness probe loop.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct CaptureService {
    session: Arc<Mutex<CameraSession>>,
    save_directory: PathBuf,
    preview_directory: PathBuf,
    retry_attempts: u32,
    retry_delay: Duration,
    connection_timeout: Duration,
    /// Last successfully captured image, served by the photo endpoint.
    last_capture: SyncMutex<Option<PathBuf>>,
}

impl CaptureService {
    /// Build the service, creating the save/preview directories.
    ///
    /// Directory creation is idempotent; if it fails, both directories fall
    /// back to the current working directory so capture stays possible.
    pub fn new(session: Arc<Mutex<CameraSession>>, config: &AppConfig) -> Self {
        let (save_directory, preview_directory) = prepare_directories(
            Path::new(&config.capture.save_directory),
            Path::new(&config.capture.preview_directory),
        );

        Self {
            session,
            save_directory,
            preview_directory,
            retry_attempts: config.capture.retry_attempts.max(1),
            retry_delay: config.capture.retry_delay(),
            connection_timeout: config.camera.connection_timeout(),
            last_capture: SyncMutex::new(None),
        }
    }

    pub fn save_directory(&self) -> &Path {
        &self.save_directory
    }

    pub fn preview_directory(&self) -> &Path {
        &self.preview_directory
    }

    /// Path of the last successfully captured image, if any.
    pub fn last_capture(&self) -> Option<PathBuf> {
        self.last_capture.lock().expect("lock poisoned").clone()
    }

    /// Poll the device until it answers a trivial config read or `timeout`
    /// (default: the configured connection timeout) elapses.
    ///
    /// This is the gate before any capture call from the API surface.
    pub async fn wait_until_ready(&self, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or(self.connection_timeout);
        let start = Instant::now();

        while start.elapsed() < timeout {
            let probe = self.session.lock().await.read_config_tree();
            match probe {
                Ok(_) => return true,
                Err(e) => log::warn!("camera not ready, retrying: {e}"),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        log::error!("camera not ready after {:.1}s", timeout.as_secs_f64());
        false
    }

    /// Capture an image to `save_path` (default: a timestamped file under
    /// the save directory), retrying up to the configured attempt budget.
    pub async fn capture_image(
        &self,
        save_path: Option<PathBuf>,
    ) -> Result<CaptureArtifact, CameraError> {
        self.capture_image_with_cancel(save_path, CancellationToken::new())
            .await
    }

    /// Like [`capture_image`](Self::capture_image), honoring `cancel` at
    /// each retry boundary. With an unfired token this is exactly the
    /// default bounded-retry behavior.
    pub async fn capture_image_with_cancel(
        &self,
        save_path: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<CaptureArtifact, CameraError> {
        if !self.session.lock().await.is_connected() {
            let error = CameraError::not_connected();
            log::error!("image capture refused: {error}");
            return Err(error);
        }

        let save_path = save_path
            .unwrap_or_else(|| self.save_directory.join(format!("capture_{}.jpg", timestamp())));
        log::debug!("image capture to {}", save_path.display());

        for attempt in 1..=self.retry_attempts {
            if cancel.is_cancelled() {
                return Err(CameraError::cancelled());
            }

            log::info!("capture attempt {attempt}/{}", self.retry_attempts);
            match self.try_capture(&save_path).await {
                Ok(artifact) => {
                    *self.last_capture.lock().expect("lock poisoned") =
                        Some(artifact.save_path.clone());
                    log::info!("image capture successful: {}", artifact.save_path.display());
                    return Ok(artifact);
                }
                Err(e) => log::warn!("capture attempt {attempt} failed: {e}"),
            }

            if attempt < self.retry_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(CameraError::cancelled()),
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
            }
        }

        let message = format!(
            "failed to capture image after {} attempts",
            self.retry_attempts
        );
        log::error!("{message}");
        Err(CameraError::capture_failed(message))
    }

    /// One capture attempt: trigger on the device, then download the result
    /// to local storage. The two steps fail and report separately; success
    /// requires the file confirmed on disk.
    async fn try_capture(&self, save_path: &Path) -> Result<CaptureArtifact, CameraError> {
        let mut session = self.session.lock().await;
        let device_file = session.trigger_capture()?;
        log::debug!(
            "camera captured image at {}/{}",
            device_file.folder,
            device_file.name
        );
        session.download_file(&device_file, save_path)?;
        Ok(CaptureArtifact {
            save_path: save_path.to_path_buf(),
        })
    }

    /// Capture a preview frame to `save_path` (default: a timestamped file
    /// under the preview directory). Single attempt, no retry loop.
    pub async fn capture_preview(
        &self,
        save_path: Option<PathBuf>,
    ) -> Result<CaptureArtifact, CameraError> {
        let save_path = save_path.unwrap_or_else(|| {
            self.preview_directory
                .join(format!("preview_{}.jpg", timestamp()))
        });

        let mut session = self.session.lock().await;
        if !session.is_connected() {
            let error = CameraError::not_connected();
            log::error!("preview capture refused: {error}");
            return Err(error);
        }

        session.capture_preview_to(&save_path)?;
        log::info!("preview image saved at {}", save_path.display());
        Ok(CaptureArtifact { save_path })
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn prepare_directories(save: &Path, preview: &Path) -> (PathBuf, PathBuf) {
    match fs::create_dir_all(save).and_then(|_| fs::create_dir_all(preview)) {
        Ok(()) => (save.to_path_buf(), preview.to_path_buf()),
        Err(e) => {
            log::error!(
                "failed to create capture directories: {e}; falling back to current directory"
            );
            (PathBuf::from("."), PathBuf::from("."))
        }
    }
}
