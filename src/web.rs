//! HTTP surface.
//!
//! Thin request/response mapping over the session, settings, and capture
//! services. Every operation answers with the uniform envelope
//! `{success, data?, message}`; capture endpoints answer the legacy
//! `{status, message}` shape their clients expect.

use crate::capture::CaptureService;
use crate::config::AppConfig;
use crate::errors::CameraError;
use crate::session::CameraSession;
use crate::settings::SettingsService;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Settings reported alongside a successful connect.
pub const CONNECT_CONFIG_KEYS: [&str; 4] = ["iso", "aperture", "shutterspeed", "whitebalance"];

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<CameraSession>>,
    pub settings: Arc<SettingsService>,
    pub capture: Arc<CaptureService>,
}

impl AppState {
    /// State over the process-default backend.
    pub fn new(config: AppConfig) -> Self {
        let session = Arc::new(Mutex::new(CameraSession::new(config.clone())));
        Self::from_session(session, &config)
    }

    /// State over an existing session (used by tests with a mock backend).
    pub fn from_session(session: Arc<Mutex<CameraSession>>, config: &AppConfig) -> Self {
        let settings = Arc::new(SettingsService::new(session.clone()));
        let capture = Arc::new(CaptureService::new(session.clone(), config));
        Self {
            session,
            settings,
            capture,
        }
    }
}

/// Uniform operation envelope: `success == false` implies no data and a
/// non-empty message.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

impl From<&CameraError> for ApiResponse {
    fn from(error: &CameraError) -> Self {
        ApiResponse::error(error.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/connect", get(connect))
        .route("/api/disconnect", get(disconnect))
        .route("/api/reset", get(reset))
        .route("/api/status", get(status))
        .route("/api/summary", get(summary))
        .route("/api/test", get(test_camera))
        .route("/api/capture", get(capture_photo))
        .route("/api/get_photos", get(get_photos))
        .route("/api/set-config", post(set_config))
        .with_state(state)
}

/// Serve the API on the given port until the process exits.
pub async fn run(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("tethercam listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn connect(State(state): State<AppState>) -> Json<Value> {
    let result = state.session.lock().await.connect(None);
    let config = read_connect_config(&state).await;

    match result {
        Ok(descriptor) => Json(json!({
            "success": true,
            "message": "Camera connected successfully.",
            "data": {"camera_name": descriptor.name, "port": descriptor.port},
            "config": config,
        })),
        Err(e) => Json(json!({
            "success": false,
            "message": e.to_string(),
            "config": config,
        })),
    }
}

/// The fixed exposure settings reported on connect; failed reads are null.
async fn read_connect_config(state: &AppState) -> Value {
    let values = state.settings.get_multiple(&CONNECT_CONFIG_KEYS).await;
    let mut map = serde_json::Map::new();
    for (name, result) in values {
        map.insert(
            name,
            match result {
                Ok(value) => Value::String(value),
                Err(_) => Value::Null,
            },
        );
    }
    Value::Object(map)
}

async fn disconnect(State(state): State<AppState>) -> Json<ApiResponse> {
    match state.session.lock().await.disconnect() {
        Ok(()) => Json(ApiResponse::ok("Camera disconnected.")),
        Err(e) => Json(ApiResponse::from(&e)),
    }
}

async fn reset(State(state): State<AppState>) -> Json<ApiResponse> {
    match state.session.lock().await.reset() {
        Ok(descriptor) => Json(
            ApiResponse::ok("Camera reset successfully.")
                .with_data(json!({"camera_name": descriptor.name, "port": descriptor.port})),
        ),
        Err(e) => Json(ApiResponse::error(format!("failed to reset camera: {e}"))),
    }
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let connected = state.session.lock().await.is_connected();
    Json(json!({"status": connected}))
}

async fn summary(State(state): State<AppState>) -> Json<ApiResponse> {
    match state.session.lock().await.summary() {
        Ok(text) => Json(
            ApiResponse::ok("Camera summary retrieved.").with_data(json!({"summary": text})),
        ),
        Err(e) => Json(ApiResponse::from(&e)),
    }
}

async fn test_camera(State(state): State<AppState>) -> Json<Value> {
    if !state.session.lock().await.is_connected() {
        return Json(json!({"status": "error", "message": "Camera is not connected."}));
    }
    if !state.capture.wait_until_ready(None).await {
        return Json(json!({"status": "error", "message": "Camera is not ready."}));
    }
    match state.capture.capture_preview(None).await {
        Ok(_) => Json(json!({"status": "success", "message": "Photo captured successfully."})),
        Err(e) => Json(json!({"status": "error", "message": e.to_string()})),
    }
}

async fn capture_photo(State(state): State<AppState>) -> Json<Value> {
    if !state.session.lock().await.is_connected() {
        return Json(json!({"status": "error", "message": "Camera is not connected."}));
    }
    if !state.capture.wait_until_ready(None).await {
        return Json(json!({"status": "error", "message": "Camera is not ready."}));
    }
    match state.capture.capture_image(None).await {
        Ok(_) => Json(json!({"status": "success", "message": "Photo captured successfully."})),
        Err(e) => Json(json!({"status": "error", "message": e.to_string()})),
    }
}

/// Serve the last captured image as binary JPEG.
async fn get_photos(State(state): State<AppState>) -> Response {
    let Some(path) = state.capture.last_capture() else {
        return error_response(StatusCode::NOT_FOUND, "no captured photo available");
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::from(bytes))
            .unwrap(),
        Err(e) => {
            log::error!("failed to read captured photo {}: {e}", path.display());
            error_response(StatusCode::NOT_FOUND, "captured photo no longer available")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

/// Apply a batch of settings; answers a per-key envelope map. Nested values
/// are skipped and absent from the map.
async fn set_config(
    State(state): State<AppState>,
    Json(request): Json<SetConfigRequest>,
) -> Json<Value> {
    let results = state.settings.set_multiple(&request.config).await;

    let mut map = serde_json::Map::new();
    for (name, result) in results {
        let envelope = match result {
            Ok(()) => ApiResponse::ok(format!("successfully set {name}")),
            Err(e) => ApiResponse::from(&e),
        };
        map.insert(name, json!(envelope));
    }
    Json(Value::Object(map))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::to_string(&ApiResponse::error(message)).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_has_no_data() {
        let envelope = ApiResponse::error("boom");
        let value = json!(envelope);
        assert_eq!(value["success"], json!(false));
        assert!(value.get("data").is_none());
        assert!(!value["message"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_ok_envelope_with_data() {
        let envelope = ApiResponse::ok("done").with_data(json!({"x": 1}));
        let value = json!(envelope);
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["x"], json!(1));
    }

    #[test]
    fn test_camera_error_maps_to_envelope() {
        let error = CameraError::not_connected();
        let envelope = ApiResponse::from(&error);
        assert!(!envelope.success);
        assert_eq!(envelope.message, "no camera connected");
        assert!(envelope.data.is_none());
    }
}
