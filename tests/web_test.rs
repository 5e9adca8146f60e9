#[cfg(test)]
mod web_tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tethercam::config::AppConfig;
    use tethercam::session::CameraSession;
    use tethercam::testing::{MockBackend, MockState};
    use tethercam::web::{router, AppState};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        session: Arc<Mutex<CameraSession>>,
        state: Arc<MockState>,
    }

    fn test_app_with(backend: MockBackend, dir: &tempfile::TempDir) -> TestApp {
        let state = backend.state();
        let mut config = AppConfig::default();
        config.capture.save_directory = dir.path().join("images").display().to_string();
        config.capture.preview_directory = dir.path().join("previews").display().to_string();
        config.capture.retry_delay = 0.05;

        let session = Arc::new(Mutex::new(CameraSession::with_backend(
            Box::new(backend),
            config.clone(),
        )));
        let app_state = AppState::from_session(session.clone(), &config);
        TestApp {
            router: router(app_state),
            session,
            state,
        }
    }

    fn test_app(dir: &tempfile::TempDir) -> TestApp {
        test_app_with(MockBackend::new(), dir)
    }

    async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, Value) {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_status_reflects_session_connectivity() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (status, body) = get_json(&app, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": false}));

        app.session.lock().await.connect(None).unwrap();
        let (_, body) = get_json(&app, "/api/status").await;
        assert_eq!(body, json!({"status": true}));
    }

    #[tokio::test]
    async fn test_connect_returns_envelope_with_exposure_config() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (status, body) = get_json(&app, "/api/connect").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["camera_name"], json!("Mock Camera"));
        assert!(!body["message"].as_str().unwrap().is_empty());

        let config = body["config"].as_object().unwrap();
        for key in ["iso", "aperture", "shutterspeed", "whitebalance"] {
            assert!(config[key].is_string(), "missing connect config key {key}");
        }
    }

    #[tokio::test]
    async fn test_connect_with_no_cameras_is_error_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app_with(MockBackend::with_cameras(vec![]), &dir);

        let (status, body) = get_json(&app, "/api/connect").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert!(body.get("data").is_none());
        assert!(!body["message"].as_str().unwrap().is_empty());
        // The exposure block is still present, with nothing readable.
        assert!(body["config"].as_object().unwrap().values().all(Value::is_null));
    }

    #[tokio::test]
    async fn test_disconnect_envelope_when_not_connected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (_, body) = get_json(&app, "/api/disconnect").await;
        assert_eq!(body["success"], json!(false));
        assert!(body.get("data").is_none());
        assert!(!body["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        app.session.lock().await.connect(None).unwrap();

        let (_, body) = get_json(&app, "/api/summary").await;
        assert_eq!(body["success"], json!(true));
        assert!(body["data"]["summary"]
            .as_str()
            .unwrap()
            .contains("Mock Camera"));
    }

    #[tokio::test]
    async fn test_capture_endpoint_requires_connection() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let (_, body) = get_json(&app, "/api/capture").await;
        assert_eq!(body["status"], json!("error"));
    }

    #[tokio::test]
    async fn test_capture_and_photo_download_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        app.session.lock().await.connect(None).unwrap();

        let (_, body) = get_json(&app, "/api/capture").await;
        assert_eq!(body["status"], json!("success"));

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/get_photos")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/jpeg"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_get_photos_without_capture_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/get_photos")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_set_config_applies_scalars_and_skips_nested() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        app.session.lock().await.connect(None).unwrap();

        let payload = json!({
            "config": {
                "iso": "400",
                "profile": {"nested": 1}
            }
        });
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/set-config")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        let results = body.as_object().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results["iso"]["success"], json!(true));
        assert_eq!(app.state.value("iso").as_deref(), Some("400"));
    }

    #[tokio::test]
    async fn test_reset_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        app.session.lock().await.connect(None).unwrap();

        let (_, body) = get_json(&app, "/api/reset").await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["camera_name"], json!("Mock Camera"));
    }
}
