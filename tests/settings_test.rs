#[cfg(test)]
mod settings_tests {
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tethercam::config::AppConfig;
    use tethercam::errors::ErrorKind;
    use tethercam::session::CameraSession;
    use tethercam::settings::SettingsService;
    use tethercam::testing::{MockBackend, MockState};
    use tokio::sync::Mutex;

    async fn connected_service() -> (SettingsService, Arc<MockState>) {
        let backend = MockBackend::new();
        let state = backend.state();
        let mut session = CameraSession::with_backend(Box::new(backend), AppConfig::default());
        session.connect(None).expect("mock connect should succeed");
        let session = Arc::new(Mutex::new(session));
        (SettingsService::new(session), state)
    }

    fn disconnected_service() -> SettingsService {
        let session = CameraSession::with_backend(
            Box::new(MockBackend::new()),
            AppConfig::default(),
        );
        SettingsService::new(Arc::new(Mutex::new(session)))
    }

    #[tokio::test]
    async fn test_get_value_requires_connection() {
        let service = disconnected_service();
        let error = service.get_value("iso").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_get_value_reads_device_value() {
        let (service, _) = connected_service().await;
        assert_eq!(service.get_value("iso").await.unwrap(), "Auto");
        assert_eq!(service.get_value("shutterspeed").await.unwrap(), "1/125");
    }

    #[tokio::test]
    async fn test_get_value_unknown_setting() {
        let (service, _) = connected_service().await;
        let error = service.get_value("bokeh-dial").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::SettingNotFound);
        assert!(error.message.contains("bokeh-dial"));
    }

    #[tokio::test]
    async fn test_get_multiple_reports_partial_failure() {
        let (service, _) = connected_service().await;
        let results = service.get_multiple(&["iso", "aperture-ring"]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results["iso"].as_deref().unwrap(), "Auto");
        let error = results["aperture-ring"].as_ref().unwrap_err();
        assert_eq!(error.kind, ErrorKind::SettingNotFound);
    }

    #[tokio::test]
    async fn test_set_value_applies_valid_choice() {
        let (service, state) = connected_service().await;
        service.set_value("whitebalance", "Daylight").await.unwrap();
        assert_eq!(state.value("whitebalance").as_deref(), Some("Daylight"));
        assert_eq!(service.get_value("whitebalance").await.unwrap(), "Daylight");
    }

    #[tokio::test]
    async fn test_set_value_coerces_invalid_choice_to_first() {
        let (service, state) = connected_service().await;
        // 99999 is not a device-reported ISO choice; the write still succeeds
        // with the first valid choice.
        service.set_value("iso", "99999").await.unwrap();
        assert_eq!(state.value("iso").as_deref(), Some("Auto"));
    }

    #[tokio::test]
    async fn test_set_value_text_setting_accepts_anything() {
        let (service, state) = connected_service().await;
        service.set_value("artist", "J. Doe").await.unwrap();
        assert_eq!(state.value("artist").as_deref(), Some("J. Doe"));
    }

    #[tokio::test]
    async fn test_set_value_unknown_setting() {
        let (service, state) = connected_service().await;
        let error = service.set_value("bokeh-dial", "on").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::SettingNotFound);
        assert_eq!(
            state.config_writes.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_set_multiple_skips_nested_values() {
        let (service, state) = connected_service().await;

        let mut settings = BTreeMap::new();
        settings.insert("iso".to_string(), json!("400"));
        settings.insert("profile".to_string(), json!({"nested": 1}));
        settings.insert("tags".to_string(), json!(["a", "b"]));

        let results = service.set_multiple(&settings).await;

        // Only the scalar entry is attempted; nested values are absent from
        // the result map entirely, not reported as failures.
        assert_eq!(results.len(), 1);
        assert!(results["iso"].is_ok());
        assert!(!results.contains_key("profile"));
        assert!(!results.contains_key("tags"));
        assert_eq!(state.value("iso").as_deref(), Some("400"));
    }

    #[tokio::test]
    async fn test_set_multiple_reports_per_key_outcomes() {
        let (service, _) = connected_service().await;

        let mut settings = BTreeMap::new();
        settings.insert("iso".to_string(), json!(800));
        settings.insert("bokeh-dial".to_string(), json!("on"));

        let results = service.set_multiple(&settings).await;
        assert!(results["iso"].is_ok());
        assert_eq!(
            results["bokeh-dial"].as_ref().unwrap_err().kind,
            ErrorKind::SettingNotFound
        );
    }

    #[tokio::test]
    async fn test_startup_settings_applied_when_connected() {
        let backend = MockBackend::new();
        let state = backend.state();
        let mut config = AppConfig::default();
        config
            .camera
            .startup_settings
            .insert("whitebalance".to_string(), json!("Cloudy"));

        let mut session = CameraSession::with_backend(Box::new(backend), config.clone());
        session.connect(None).unwrap();
        let service = SettingsService::new(Arc::new(Mutex::new(session)));

        service.apply_startup_settings(&config).await;
        assert_eq!(state.value("whitebalance").as_deref(), Some("Cloudy"));
    }

    #[tokio::test]
    async fn test_startup_settings_skipped_when_disconnected() {
        let backend = MockBackend::new();
        let state = backend.state();
        let mut config = AppConfig::default();
        config
            .camera
            .startup_settings
            .insert("whitebalance".to_string(), json!("Cloudy"));

        let session = CameraSession::with_backend(Box::new(backend), config.clone());
        let service = SettingsService::new(Arc::new(Mutex::new(session)));

        service.apply_startup_settings(&config).await;
        assert_eq!(
            state.config_writes.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }
}
