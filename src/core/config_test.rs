//! Configuration unit tests

#[cfg(test)]
mod tests {
    use crate::core::config::{AppConfig, TEST_CONFIG_ENV_LOCK};
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
        assert_eq!(
            config.download.preferred_format.as_deref(),
            Some("best")
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.download.output_directory = std::path::PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.extractor.info_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.extractor.socket_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn watchdog_duration_honors_disable_sentinel() {
        let mut config = AppConfig::default();
        config.download.max_download_seconds = 0;
        assert!(config.max_download_duration().is_none());

        config.download.max_download_seconds = 120;
        assert_eq!(
            config.max_download_duration(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let _lock = TEST_CONFIG_ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::env::set_var("VIDEO_DOWNLOADER_CONFIG", &path);

        let mut config = AppConfig::default();
        config.server.port = 8080;
        config.download.output_directory = dir.path().join("media");
        config.save().unwrap();

        let loaded = AppConfig::load().unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.download.output_directory, dir.path().join("media"));

        std::env::remove_var("VIDEO_DOWNLOADER_CONFIG");
    }

    #[test]
    fn load_creates_default_file_when_missing() {
        let _lock = TEST_CONFIG_ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        std::env::set_var("VIDEO_DOWNLOADER_CONFIG", &path);

        let loaded = AppConfig::load().unwrap();
        assert!(path.exists());
        assert_eq!(loaded.server.port, AppConfig::default().server.port);

        std::env::remove_var("VIDEO_DOWNLOADER_CONFIG");
    }
}
