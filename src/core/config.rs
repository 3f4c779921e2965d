//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serializes tests that redirect the config path through the
/// `VIDEO_DOWNLOADER_CONFIG` environment variable.
#[cfg(test)]
pub(crate) static TEST_CONFIG_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub download: DownloadConfig,
    pub extractor: ExtractorConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Download-related configuration, updatable at runtime via the settings API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded media is written to and listed from.
    pub output_directory: PathBuf,
    /// Preferred format id preselected by the frontend ("best" by default).
    pub preferred_format: Option<String>,
    /// Watchdog: force-fail a download running longer than this. 0 disables.
    pub max_download_seconds: u64,
}

/// yt-dlp invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Explicit path to the yt-dlp binary; discovered from well-known
    /// locations and PATH when unset.
    pub binary_path: Option<PathBuf>,
    /// Timeout for metadata queries, seconds.
    pub info_timeout_secs: u64,
    pub socket_timeout_secs: u64,
    pub retries: u32,
    pub fragment_retries: u32,
    pub user_agent: String,
    pub referer: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            download: DownloadConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("downloads"),
            preferred_format: Some("best".to_string()),
            max_download_seconds: 4 * 60 * 60,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            info_timeout_secs: 30,
            socket_timeout_secs: 60,
            retries: 5,
            fragment_retries: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referer: "https://www.google.com/".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::debug!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }

        if self.download.output_directory.as_os_str().is_empty() {
            anyhow::bail!("download.output_directory cannot be empty");
        }

        if self.extractor.info_timeout_secs == 0 {
            anyhow::bail!("extractor.info_timeout_secs must be greater than 0");
        }

        if self.extractor.socket_timeout_secs == 0 {
            anyhow::bail!("extractor.socket_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Resolve the platform-specific config file path
    fn get_config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("VIDEO_DOWNLOADER_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let project_dirs = ProjectDirs::from("com", "videodownloader", "video-downloader-web")
            .context("Failed to determine config directory")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Listen address string for the HTTP server
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Watchdog duration, or `None` when disabled
    pub fn max_download_duration(&self) -> Option<std::time::Duration> {
        match self.download.max_download_seconds {
            0 => None,
            seconds => Some(std::time::Duration::from_secs(seconds)),
        }
    }
}
