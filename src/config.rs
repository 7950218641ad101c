use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use portaria_core::sync::DEFAULT_REFRESH_DELAY;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local visitor state
    pub data_dir: ConfigValue<PathBuf>,
    /// Spreadsheet webhook; when unset the URL saved with
    /// `config set-webhook` is used
    pub webhook_url: ConfigValue<Option<String>>,
    /// OCR endpoint for document scans
    pub ocr_url: ConfigValue<Option<String>>,
    /// Delay between a push and its follow-up pull, in milliseconds
    pub refresh_delay_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    webhook_url: Option<String>,
    ocr_url: Option<String>,
    refresh_delay_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut webhook_url = ConfigValue::new(None, ConfigSource::Default);
        let mut ocr_url = ConfigValue::new(None, ConfigSource::Default);
        let mut refresh_delay_ms = ConfigValue::new(
            DEFAULT_REFRESH_DELAY.as_millis() as u64,
            ConfigSource::Default,
        );
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.webhook_url {
                webhook_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(url) = file_config.ocr_url {
                ocr_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(ms) = file_config.refresh_delay_ms {
                refresh_delay_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("PORTARIA_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("PORTARIA_WEBHOOK_URL") {
            webhook_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("PORTARIA_OCR_URL") {
            ocr_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Ok(ms) = std::env::var("PORTARIA_REFRESH_DELAY_MS") {
            let ms = ms
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORTARIA_REFRESH_DELAY_MS", ms))?;
            refresh_delay_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        Ok(Self {
            data_dir,
            webhook_url,
            ocr_url,
            refresh_delay_ms,
            config_file,
        })
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/portaria/
    /// - macOS: ~/Library/Application Support/portaria/
    /// - Windows: %APPDATA%/portaria/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portaria")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/portaria/
    /// - macOS: ~/Library/Application Support/portaria/
    /// - Windows: %APPDATA%/portaria/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portaria")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
