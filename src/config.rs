use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quiet period before a note edit is saved.
pub const DEFAULT_NOTE_DEBOUNCE_MS: u64 = 1000;

const ENV_DATA_DIR: &str = "DIARY_DATA_DIR";
const ENV_NOTE_DEBOUNCE_MS: &str = "DIARY_NOTE_DEBOUNCE_MS";
const ENV_SERVER_URL: &str = "DIARY_SERVER_URL";
const ENV_API_KEY: &str = "DIARY_API_KEY";

/// Where a setting's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A setting together with the layer that supplied it
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Remote diary API settings. Without both fields the diary runs as a guest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Base URL of the diary API (e.g., "http://localhost:3000/api")
    pub server_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

/// Resolved settings for the `diary` binary.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding guest diary entries
    pub data_dir: ConfigValue<PathBuf>,
    pub note_debounce_ms: ConfigValue<u64>,
    /// The YAML file that was read, if one existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileLayer {
    data_dir: Option<PathBuf>,
    note_debounce_ms: Option<u64>,
    remote: Option<RemoteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: ConfigValue::new(Self::default_data_dir(), ConfigSource::Default),
            note_debounce_ms: ConfigValue::new(DEFAULT_NOTE_DEBOUNCE_MS, ConfigSource::Default),
            config_file: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Layers defaults, then the YAML file, then `DIARY_*` environment variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            config.merge_file(&path)?;
        }
        config.merge_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(path.into(), e))?;
        let layer: FileLayer =
            serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseError(path.into(), e))?;

        if let Some(dir) = layer.data_dir {
            let dir = match path.parent() {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir,
            };
            self.data_dir.set(dir, ConfigSource::File);
        }
        if let Some(ms) = layer.note_debounce_ms {
            self.note_debounce_ms.set(ms, ConfigSource::File);
        }
        if let Some(remote) = layer.remote {
            self.remote = remote;
        }
        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    fn merge_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(dir) = var(ENV_DATA_DIR) {
            self.data_dir.set(dir.into(), ConfigSource::Environment);
        }
        if let Some(raw) = var(ENV_NOTE_DEBOUNCE_MS) {
            let ms = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_NOTE_DEBOUNCE_MS, raw.clone()))?;
            self.note_debounce_ms.set(ms, ConfigSource::Environment);
        }
        if let Some(url) = var(ENV_SERVER_URL) {
            self.remote.server_url = Some(url);
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.remote.api_key = Some(key);
        }
        Ok(())
    }

    pub fn note_debounce(&self) -> Duration {
        Duration::from_millis(self.note_debounce_ms.value)
    }

    /// `dietdiary` under the platform config directory, or `./dietdiary`.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dietdiary")
    }

    /// `dietdiary` under the platform data directory, or `./dietdiary`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dietdiary")
    }

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
                write!(f, "Cannot read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Invalid YAML in config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "{} is not a valid number: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
