use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::bridge::LineSource;
use crate::realtime::DEFAULT_QUEUE_CAPACITY;
use crate::recording::DEFAULT_RECORDING_DURATION;

pub const CONFIG_PATH_ENV: &str = "VITALIS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Events a client may fall behind by before it is disconnected.
    pub client_queue_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            client_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ApiConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("api address {}:{}: {}", self.host, self.port, e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub duration_secs: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        RecordingConfig {
            duration_secs: DEFAULT_RECORDING_DURATION.as_secs(),
        }
    }
}

impl RecordingConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Settings for the `reader` sensor bridge binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub server_url: String,
    /// `-` for stdin, otherwise a device or file path such as `/dev/ttyACM0`.
    pub source: String,
    pub reconnect_secs: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            server_url: "ws://127.0.0.1:5000/ws".to_string(),
            source: "-".to_string(),
            reconnect_secs: 5,
        }
    }
}

impl ReaderConfig {
    pub fn source(&self) -> LineSource {
        LineSource::parse(&self.source)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }
}

impl Config {
    pub fn from_yaml(path: &Path, content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recording.duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "recording.duration_secs must be greater than zero".to_string(),
            ));
        }
        if self.api.client_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "api.client_queue_capacity must be greater than zero".to_string(),
            ));
        }
        self.api.socket_addr()?;

        if !(self.reader.server_url.starts_with("ws://") || self.reader.server_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "reader.server_url must be a ws:// or wss:// URL, got {}",
                self.reader.server_url
            )));
        }
        if self.reader.reconnect_secs == 0 {
            return Err(ConfigError::Invalid(
                "reader.reconnect_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where to look for the config file: `$VITALIS_CONFIG`, else `config.yaml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate configuration. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_yaml(path, &content)
}
