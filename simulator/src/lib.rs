use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use tracing::{warn, Level};
use wager_execution::Store;
use wager_types::casino::DEFAULT_TICK_INTERVAL_MS;

/// Configuration for the simulator, usually read from a YAML file.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
}

#[derive(Debug)]
pub struct ValidatedConfig {
    pub state_dir: PathBuf,
    pub seed: Option<u64>,
    pub tick_interval: Duration,
    pub log_level: Level,
}

fn default_state_dir() -> String {
    ".wager".to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "tick_interval_ms",
                value: self.tick_interval_ms,
            });
        }
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            state_dir: PathBuf::from(self.state_dir),
            seed: self.seed,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            log_level,
        })
    }
}

/// Keeps each key in its own file under a directory.
///
/// I/O failures are logged and otherwise ignored: a missing or unreadable
/// file loads as absent, and a failed write leaves the previous value.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete every stored key.
    pub fn clear(&self, keys: &[&str]) {
        for key in keys {
            match fs::remove_file(self.dir.join(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {:?}", key, e),
            }
        }
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {:?}", key, e);
                None
            }
        }
    }

    fn save(&mut self, key: &str, value: String) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Failed to create {}: {:?}", self.dir.display(), e);
            return;
        }
        if let Err(e) = fs::write(self.dir.join(key), value) {
            warn!("Failed to write {}: {:?}", key, e);
        }
    }
}
