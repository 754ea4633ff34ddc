//! Application-level configuration loading: listener, CORS, stream tuning and storage backend.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_CONFIG_PATH";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 15;
const DEFAULT_DATA_DIR: &str = "data";

/// Where the team list and match data are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Keep everything in memory for the lifetime of the process.
    Memory,
    /// Two JSON files inside `dir`.
    File {
        #[serde(default = "default_data_dir")]
        dir: PathBuf,
    },
    /// MongoDB collection (`mongo-store` feature).
    Mongo {
        uri: String,
        #[serde(default)]
        database: Option<String>,
    },
    /// CouchDB database (`couch-store` feature).
    Couch {
        base_url: String,
        database: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    port: u16,
    allowed_origin: Option<String>,
    subscriber_buffer: usize,
    keep_alive_secs: u64,
    storage: StorageConfig,
}

impl AppConfig {
    /// Load the configuration from disk, then apply `PORT` and `DATA_DIR`
    /// environment overrides. Falls back to built-in defaults when the file is
    /// missing or invalid.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_overrides(
            env::var("PORT").ok().as_deref(),
            env::var_os("DATA_DIR").map(PathBuf::from),
        )
    }

    /// Parse a configuration document. Absent keys take their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Apply a port override and a data directory override for file storage.
    pub fn with_overrides(mut self, port: Option<&str>, data_dir: Option<PathBuf>) -> Self {
        if let Some(raw) = port {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = raw, error = %err, "ignoring invalid PORT"),
            }
        }

        if let Some(dir) = data_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            match &mut self.storage {
                StorageConfig::File { dir: current } => *current = dir,
                other => warn!(storage = ?other, "DATA_DIR ignored for non-file storage"),
            }
        }

        self
    }

    /// Override the storage backend.
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// TCP port to listen on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Single origin allowed by CORS, or `None` for a permissive policy.
    pub fn allowed_origin(&self) -> Option<&str> {
        self.allowed_origin.as_deref()
    }

    /// Queue capacity of each subscriber channel (at least one).
    pub fn subscriber_buffer(&self) -> usize {
        self.subscriber_buffer.max(1)
    }

    /// SSE keep-alive interval; `None` when set to zero.
    pub fn keep_alive(&self) -> Option<Duration> {
        (self.keep_alive_secs > 0).then(|| Duration::from_secs(self.keep_alive_secs))
    }

    /// Persistence backend selection.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: u16,
    allowed_origin: Option<String>,
    subscriber_buffer: usize,
    keep_alive_secs: u64,
    storage: StorageConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origin: None,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            storage: StorageConfig::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            port: value.port,
            allowed_origin: value.allowed_origin.filter(|origin| !origin.is_empty()),
            subscriber_buffer: value.subscriber_buffer,
            keep_alive_secs: value.keep_alive_secs,
            storage: value.storage,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_5000_with_file_storage() {
        let config = AppConfig::default();
        assert_eq!(config.port(), 5000);
        assert_eq!(config.allowed_origin(), None);
        assert_eq!(config.subscriber_buffer(), 16);
        assert_eq!(config.keep_alive(), Some(Duration::from_secs(15)));
        assert_eq!(
            config.storage(),
            &StorageConfig::File {
                dir: PathBuf::from("data")
            }
        );
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = AppConfig::from_json(
            r#"{"allowed_origin": "https://example.org", "keep_alive_secs": 0, "storage": {"kind": "memory"}}"#,
        )
        .unwrap();

        assert_eq!(config.port(), 5000);
        assert_eq!(config.allowed_origin(), Some("https://example.org"));
        assert_eq!(config.keep_alive(), None);
        assert_eq!(config.storage(), &StorageConfig::Memory);
    }

    #[test]
    fn mongo_storage_parses() {
        let config = AppConfig::from_json(
            r#"{"storage": {"kind": "mongo", "uri": "mongodb://db:27017"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.storage(),
            &StorageConfig::Mongo {
                uri: "mongodb://db:27017".into(),
                database: None
            }
        );
    }

    #[test]
    fn overrides_apply_port_and_data_dir() {
        let config = AppConfig::default()
            .with_overrides(Some("8081"), Some(PathBuf::from("/var/lib/courtside")));
        assert_eq!(config.port(), 8081);
        assert_eq!(
            config.storage(),
            &StorageConfig::File {
                dir: PathBuf::from("/var/lib/courtside")
            }
        );
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let config = AppConfig::default().with_overrides(Some("not-a-port"), None);
        assert_eq!(config.port(), 5000);
    }

    #[test]
    fn zero_buffer_is_raised_to_one() {
        let config = AppConfig::from_json(r#"{"subscriber_buffer": 0}"#).unwrap();
        assert_eq!(config.subscriber_buffer(), 1);
    }
}
