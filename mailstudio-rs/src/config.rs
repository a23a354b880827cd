use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Storage backend selector. Any relational value uses the same adapter
/// with a different connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Mysql,
    Postgresql,
    Embedded,
}

impl StorageBackend {
    pub fn is_embedded(&self) -> bool {
        matches!(self, StorageBackend::Embedded)
    }

    pub fn is_relational(&self) -> bool {
        !self.is_embedded()
    }
}

impl FromStr for StorageBackend {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "mysql" => Ok(StorageBackend::Mysql),
            "postgresql" => Ok(StorageBackend::Postgresql),
            // "indexeddb" is the historical name for the serverless backend.
            "embedded" | "indexeddb" => Ok(StorageBackend::Embedded),
            other => Err(StudioError::Config(format!(
                "unsupported storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Connection string for relational backends, passed through unmodified.
    pub database_url: String,
    /// Data directory for the embedded backend.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` (default) or `compact`.
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StudioError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| StudioError::Config(e.to_string()))
    }

    /// Load `config.toml` when present, otherwise defaults, then apply
    /// `STORAGE_BACKEND` / `DATABASE_URL` environment overrides.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new("config.toml").exists() => Self::from_file("config.toml")?,
            None => Self::default(),
        };

        if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
            config.storage.backend = backend.parse()?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.storage.database_url = url;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                database_url: "sqlite://mailstudio.db?mode=rwc".to_string(),
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
