use std::path::PathBuf;
use thiserror::Error;

use crate::infra::tmdb;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set when STORAGE_MODE=turso")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageMode {
    /// One JSON document on disk.
    File { path: PathBuf },
    /// Local SQLite file through libSQL.
    Local { path: String },
    /// Remote Turso database.
    Turso { url: String, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageMode,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: p,
            })?,
            None => 3001,
        };

        let storage = match get("STORAGE_MODE").as_deref().unwrap_or("file") {
            "file" => StorageMode::File {
                path: get("FAVORITES_PATH")
                    .unwrap_or_else(|| "data/favorites.json".into())
                    .into(),
            },
            "local" | "sqlite" => StorageMode::Local {
                path: get("DATABASE_PATH").unwrap_or_else(|| "data/flix.db".into()),
            },
            "turso" => StorageMode::Turso {
                url: get("TURSO_DATABASE_URL").ok_or(ConfigError::Missing("TURSO_DATABASE_URL"))?,
                token: get("TURSO_AUTH_TOKEN").ok_or(ConfigError::Missing("TURSO_AUTH_TOKEN"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_MODE",
                    value: other.to_string(),
                })
            }
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            port,
            storage,
            tmdb_api_key: get("TMDB_API_KEY"),
            tmdb_base_url: get("TMDB_BASE_URL").unwrap_or_else(|| tmdb::DEFAULT_BASE_URL.into()),
            log_format,
        })
    }
}
