//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve database and log locations with platform defaults.
//! - Apply `HTMLSHELF_*` environment overrides.
//!
//! # Invariants
//! - A missing data directory disables persistence instead of failing.
//! - `log_level` always holds a normalized level name.

use crate::db::DB_FILE_NAME;
use crate::logging::{default_log_level, normalize_level};
use crate::repo::snapshot_repo::{SqliteSnapshotRepository, StorageTarget};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "HTMLSHELF_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "HTMLSHELF_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HTMLSHELF_LOG_DIR";
pub const ENV_PERSISTENCE: &str = "HTMLSHELF_PERSISTENCE";

const APPLICATION: &str = "htmlshelf";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HTMLSHELF_LOG_LEVEL: {0}")]
    InvalidLogLevel(String),
    #[error("HTMLSHELF_LOG_DIR must be an absolute path, got `{0}`")]
    RelativeLogDir(String),
    #[error("HTMLSHELF_PERSISTENCE must be one of on|off|true|false|1|0, got `{0}`")]
    InvalidPersistenceFlag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfConfig {
    /// Snapshot database file; `None` when no location could be resolved.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory; `None` leaves file logging off.
    pub log_dir: Option<PathBuf>,
    pub persistence_enabled: bool,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            db_path: data_dir.as_ref().map(|dir| dir.join(DB_FILE_NAME)),
            log_level: default_log_level().to_string(),
            log_dir: data_dir.map(|dir| dir.join(LOG_DIR_NAME)),
            persistence_enabled: true,
        }
    }
}

impl ShelfConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)
                .map_err(|err| ConfigError::InvalidLogLevel(err.to_string()))?
                .to_string();
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.display().to_string()));
            }
            config.log_dir = Some(dir);
        }
        if let Some(flag) = value(ENV_PERSISTENCE) {
            config.persistence_enabled = parse_flag(&flag)
                .ok_or(ConfigError::InvalidPersistenceFlag(flag))?;
        }

        Ok(config)
    }

    pub fn storage_target(&self) -> StorageTarget {
        match (&self.db_path, self.persistence_enabled) {
            (Some(path), true) => StorageTarget::File(path.clone()),
            _ => StorageTarget::Unavailable,
        }
    }

    /// Repository for the configured target; nothing is opened yet.
    pub fn repository(&self) -> SqliteSnapshotRepository {
        SqliteSnapshotRepository::new(self.storage_target())
    }
}

/// Platform data directory for the application, if one exists.
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.data_dir().to_path_buf())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}
