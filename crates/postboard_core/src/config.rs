//! Process configuration for embedding the DAL.
//!
//! Values come from `POSTBOARD_*` environment variables; anything unset or
//! blank falls back to defaults.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "POSTBOARD_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "POSTBOARD_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "POSTBOARD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostboardConfig {
    /// SQLite file; `None` opens a private in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rotated log files; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for PostboardConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl PostboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(DB_PATH_VAR).map(PathBuf::from),
            log_level: read(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
        }
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match self.log_dir.as_ref() {
            Some(dir) => init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }

    /// Opens the configured store with migrations applied.
    pub fn open_store(&self) -> DbResult<Connection> {
        match self.db_path.as_ref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PostboardConfig, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = PostboardConfig::from_lookup(|_| None);
        assert_eq!(config, PostboardConfig::default());
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn values_are_trimmed_and_blank_values_ignored() {
        let config = PostboardConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, " /tmp/postboard.db "),
            (LOG_LEVEL_VAR, "   "),
            (LOG_DIR_VAR, "/var/log/postboard"),
        ]));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/postboard.db")));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/postboard")));
    }

    #[test]
    fn logging_stays_off_without_directory() {
        let config = PostboardConfig::default();
        assert!(!config.init_logging().unwrap());
    }

    #[test]
    fn open_store_without_path_is_in_memory() {
        let config = PostboardConfig::default();
        let conn = config.open_store().unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }
}
