//! Process configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - The database path and the log directory always resolve.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "BOOKSHELF_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "BOOKSHELF_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "BOOKSHELF_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "bookshelf.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "bookshelf-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but not valid unicode.
    NotUnicode(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotUnicode(name) => write!(f, "environment variable `{name}` is not valid unicode"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for a bookshelf process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookshelfConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for BookshelfConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl BookshelfConfig {
    /// Reads `BOOKSHELF_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(std::env::var)
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<String, std::env::VarError>,
    ) -> Result<Self, ConfigError> {
        let read = |name: &'static str| match lookup(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value.trim().to_string())),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV)? {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV)? {
            config.log_level = level;
        }
        if let Some(dir) = read(LOG_DIR_ENV)? {
            config.log_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{BookshelfConfig, ConfigError, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::env::VarError;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn lookup(
        vars: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&'static str) -> Result<String, VarError> {
        move |name| {
            vars.get(name)
                .map(|value| value.to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn unset_environment_uses_defaults() {
        let config = BookshelfConfig::from_lookup(lookup(HashMap::new())).unwrap();
        assert_eq!(config, BookshelfConfig::default());
        assert!(config.db_path.ends_with("bookshelf.sqlite3"));
        assert_eq!(config.log_dir, std::env::temp_dir().join("bookshelf-logs"));
    }

    #[test]
    fn variables_override_defaults_and_blank_means_unset() {
        let vars = HashMap::from([
            (DB_PATH_ENV, " /srv/books.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "  "),
        ]);
        let config = BookshelfConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/books.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, BookshelfConfig::default().log_dir);
    }

    #[test]
    fn log_dir_variable_replaces_default_directory() {
        let vars = HashMap::from([(LOG_DIR_ENV, "/var/log/bookshelf")]);
        let config = BookshelfConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/bookshelf"));
    }

    #[test]
    fn non_unicode_value_is_reported() {
        let err = BookshelfConfig::from_lookup(|_| Err(VarError::NotUnicode(OsString::new())))
            .unwrap_err();
        assert_eq!(err, ConfigError::NotUnicode(DB_PATH_ENV));
    }
}
