//! Startup configuration, read once per process.
//!
//! # Responsibility
//! - Resolve store location, logging setup and one-shot seed/dump actions
//!   from the environment.
//!
//! # Invariants
//! - `StartupConfig::global()` reads the environment at most once; later
//!   environment changes are not observed.
//! - Blank variables behave as unset.

use crate::logging::{default_log_level, normalize_level};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Store file path. Defaults to `<temp_dir>/shoplist.sqlite3`.
pub const DB_PATH_ENV: &str = "SHOPLIST_DB_PATH";
/// One of `trace|debug|info|warn|error`.
pub const LOG_LEVEL_ENV: &str = "SHOPLIST_LOG_LEVEL";
/// Absolute directory for rolling log files; logging stays off when unset.
pub const LOG_DIR_ENV: &str = "SHOPLIST_LOG_DIR";
/// Directory holding seed documents, imported into an unseeded store.
pub const SEED_DIR_ENV: &str = "SHOPLIST_SEED_DIR";
/// Directory receiving a dump of the store at startup.
pub const DUMP_DIR_ENV: &str = "SHOPLIST_DUMP_DIR";

const DEFAULT_DB_FILE_NAME: &str = "shoplist.sqlite3";

static STARTUP_CONFIG: OnceCell<StartupConfig> = OnceCell::new();

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
            Self::RelativeLogDir(value) => {
                write!(f, "{LOG_DIR_ENV} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
    pub seed_dir: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
}

impl StartupConfig {
    /// Resolves settings through `lookup`, which maps variable names to
    /// values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| read_var(&lookup, name);

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(value) => normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = match read(LOG_DIR_ENV) {
            Some(value) if !Path::new(&value).is_absolute() => {
                return Err(ConfigError::RelativeLogDir(value));
            }
            other => other.map(PathBuf::from),
        };

        Ok(Self {
            db_path: Self::db_path_from_lookup(&lookup),
            log_level,
            log_dir,
            seed_dir: read(SEED_DIR_ENV).map(PathBuf::from),
            dump_dir: read(DUMP_DIR_ENV).map(PathBuf::from),
        })
    }

    /// Resolves only the store path; other variables are not read.
    pub fn db_path_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        read_var(&lookup, DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }

    /// Store path from the process environment, independent of logging
    /// and seed settings.
    pub fn db_path_from_env() -> PathBuf {
        Self::db_path_from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Process-wide settings, read from the environment on first call.
    pub fn global() -> Result<&'static StartupConfig, ConfigError> {
        STARTUP_CONFIG.get_or_try_init(Self::from_env)
    }
}

fn read_var(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
