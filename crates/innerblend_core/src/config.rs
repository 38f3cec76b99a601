//! Core configuration.
//!
//! # Responsibility
//! - Read the optional TOML config file and fill every missing key with a default.
//! - Resolve default locations for the database and log directory.
//!
//! # Invariants
//! - A missing config file is not an error; a malformed one is.

use crate::model::image::ImagePolicy;
use directories::BaseDirs;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "innerblend";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "innerblend.db";

/// Error for config loading.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: Option<PathBuf>, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "reading {}: {source}", path.display()),
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "parsing {}: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "parsing config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

/// `[database]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; defaults to `{data_dir}/innerblend/innerblend.db`.
    pub path: Option<PathBuf>,
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Defaults to `debug` in debug builds and `info` in release builds.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; defaults to
    /// `{data_dir}/innerblend/logs`.
    pub dir: Option<PathBuf>,
}

/// Full configuration for hosts embedding the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub images: ImagePolicy,
}

impl CoreConfig {
    /// Loads `explicit` when given, else the default config file when it
    /// exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse_str(&raw).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path),
                message,
            },
            other => other,
        })
    }

    /// Parses TOML text; absent keys take their defaults.
    pub fn parse_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(raw).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })
    }

    /// Configured database path or the per-user default.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| app_data_dir().join(DB_FILE_NAME))
    }

    /// Configured log directory or the per-user default.
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .dir
            .clone()
            .unwrap_or_else(|| app_data_dir().join("logs"))
    }
}

/// `{config_dir}/innerblend/config.toml`
/// - Linux:   `$XDG_CONFIG_HOME/innerblend/config.toml` or `~/.config/innerblend/config.toml`
/// - macOS:   `~/Library/Application Support/innerblend/config.toml`
/// - Windows: `%APPDATA%\innerblend\config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.config_dir().join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn app_data_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(base) => base.data_dir().join(APP_DIR_NAME),
        None => std::env::temp_dir().join(APP_DIR_NAME),
    }
}
