//! # Config Loader
//!
//! Loads the shell configuration (`armshell.toml`). Every section and every
//! field is optional, and a missing file means "all defaults", so a fresh
//! device boots without any configuration at all.
use crate::{core::paths, models::ShellConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] paths::PathError),
    #[error("Could not read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration file '{path}': {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// A configuration and where it came from.
///
/// The configuration is loaded before logging is set up, so the loader does
/// not log. [`LoadedConfig::log_source`] reports the origin once it can.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ShellConfig,
    pub path: PathBuf,
    /// `false` when no file exists at `path` and defaults are used.
    pub from_file: bool,
}

impl LoadedConfig {
    pub fn log_source(&self) {
        if self.from_file {
            log::info!("Configuration loaded from '{}'", self.path.display());
        } else {
            log::info!("No configuration at '{}', using defaults.", self.path.display());
        }
    }
}

/// Loads the configuration from its standard location.
pub fn load() -> Result<LoadedConfig, ConfigError> {
    let path = paths::config_file_path()?;
    load_from(&path)
}

/// Loads the configuration from `path`, falling back to defaults when the
/// file does not exist.
pub fn load_from(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let loaded = read(path)?;
    Ok(LoadedConfig {
        from_file: loaded.is_some(),
        config: loaded.unwrap_or_default(),
        path: path.to_path_buf(),
    })
}

fn read(path: &Path) -> Result<Option<ShellConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: ShellConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config).map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(Some(config))
}

// An idle keypad reads as the empty key set.
fn validate(config: &ShellConfig) -> Result<(), String> {
    if config.supervisor.abort_combo.is_empty() {
        return Err("supervisor.abort_combo needs at least one key".to_string());
    }
    Ok(())
}
