// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILENAME};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Failed to expand path '{template}': {reason}")]
    Expansion { template: String, reason: String },
}

/// Returns the path of the shell configuration file.
///
/// `$ARMSHELL_CONFIG` wins when set and not empty, otherwise the file lives
/// in the user's config directory (`~/.config/armshell/armshell.toml`). The
/// file itself may not exist.
pub fn config_file_path() -> Result<PathBuf, PathError> {
    if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
        if !explicit.trim().is_empty() {
            return expand_path(&explicit);
        }
    }
    let config_dir = dirs::config_dir().ok_or(PathError::ConfigDirNotFound)?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILENAME))
}

/// Expands the home directory (`~`) and environment variables (`$VAR`) in a
/// configured path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
