// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, DIALECTS_CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref MFSCRIPT_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not expand '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// Returns the path to the mfscript configuration directory (`~/.config/mfscript`).
/// Creates it if it doesn't exist.
///
/// This function is memoized: the first call computes and caches the path,
/// subsequent calls return the cached value.
pub fn get_mfscript_config_dir() -> Result<PathBuf, PathError> {
    let mut cached_path_guard = MFSCRIPT_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached_path_guard {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached_path_guard = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to the `dialects.toml` file in the configuration directory.
pub fn get_dialects_config_path() -> Result<PathBuf, PathError> {
    get_mfscript_config_dir().map(|dir| dir.join(DIALECTS_CONFIG_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in an input source.
/// Services are spawned without a shell, so nothing else would expand them.
pub fn expand_input_source(template: &str) -> Result<String, PathError> {
    shellexpand::full(template)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| PathError::Expansion {
            template: template.to_string(),
            message: e.to_string(),
        })
}
