use std::{fs, path::Path};

use crate::{
    core::{
        dialect::{Dialect, builtin_dialects},
        paths::{self, PathError},
    },
    models::DialectsConfig,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not find mfscript config directory: {0}")]
    ConfigDir(#[from] PathError),
    #[error("Failed to parse dialects.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize dialects config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Dialect '{0}' is not defined, known dialects are: {1}")]
    DialectNotDefined(String, String),
}

/// Loads the dialects from `path`, which must exist.
pub fn load_dialects_config_from(path: &Path) -> Result<DialectsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Loads `dialects.toml` from the config directory, writing the built-in one first
/// when the file does not exist.
pub fn load_dialects_config() -> Result<DialectsConfig, ConfigError> {
    let dialects_path = paths::get_dialects_config_path()?;
    if !dialects_path.exists() {
        let default_config = builtin_dialects();
        let toml_string = toml::to_string_pretty(&default_config)?;
        fs::write(&dialects_path, toml_string)?;
        log::debug!("Wrote default dialects to '{}'", dialects_path.display());
        Ok(default_config)
    } else {
        load_dialects_config_from(&dialects_path)
    }
}

/// Picks the dialects to use: an explicit file, the user's file, or the built-ins.
pub fn resolve_dialects_config(explicit: Option<&Path>) -> Result<DialectsConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_dialects_config_from(path);
    }
    match load_dialects_config() {
        Err(ConfigError::ConfigDir(e)) => {
            log::debug!("{}, using the built-in dialects", e);
            Ok(builtin_dialects())
        }
        other => other,
    }
}

/// Looks up the dialect called `name`.
pub fn find_dialect(config: &DialectsConfig, name: &str) -> Result<Dialect, ConfigError> {
    config
        .dialects
        .get(name)
        .map(|dialect_config| Dialect::from_config(name, dialect_config))
        .ok_or_else(|| {
            ConfigError::DialectNotDefined(
                name.to_string(),
                config.dialects.keys().cloned().collect::<Vec<_>>().join(", "),
            )
        })
}
