// src/cli/handlers/commons.rs

// Shared helpers for the handlers.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use crate::{
    constants::{STDIN_SCRIPT_NAME, STDIN_SCRIPT_PATH},
    core::dialect::Dialect,
    system::dialects_config,
};

/// A script's text together with the name diagnostics use for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub name: String,
    pub text: String,
}

/// Reads the script at `path`, or standard input when `path` is `-`.
pub fn read_script(path: &str) -> Result<ScriptSource> {
    if path == STDIN_SCRIPT_PATH {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read the script from standard input")?;
        return Ok(ScriptSource {
            name: STDIN_SCRIPT_NAME.to_string(),
            text,
        });
    }

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read script '{}'", path))?;
    Ok(ScriptSource {
        name: path.to_string(),
        text,
    })
}

/// Finds the dialect called `name`, in `config` when given, else in the user's dialects.
pub fn load_dialect(name: &str, config: Option<&Path>) -> Result<Dialect> {
    let dialects = dialects_config::resolve_dialects_config(config).with_context(|| match config {
        Some(path) => format!("Failed to load dialects from '{}'", path.display()),
        None => "Failed to load the dialects configuration".to_string(),
    })?;
    Ok(dialects_config::find_dialect(&dialects, name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_script_from_file_keeps_its_path_as_name() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "tool xml2ly;").unwrap();
        let path = file.path().to_str().unwrap();

        let source = read_script(path).unwrap();
        assert_eq!(source.name, path);
        assert_eq!(source.text, "tool xml2ly;");
    }

    #[test]
    fn test_read_missing_script_fails() {
        assert!(read_script("/no/such/dir/score.mfsl").is_err());
    }

    #[test]
    fn test_load_dialect_from_explicit_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[dialects.myfront]\ndefault_service = \"xml2brl\"\nknown_services = [\"xml2brl\"]\n"
        )
        .unwrap();

        let dialect = load_dialect("myfront", Some(file.path())).unwrap();
        assert_eq!(dialect.default_service.as_deref(), Some("xml2brl"));
        assert!(load_dialect("mfsl", Some(file.path())).is_err());
    }
}
