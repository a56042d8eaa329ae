// src/models.rs

use crate::core::options_block::is_flag;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

// --- SCRIPT MODELS ---

/// One command-line option registered by a script: a flag and its optional value.
///
/// The flag is kept verbatim (leading dash included), so it can be replayed
/// into the service's command line as written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionEntry {
    pub flag: String,
    pub value: Option<String>,
}

impl OptionEntry {
    /// Creates an option with a value, e.g. `-title "Der Lindenbaum"`.
    pub fn new(flag: impl Into<String>, value: Option<String>) -> Self {
        Self {
            flag: flag.into(),
            value,
        }
    }

    /// Creates a value-less option, e.g. `-landscape`.
    pub fn flag(flag: impl Into<String>) -> Self {
        Self::new(flag, None)
    }

    /// Renders the option the way it must appear on a command line.
    /// Values are shell-quoted when they need it, so that the result can be
    /// split back into the same flag/value pair. A value that looks like a flag
    /// (`-x`) is always quoted: only unquoted words are read back as flags.
    pub fn as_command_line(&self) -> String {
        match &self.value {
            Some(value) => {
                let quoted = shlex::try_quote(value).unwrap_or(Cow::Borrowed(value.as_str()));
                if is_flag(value) && quoted == value.as_str() {
                    format!("{} '{}'", self.flag, value)
                } else {
                    format!("{} {}", self.flag, quoted)
                }
            }
            None => self.flag.clone(),
        }
    }
}

impl fmt::Display for OptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_command_line())
    }
}

/// The two flavours of named enumerable variants a script can declare.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Mutually exclusive labels, e.g. `choice target { pdf, xml }`.
    Choice,
    /// Alternative substitution names, e.g. `input voices { soprano, alto }`.
    Input,
}

impl VariantKind {
    /// The noun used for the members of this kind of variant in messages.
    pub fn member_noun(self) -> &'static str {
        match self {
            Self::Choice => "label",
            Self::Input => "name",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice => f.write_str("choice"),
            Self::Input => f.write_str("input"),
        }
    }
}

/// Provenance of the selection made for a choice or input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Unset,
    SetByCliOption,
    SetInScript,
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unset => "unset",
            Self::SetByCliOption => "set by a command-line option",
            Self::SetInScript => "set in the script",
        };
        f.write_str(s)
    }
}

// --- RUN RESULT ---

/// The single error indicator returned by a script run, mapped to the process exit code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicFormatsErrorKind {
    #[default]
    None,
    /// At least one launched service exited unsuccessfully.
    InvalidFile,
    /// The host command line could not be honoured.
    InvalidOption,
}

impl MusicFormatsErrorKind {
    /// The process exit code for this error kind.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::InvalidFile => 2,
            Self::InvalidOption => 3,
        }
    }

    pub fn is_error(self) -> bool {
        self != Self::None
    }
}

// --- `dialects.toml` MODELS ---

/// The description of one scripting dialect, as found in `dialects.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DialectConfig {
    pub description: Option<String>,
    /// The service launched when the script does not name one.
    pub default_service: Option<String>,
    #[serde(default)]
    pub known_services: Vec<String>,
    /// How the command-line select option is spelled in diagnostics.
    #[serde(default = "default_select_option_spelling")]
    pub select_option: String,
}

fn default_select_option_spelling() -> String {
    "--select, -s".to_string()
}

/// Represents the deserialized structure of a `dialects.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DialectsConfig {
    #[serde(default)]
    pub dialects: BTreeMap<String, DialectConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_entry_quotes_values_with_spaces() {
        let option = OptionEntry::new("-title", Some("Der Lindenbaum".to_string()));
        assert_eq!(option.as_command_line(), "-title 'Der Lindenbaum'");
    }

    #[test]
    fn test_option_entry_quotes_flag_like_values() {
        let option = OptionEntry::new("-title", Some("-x".to_string()));
        assert_eq!(option.as_command_line(), "-title '-x'");
        let negative = OptionEntry::new("-transpose", Some("-2".to_string()));
        assert_eq!(negative.as_command_line(), "-transpose -2");
    }

    #[test]
    fn test_option_entry_without_value_is_just_the_flag() {
        assert_eq!(OptionEntry::flag("-landscape").as_command_line(), "-landscape");
    }

    #[test]
    fn test_plain_values_are_not_quoted() {
        let option = OptionEntry::new("-global-staff-size", Some("25.5".to_string()));
        assert_eq!(option.as_command_line(), "-global-staff-size 25.5");
    }

    #[test]
    fn test_error_kind_exit_codes() {
        assert_eq!(MusicFormatsErrorKind::None.exit_code(), 0);
        assert!(!MusicFormatsErrorKind::None.is_error());
        assert_ne!(MusicFormatsErrorKind::InvalidFile.exit_code(), 0);
    }

    #[test]
    fn test_dialect_config_rejects_unknown_fields() {
        let toml_str = r#"
            known_service = ["xml2ly"] # Typo: should be `known_services`
        "#;
        let result: Result<DialectConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err(), "Should fail due to unknown field");
    }
}
