// src/core/options_block.rs

use crate::models::OptionEntry;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsStringError {
    #[error("Options string could not be tokenized: {0}")]
    Tokenize(String),
    #[error("Value '{0}' does not follow any option flag")]
    DanglingValue(String),
}

/// An ordered, named group of command-line options.
///
/// Insertion order is significant: the options are replayed verbatim, in the order
/// the script registered them, into the command line of the launched service.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsBlock {
    name: String,
    options: Vec<OptionEntry>,
}

impl OptionsBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &[OptionEntry] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Appends an option at the end of the block.
    pub fn register_option(&mut self, option: OptionEntry) {
        log::trace!("Registering option [{}] in options block \"{}\"", option, self.name);
        self.options.push(option);
    }

    /// Appends all the options of `other`, in order, after this block's own options.
    pub fn enrich_with(&mut self, other: &Self) {
        log::debug!(
            "Enriching options block \"{}\" ({}) with the contents of \"{}\" ({})",
            self.name,
            singular_or_plural(self.len(), "option", "options"),
            other.name,
            singular_or_plural(other.len(), "option", "options"),
        );
        self.options.extend(other.options.iter().cloned());
    }

    /// Renders the options space-separated, each in its command-line form.
    pub fn as_options_string(&self) -> String {
        self.options
            .iter()
            .map(OptionEntry::as_command_line)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rebuilds a block from the output of [`as_options_string`](Self::as_options_string).
    ///
    /// A word is a flag when it is written unquoted as a dash followed by a letter;
    /// the word after a flag is that flag's value unless it is itself a flag.
    pub fn from_options_string(name: impl Into<String>, s: &str) -> Result<Self, OptionsStringError> {
        let mut block = Self::new(name);
        let mut words = shell_words(s)?.into_iter().peekable();

        while let Some(word) = words.next() {
            if !word.is_flag() {
                return Err(OptionsStringError::DanglingValue(word.text));
            }
            let value = words.next_if(|next| !next.is_flag()).map(|next| next.text);
            block.options.push(OptionEntry::new(word.text, value));
        }
        Ok(block)
    }
}

impl fmt::Display for OptionsBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptionsBlock [\"{}\", {}]",
            self.name,
            singular_or_plural(self.len(), "option", "options")
        )
    }
}

/// Whether a command-line token is an option flag (`-title`), as opposed to a value
/// (`score.xml`, `-5`).
pub fn is_flag(token: &str) -> bool {
    token
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '-')
}

/// One word of an options string, unquoted by `shlex`.
struct ShellWord {
    text: String,
    quoted: bool,
}

impl ShellWord {
    fn is_flag(&self) -> bool {
        !self.quoted && is_flag(&self.text)
    }
}

/// Splits `s` into shell words, remembering which ones carried any quoting.
fn shell_words(s: &str) -> Result<Vec<ShellWord>, OptionsStringError> {
    let tokenize_error = || OptionsStringError::Tokenize(s.to_string());

    let mut raw_words = Vec::new();
    let mut start = None;
    let (mut in_single, mut in_double, mut escaped) = (false, false, false);
    for (i, c) in s.char_indices() {
        if start.is_none() {
            if c.is_whitespace() {
                continue;
            }
            start = Some(i);
        }
        if escaped {
            escaped = false;
        } else if in_single {
            in_single = c != '\'';
        } else if in_double {
            match c {
                '\\' => escaped = true,
                '"' => in_double = false,
                _ => {}
            }
        } else {
            match c {
                '\\' => escaped = true,
                '\'' => in_single = true,
                '"' => in_double = true,
                c if c.is_whitespace() => {
                    if let Some(begin) = start.take() {
                        raw_words.push(&s[begin..i]);
                    }
                }
                _ => {}
            }
        }
    }
    if in_single || in_double || escaped {
        return Err(tokenize_error());
    }
    if let Some(begin) = start {
        raw_words.push(&s[begin..]);
    }

    raw_words
        .into_iter()
        .map(|raw| -> Result<ShellWord, OptionsStringError> {
            let text = shlex::split(raw).ok_or_else(tokenize_error)?.concat();
            let quoted = text != raw;
            Ok(ShellWord { text, quoted })
        })
        .collect()
}

pub(crate) fn singular_or_plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
