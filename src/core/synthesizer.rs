// src/core/synthesizer.rs

use crate::core::{
    catalog::{Catalog, Variant, join_with_and},
    diagnostics::{ScriptError, SourceLocation},
    options_block::OptionsBlock,
    selection::SelectedBlock,
};
use serde::Serialize;
use std::borrow::Cow;

/// The ordered command lines to launch, built once after pass 1.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<String>,
}

impl CommandList {
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }
}

/// Everything pass 1 produced that the command lines are built from.
#[derive(Debug)]
pub struct CommandSynthesizer<'a> {
    pub service: &'a str,
    pub input_sources: &'a [String],
    pub main_block: &'a OptionsBlock,
    pub catalog: &'a Catalog,
    pub selected: &'a [SelectedBlock],
    /// How many case statements were opened while reading the script.
    pub case_statements_count: usize,
}

impl<'a> CommandSynthesizer<'a> {
    /// Builds one command per input source and per selected block.
    ///
    /// - without any case statement, the main options alone are used;
    /// - otherwise each selected block gets its own command;
    /// - with nothing selected, the single declared choice falls back to its default label.
    pub fn synthesize(&self, location: SourceLocation) -> Result<CommandList, ScriptError> {
        let blocks = self.blocks_to_combine(location)?;
        let main_options = self.main_block.as_options_string();

        let mut commands = Vec::with_capacity(self.input_sources.len() * blocks.len().max(1));
        for input_source in self.input_sources {
            let service_and_input = format!("{} {}", self.service, quote(input_source));
            if blocks.is_empty() {
                commands.push(join_parts(&[&service_and_input, &main_options]));
                continue;
            }
            for block in &blocks {
                commands.push(join_parts(&[
                    &service_and_input,
                    &main_options,
                    &block.as_options_string(),
                ]));
            }
        }

        log::debug!("Synthesized {} command(s)", commands.len());
        Ok(CommandList { commands })
    }

    fn blocks_to_combine(&self, location: SourceLocation) -> Result<Vec<&'a OptionsBlock>, ScriptError> {
        let catalog: &'a Catalog = self.catalog;
        if self.case_statements_count == 0 {
            return Ok(Vec::new());
        }

        if !self.selected.is_empty() {
            return self
                .selected
                .iter()
                .map(|selected| {
                    catalog.fetch_options_block_for_label(
                        selected.kind,
                        &selected.variant,
                        &selected.label,
                        location,
                    )
                })
                .collect();
        }

        let choices: Vec<&'a Variant> = catalog.choices().collect();
        match choices.as_slice() {
            [choice] => {
                let label = choice.default_label().ok_or_else(|| ScriptError::NoDefaultLabel {
                    choice: choice.name().to_string(),
                    location,
                })?;
                log::debug!(
                    "No selection, using default label \"{}\" of choice \"{}\"",
                    label,
                    choice.name()
                );
                Ok(vec![choice.options_block_for_label(label, location)?])
            }
            [] => Err(ScriptError::AmbiguousDefaultSelection {
                found: "no choice".to_string(),
                location,
            }),
            several => {
                let names: Vec<&str> = several.iter().map(|choice| choice.name()).collect();
                Err(ScriptError::AmbiguousDefaultSelection {
                    found: format!("{} choices: {}", several.len(), join_with_and(&names)),
                    location,
                })
            }
        }
    }
}

fn quote(value: &str) -> Cow<'_, str> {
    shlex::try_quote(value).unwrap_or(Cow::Borrowed(value))
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
