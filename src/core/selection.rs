// src/core/selection.rs

use crate::{
    constants::ALL_PSEUDO_LABEL,
    core::{
        catalog::{Catalog, unknown_variant},
        diagnostics::{Diagnostics, ScriptError, SourceLocation},
    },
    models::{SelectionState, VariantKind},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

lazy_static! {
    // `name=label` or `name:label`, surrounding blanks allowed.
    static ref OVERRIDE_ENTRY_RE: Regex = Regex::new(r"^\s*([^=:\s]+)\s*[=:]\s*(\S+)\s*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectOptionError {
    #[error("Malformed select option '{0}', expected NAME=LABEL or NAME:LABEL")]
    Malformed(String),
}

/// The `name -> label` selections supplied on the host command line.
///
/// This is a multimap: one name may be given several labels. Entries keep the
/// order in which they were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrideMap {
    entries: Vec<(String, String)>,
}

impl CliOverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from raw `NAME=LABEL` command-line values.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, SelectOptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for entry in entries {
            let (name, label) = parse_override_entry(entry.as_ref())?;
            map.insert(name, label);
        }
        Ok(map)
    }

    pub fn insert(&mut self, name: impl Into<String>, label: impl Into<String>) {
        self.entries.push((name.into(), label.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, label)| (name.as_str(), label.as_str()))
    }

    /// The distinct names, sorted.
    pub fn names(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Splits one `NAME=LABEL` (or `NAME:LABEL`) command-line value.
pub fn parse_override_entry(entry: &str) -> Result<(String, String), SelectOptionError> {
    let captures = OVERRIDE_ENTRY_RE
        .captures(entry)
        .ok_or_else(|| SelectOptionError::Malformed(entry.to_string()))?;
    Ok((captures[1].to_string(), captures[2].to_string()))
}

/// A `select name label` statement, as read in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSelect {
    pub name: String,
    pub label: String,
    pub location: SourceLocation,
}

/// One entry of the selected blocks list: which label block of which variant to use.
///
/// The block itself stays in the [`Catalog`]; this only names it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectedBlock {
    pub kind: VariantKind,
    pub variant: String,
    pub label: String,
}

/// Reconciles the script's `select` statements with the command-line overrides.
///
/// When the override map holds any entry at all, every script selection is ignored
/// with a warning and all the overrides are applied instead.
#[derive(Debug)]
pub struct SelectionResolver {
    overrides: CliOverrideMap,
    select_option: String,
    script_selects: Vec<ScriptSelect>,
    unused_override_names: BTreeSet<String>,
    selected: Vec<SelectedBlock>,
}

impl SelectionResolver {
    /// `select_option` is how the host's select option is spelled in warnings.
    pub fn new(overrides: CliOverrideMap, select_option: impl Into<String>) -> Self {
        let unused_override_names = overrides.names().into_iter().map(str::to_string).collect();
        Self {
            overrides,
            select_option: select_option.into(),
            script_selects: Vec::new(),
            unused_override_names,
            selected: Vec::new(),
        }
    }

    pub fn overrides(&self) -> &CliOverrideMap {
        &self.overrides
    }

    pub fn script_selects(&self) -> &[ScriptSelect] {
        &self.script_selects
    }

    /// The resolved selection, in application order.
    pub fn selected(&self) -> &[SelectedBlock] {
        &self.selected
    }

    /// Records a script `select` statement after checking its name and label.
    pub fn record_script_select(
        &mut self,
        catalog: &Catalog,
        name: &str,
        label: &str,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        let variant = catalog
            .lookup(name)
            .ok_or_else(|| unknown_variant("choice nor input", name, "a select statement", location))?;
        if label != ALL_PSEUDO_LABEL {
            variant.check_label(label, location)?;
        }
        if let Some(previous) = self.script_selects.iter().find(|select| select.name == name) {
            return Err(ScriptError::DuplicateSelect {
                kind: variant.kind(),
                member: variant.kind().member_noun(),
                name: name.to_string(),
                previous: previous.label.clone(),
                label: label.to_string(),
                location,
            });
        }
        log::debug!(
            "Script selects {} \"{}\" as \"{}\", line {}",
            variant.kind(),
            name,
            label,
            location.line
        );
        self.script_selects.push(ScriptSelect {
            name: name.to_string(),
            label: label.to_string(),
            location,
        });
        Ok(())
    }

    /// Builds the selected blocks list, once pass 1 is over.
    ///
    /// `location` is used for the overrides, which have no place in the script.
    pub fn resolve(
        &mut self,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        self.selected.clear();

        if self.overrides.is_empty() {
            let script_selects = self.script_selects.clone();
            for select in &script_selects {
                self.apply(catalog, &select.name, &select.label, SelectionState::SetInScript, select.location)?;
            }
            return Ok(());
        }

        for select in &self.script_selects {
            let kind = catalog
                .lookup(&select.name)
                .map_or(VariantKind::Choice, |variant| variant.kind());
            diagnostics.warn(
                select.location,
                format!(
                    "'select' {} \"{}\" for {} \"{}\" ignored, it is overridden by a '{}' option",
                    kind.member_noun(),
                    select.label,
                    kind,
                    select.name,
                    self.select_option
                ),
            );
        }

        let overrides = self.overrides.clone();
        for (name, label) in overrides.iter() {
            if catalog.lookup(name).is_none() {
                log::debug!("Option-supplied name \"{}\" is not declared in the script, skipped", name);
                continue;
            }
            self.apply(catalog, name, label, SelectionState::SetByCliOption, location)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        catalog: &mut Catalog,
        name: &str,
        label: &str,
        state: SelectionState,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        let variant = catalog
            .lookup_mut(name)
            .ok_or_else(|| unknown_variant("choice nor input", name, "a selection", location))?;

        let labels: Vec<String> = if label == ALL_PSEUDO_LABEL {
            variant.labels().to_vec()
        } else {
            variant.check_label(label, location)?;
            vec![label.to_string()]
        };

        for label in labels {
            variant.record_selection(&label, state);
            self.selected.push(SelectedBlock {
                kind: variant.kind(),
                variant: name.to_string(),
                label,
            });
        }

        if state == SelectionState::SetByCliOption && self.unused_override_names.remove(name) {
            log::debug!("Option-supplied {} \"{}\" registered as used", variant.kind(), name);
        }
        Ok(())
    }

    /// Warns about every option-supplied name the script never made use of.
    pub fn final_semantic_check(&self, diagnostics: &mut Diagnostics, location: SourceLocation) {
        let script_name = diagnostics.script_name().to_string();
        for name in &self.unused_override_names {
            diagnostics.warn(
                location,
                format!(
                    "option-supplied choice \"{}\" has not been used in script \"{}\"",
                    name, script_name
                ),
            );
        }
    }
}
