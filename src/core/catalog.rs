//! # Choice / Input Catalog
//!
//! The tables of named enumerable variants a script declares. A *choice* holds
//! mutually exclusive labels (`choice target { pdf, xml }`), an *input* holds
//! alternative substitution names (`input voices { soprano, alto }`). Both share the
//! same shape, so they are one [`Variant`] type tagged by [`VariantKind`]: each label
//! owns exactly one [`OptionsBlock`] that case alternatives enrich.
//!
//! Lookups never insert: an unknown name or label is a located [`ScriptError`].

use crate::{
    core::{
        diagnostics::{ScriptError, SourceLocation},
        options_block::OptionsBlock,
    },
    models::{SelectionState, VariantKind},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A declared choice or input.
#[derive(Serialize, Debug, Clone)]
pub struct Variant {
    name: String,
    kind: VariantKind,
    /// Labels in declaration order.
    labels: Vec<String>,
    default_label: Option<String>,
    label_blocks: BTreeMap<String, OptionsBlock>,
    selection_state: SelectionState,
    selected_labels: Vec<String>,
}

impl Variant {
    pub fn new(kind: VariantKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            labels: Vec::new(),
            default_label: None,
            label_blocks: BTreeMap::new(),
            selection_state: SelectionState::Unset,
            selected_labels: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    /// The declared labels, in declaration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn default_label(&self) -> Option<&str> {
        self.default_label.as_deref()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_blocks.contains_key(label)
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection_state
    }

    pub fn selected_labels(&self) -> &[String] {
        &self.selected_labels
    }

    /// Declares a new label and creates its empty options block.
    pub fn add_label(&mut self, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        if self.has_label(label) {
            return Err(ScriptError::DuplicateLabel {
                kind: self.kind,
                member: self.kind.member_noun(),
                variant: self.name.clone(),
                label: label.to_string(),
                location,
            });
        }
        log::debug!(
            "Adding {} \"{}\" to {} \"{}\", line {}",
            self.kind.member_noun(),
            label,
            self.kind,
            self.name,
            location.line
        );
        self.labels.push(label.to_string());
        self.label_blocks
            .insert(label.to_string(), OptionsBlock::new(label));
        Ok(())
    }

    pub fn register_default_label(&mut self, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.check_label(label, location)?;
        log::debug!("Default label of {} \"{}\" is \"{}\"", self.kind, self.name, label);
        self.default_label = Some(label.to_string());
        Ok(())
    }

    /// Appends the options of `incoming` to the block owned by `label`.
    pub fn enrich_label_options_block(
        &mut self,
        label: &str,
        incoming: &OptionsBlock,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        let known = self.labels_as_string();
        let (kind, name) = (self.kind, self.name.clone());
        let block = self
            .label_blocks
            .get_mut(label)
            .ok_or_else(|| ScriptError::UnknownLabel {
                kind,
                member: kind.member_noun(),
                variant: name,
                label: label.to_string(),
                known,
                location,
            })?;
        block.enrich_with(incoming);
        Ok(())
    }

    pub fn options_block_for_label(&self, label: &str, location: SourceLocation) -> Result<&OptionsBlock, ScriptError> {
        self.label_blocks
            .get(label)
            .ok_or_else(|| self.unknown_label(label, location))
    }

    /// Fails with [`ScriptError::UnknownLabel`] unless `label` was declared.
    pub fn check_label(&self, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        if self.has_label(label) {
            Ok(())
        } else {
            Err(self.unknown_label(label, location))
        }
    }

    /// Records that `label` has been selected, and by whom.
    pub fn record_selection(&mut self, label: &str, state: SelectionState) {
        log::debug!(
            "{} \"{}\" selected as \"{}\" ({})",
            self.kind,
            self.name,
            label,
            state
        );
        self.selection_state = state;
        self.selected_labels.push(label.to_string());
    }

    /// The labels as `a, b and c`, for messages.
    pub fn labels_as_string(&self) -> String {
        join_with_and(&self.labels)
    }

    fn unknown_label(&self, label: &str, location: SourceLocation) -> ScriptError {
        ScriptError::UnknownLabel {
            kind: self.kind,
            member: self.kind.member_noun(),
            variant: self.name.clone(),
            label: label.to_string(),
            known: self.labels_as_string(),
            location,
        }
    }
}

/// The choices and inputs tables of one script run.
#[derive(Serialize, Debug, Clone, Default)]
pub struct Catalog {
    choices: BTreeMap<String, Variant>,
    inputs: BTreeMap<String, Variant>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: VariantKind) -> &BTreeMap<String, Variant> {
        match kind {
            VariantKind::Choice => &self.choices,
            VariantKind::Input => &self.inputs,
        }
    }

    fn table_mut(&mut self, kind: VariantKind) -> &mut BTreeMap<String, Variant> {
        match kind {
            VariantKind::Choice => &mut self.choices,
            VariantKind::Input => &mut self.inputs,
        }
    }

    /// Adds a new, label-less variant. The name must be new in its own table.
    pub fn declare(&mut self, kind: VariantKind, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        let table = self.table_mut(kind);
        if table.contains_key(name) {
            return Err(ScriptError::DuplicateVariant {
                kind,
                name: name.to_string(),
                location,
            });
        }
        log::debug!("Declaring {} \"{}\", line {}", kind, name, location.line);
        table.insert(name.to_string(), Variant::new(kind, name));
        Ok(())
    }

    pub fn declare_choice(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.declare(VariantKind::Choice, name, location)
    }

    pub fn declare_input(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.declare(VariantKind::Input, name, location)
    }

    pub fn variant(&self, kind: VariantKind, name: &str, location: SourceLocation) -> Result<&Variant, ScriptError> {
        self.table(kind)
            .get(name)
            .ok_or_else(|| unknown_variant(&kind.to_string(), name, "this statement", location))
    }

    pub fn variant_mut(
        &mut self,
        kind: VariantKind,
        name: &str,
        location: SourceLocation,
    ) -> Result<&mut Variant, ScriptError> {
        self.table_mut(kind)
            .get_mut(name)
            .ok_or_else(|| unknown_variant(&kind.to_string(), name, "this statement", location))
    }

    /// Finds a variant by name, choices first, then inputs.
    pub fn lookup(&self, name: &str) -> Option<&Variant> {
        self.choices.get(name).or_else(|| self.inputs.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Variant> {
        if self.choices.contains_key(name) {
            self.choices.get_mut(name)
        } else {
            self.inputs.get_mut(name)
        }
    }

    pub fn add_label(&mut self, choice: &str, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.variant_mut(VariantKind::Choice, choice, location)?
            .add_label(label, location)
    }

    pub fn add_name(&mut self, input: &str, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.variant_mut(VariantKind::Input, input, location)?
            .add_label(name, location)
    }

    pub fn register_default_label(
        &mut self,
        choice: &str,
        label: &str,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        self.variant_mut(VariantKind::Choice, choice, location)?
            .register_default_label(label, location)
    }

    pub fn enrich_label_options_block(
        &mut self,
        kind: VariantKind,
        name: &str,
        label: &str,
        incoming: &OptionsBlock,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        self.variant_mut(kind, name, location)?
            .enrich_label_options_block(label, incoming, location)
    }

    pub fn fetch_options_block_for_label(
        &self,
        kind: VariantKind,
        name: &str,
        label: &str,
        location: SourceLocation,
    ) -> Result<&OptionsBlock, ScriptError> {
        self.variant(kind, name, location)?
            .options_block_for_label(label, location)
    }

    pub fn choices(&self) -> impl Iterator<Item = &Variant> {
        self.choices.values()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Variant> {
        self.inputs.values()
    }

    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.inputs.is_empty()
    }
}

pub(crate) fn unknown_variant(expected: &str, name: &str, context: &str, location: SourceLocation) -> ScriptError {
    ScriptError::UnknownVariant {
        expected: expected.to_string(),
        name: name.to_string(),
        context: context.to_string(),
        location,
    }
}

/// Joins names as `a`, `a and b`, `a, b and c`.
pub fn join_with_and<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => format!(
            "{} and {}",
            init.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", "),
            last.as_ref()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionEntry;

    fn here() -> SourceLocation {
        SourceLocation::new(2, 1)
    }

    fn target_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.declare_choice("target", here()).unwrap();
        for label in ["pdf", "xml", "midi"] {
            catalog.add_label("target", label, here()).unwrap();
        }
        catalog
    }

    #[test]
    fn test_duplicate_choice_is_an_error() {
        let mut catalog = target_catalog();
        let result = catalog.declare_choice("target", SourceLocation::new(9, 1));
        assert!(matches!(result, Err(ScriptError::DuplicateVariant { kind: VariantKind::Choice, .. })));
    }

    #[test]
    fn test_choice_and_input_tables_are_separate() {
        let mut catalog = target_catalog();
        assert!(catalog.declare_input("target", here()).is_ok());
        assert_eq!(catalog.lookup("target").unwrap().kind(), VariantKind::Choice);
    }

    #[test]
    fn test_duplicate_label_is_an_error() {
        let mut catalog = target_catalog();
        let result = catalog.add_label("target", "xml", here());
        assert!(matches!(result, Err(ScriptError::DuplicateLabel { label, .. }) if label == "xml"));
    }

    #[test]
    fn test_labels_keep_declaration_order() {
        let catalog = target_catalog();
        let choice = catalog.variant(VariantKind::Choice, "target", here()).unwrap();
        assert_eq!(choice.labels(), ["pdf", "xml", "midi"]);
        assert_eq!(choice.labels_as_string(), "pdf, xml and midi");
    }

    #[test]
    fn test_default_label_must_be_declared() {
        let mut catalog = target_catalog();
        assert!(catalog.register_default_label("target", "png", here()).is_err());
        catalog.register_default_label("target", "pdf", here()).unwrap();
        let choice = catalog.lookup("target").unwrap();
        assert_eq!(choice.default_label(), Some("pdf"));
    }

    #[test]
    fn test_label_on_unknown_choice_is_an_error() {
        let mut catalog = Catalog::new();
        let result = catalog.add_label("nope", "pdf", here());
        assert!(matches!(result, Err(ScriptError::UnknownVariant { name, .. }) if name == "nope"));
    }

    #[test]
    fn test_enrich_accumulates_across_calls() {
        let mut catalog = target_catalog();
        let mut first = OptionsBlock::new("alt 1");
        first.register_option(OptionEntry::flag("-a"));
        let mut second = OptionsBlock::new("alt 2");
        second.register_option(OptionEntry::flag("-b"));

        catalog
            .enrich_label_options_block(VariantKind::Choice, "target", "pdf", &first, here())
            .unwrap();
        catalog
            .enrich_label_options_block(VariantKind::Choice, "target", "pdf", &second, here())
            .unwrap();

        let block = catalog
            .fetch_options_block_for_label(VariantKind::Choice, "target", "pdf", here())
            .unwrap();
        assert_eq!(block.as_options_string(), "-a -b");
    }

    #[test]
    fn test_fetching_unknown_label_does_not_insert() {
        let catalog = target_catalog();
        let result = catalog.fetch_options_block_for_label(VariantKind::Choice, "target", "png", here());
        assert!(matches!(result, Err(ScriptError::UnknownLabel { .. })));
        assert!(!catalog.lookup("target").unwrap().has_label("png"));
    }

    #[test]
    fn test_input_names_use_name_noun() {
        let mut catalog = Catalog::new();
        catalog.declare_input("voices", here()).unwrap();
        catalog.add_name("voices", "soprano", here()).unwrap();
        let err = catalog.add_name("voices", "soprano", here()).unwrap_err();
        assert!(err.to_string().contains("input name \"soprano\""));
    }

    #[test]
    fn test_join_with_and() {
        assert_eq!(join_with_and::<&str>(&[]), "");
        assert_eq!(join_with_and(&["a"]), "a");
        assert_eq!(join_with_and(&["a", "b"]), "a and b");
    }
}
