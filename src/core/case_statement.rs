// src/core/case_statement.rs

use crate::{
    core::{
        catalog::{Catalog, join_with_and, unknown_variant},
        diagnostics::{ScriptError, SourceLocation},
    },
    models::VariantKind,
};
use std::collections::BTreeSet;

/// One `case <name> { ... }` construct, bound to a choice or an input.
///
/// A case statement is a partition of its subject's labels: every declared label must
/// be registered by exactly one alternative before the statement closes.
#[derive(Debug, Clone)]
pub struct CaseStatement {
    kind: VariantKind,
    subject: String,
    declared: Vec<String>,
    used: BTreeSet<String>,
    current_labels: Vec<String>,
    opened_at: SourceLocation,
}

impl CaseStatement {
    /// Binds a new case statement to the choice or input named `subject`.
    pub fn open(catalog: &Catalog, subject: &str, location: SourceLocation) -> Result<Self, ScriptError> {
        let variant = catalog
            .lookup(subject)
            .ok_or_else(|| unknown_variant("choice nor input", subject, "a case statement", location))?;
        log::debug!(
            "Opening case statement on {} \"{}\", line {}",
            variant.kind(),
            subject,
            location.line
        );
        Ok(Self {
            kind: variant.kind(),
            subject: subject.to_string(),
            declared: variant.labels().to_vec(),
            used: BTreeSet::new(),
            current_labels: Vec::new(),
            opened_at: location,
        })
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn opened_at(&self) -> SourceLocation {
        self.opened_at
    }

    /// The labels of the alternative being read, in the order they were written.
    pub fn current_labels(&self) -> &[String] {
        &self.current_labels
    }

    /// The declared labels not registered yet, in declaration order.
    pub fn unused_labels(&self) -> Vec<&str> {
        self.declared
            .iter()
            .filter(|label| !self.used.contains(label.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Starts a new alternative. Its label list starts empty.
    pub fn begin_alternative(&mut self) {
        self.current_labels.clear();
    }

    /// Registers `label` for the current alternative.
    pub fn register_label(&mut self, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        if !self.declared.iter().any(|declared| declared == label) {
            return Err(ScriptError::UnknownLabel {
                kind: self.kind,
                member: self.kind.member_noun(),
                variant: self.subject.clone(),
                label: label.to_string(),
                known: join_with_and(&self.declared),
                location,
            });
        }
        if !self.used.insert(label.to_string()) {
            return Err(ScriptError::DuplicateCaseLabel {
                kind: self.kind,
                member: self.kind.member_noun(),
                variant: self.subject.clone(),
                label: label.to_string(),
                location,
            });
        }
        log::trace!(
            "Case {} \"{}\": {} \"{}\" registered, line {}",
            self.kind,
            self.subject,
            self.kind.member_noun(),
            label,
            location.line
        );
        self.current_labels.push(label.to_string());
        Ok(())
    }

    /// Closes the statement, failing when some declared label was never registered.
    pub fn close(self, location: SourceLocation) -> Result<(), ScriptError> {
        let unused = self.unused_labels();
        if !unused.is_empty() {
            return Err(ScriptError::NonExhaustiveCase {
                kind: self.kind,
                member: self.kind.member_noun(),
                variant: self.subject.clone(),
                missing: join_with_and(&unused),
                location,
            });
        }
        log::debug!(
            "Closing case statement on {} \"{}\" opened at {}",
            self.kind,
            self.subject,
            self.opened_at
        );
        Ok(())
    }
}

/// The nesting of case statements currently open, innermost last.
#[derive(Debug, Default)]
pub struct CaseStatementStack {
    statements: Vec<CaseStatement>,
    opened_count: usize,
}

impl CaseStatementStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: CaseStatement) {
        self.statements.push(statement);
        self.opened_count += 1;
    }

    pub fn current_mut(&mut self, location: SourceLocation) -> Result<&mut CaseStatement, ScriptError> {
        self.statements
            .last_mut()
            .ok_or_else(|| ScriptError::CaseStatementStack {
                problem: "is empty, no case statement is open".to_string(),
                location,
            })
    }

    pub fn current(&self) -> Option<&CaseStatement> {
        self.statements.last()
    }

    pub fn pop(&mut self, location: SourceLocation) -> Result<CaseStatement, ScriptError> {
        self.statements
            .pop()
            .ok_or_else(|| ScriptError::CaseStatementStack {
                problem: "is empty, there is no case statement to close".to_string(),
                location,
            })
    }

    pub fn depth(&self) -> usize {
        self.statements.len()
    }

    /// How many case statements were opened since the start of the script.
    pub fn opened_count(&self) -> usize {
        self.opened_count
    }

    /// Fails if a case statement is still open at the end of the script.
    pub fn check_empty(&self, location: SourceLocation) -> Result<(), ScriptError> {
        match self.statements.last() {
            None => Ok(()),
            Some(open) => Err(ScriptError::CaseStatementStack {
                problem: format!(
                    "should be empty after parsing, case statement on \"{}\" opened at {} is still open",
                    open.subject, open.opened_at
                ),
                location,
            }),
        }
    }
}
