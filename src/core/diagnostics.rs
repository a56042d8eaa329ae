//! # Located Diagnostics
//!
//! Every problem found in a script is tied to the place in the script where it was
//! detected. Structural errors are fatal and travel as [`ScriptError`] values through
//! `Result`s back to the host; semantic warnings are collected in [`Diagnostics`] and
//! reported once, at the end of the pass that produced them.

use crate::models::VariantKind;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// A 1-based line/column position in a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Represents the structural errors that abort script processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The script text does not follow the grammar.
    #[error("{location}: syntax error: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },
    /// A choice or input name was declared twice in its table.
    #[error("{location}: {kind} \"{name}\" occurs more than once in the {kind}s table")]
    DuplicateVariant {
        kind: VariantKind,
        name: String,
        location: SourceLocation,
    },
    /// A label (or input name) was added twice to the same choice (or input).
    #[error("{location}: {kind} {member} \"{label}\" occurs more than once in {kind} \"{variant}\"")]
    DuplicateLabel {
        kind: VariantKind,
        member: &'static str,
        variant: String,
        label: String,
        location: SourceLocation,
    },
    /// A name that is neither a known choice nor a known input.
    #[error("{location}: \"{name}\" is no {expected} name, cannot be used in {context}")]
    UnknownVariant {
        expected: String,
        name: String,
        context: String,
        location: SourceLocation,
    },
    /// A label that has not been declared for the choice or input it is used with.
    #[error("{location}: {member} \"{label}\" is not known to {kind} \"{variant}\", the {member}s are: {known}")]
    UnknownLabel {
        kind: VariantKind,
        member: &'static str,
        variant: String,
        label: String,
        known: String,
        location: SourceLocation,
    },
    /// A case statement registered the same label twice.
    #[error("{location}: {kind} {member} \"{label}\" occurs more than once in this case \"{variant}\" statement")]
    DuplicateCaseLabel {
        kind: VariantKind,
        member: &'static str,
        variant: String,
        label: String,
        location: SourceLocation,
    },
    /// A case statement closed without covering every declared label.
    #[error("{location}: the following {member}s for {kind} \"{variant}\" have not been used in this case statement: {missing}")]
    NonExhaustiveCase {
        kind: VariantKind,
        member: &'static str,
        variant: String,
        missing: String,
        location: SourceLocation,
    },
    /// Popping the main options block, or any options block stack imbalance.
    #[error("{location}: internal error: options blocks stack {problem} ({context})")]
    OptionsBlockStack {
        problem: String,
        context: String,
        location: SourceLocation,
    },
    /// A case statement was still open, or none was open when one was needed.
    #[error("{location}: internal error: case statements stack {problem}")]
    CaseStatementStack {
        problem: String,
        location: SourceLocation,
    },
    /// The script selected the same choice or input more than once.
    #[error("{location}: {kind} \"{name}\" already has {member} \"{previous}\" selected in the script, cannot select \"{label}\"")]
    DuplicateSelect {
        kind: VariantKind,
        member: &'static str,
        name: String,
        previous: String,
        label: String,
        location: SourceLocation,
    },
    /// The fallback to a default label was needed but the choice has none.
    #[error("{location}: choice \"{choice}\" has no default label, a 'select' statement or option is needed")]
    NoDefaultLabel {
        choice: String,
        location: SourceLocation,
    },
    /// Case statements exist, nothing was selected, and there is not exactly one choice.
    #[error("{location}: internal error: there can be only 1 choice if there is no 'select' statement nor option, found {found}")]
    AmbiguousDefaultSelection {
        found: String,
        location: SourceLocation,
    },
    /// No service was named, neither in the script nor by the dialect.
    #[error("{location}: no service to launch, use a 'tool' statement")]
    NoService { location: SourceLocation },
    /// No input source was given, neither in the script nor on the command line.
    #[error("{location}: no input source to launch the service on, use an 'input' statement")]
    NoInputSource { location: SourceLocation },
}

impl ScriptError {
    /// The script location the error is attached to.
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::Syntax { location, .. }
            | Self::DuplicateVariant { location, .. }
            | Self::DuplicateLabel { location, .. }
            | Self::UnknownVariant { location, .. }
            | Self::UnknownLabel { location, .. }
            | Self::DuplicateCaseLabel { location, .. }
            | Self::NonExhaustiveCase { location, .. }
            | Self::OptionsBlockStack { location, .. }
            | Self::CaseStatementStack { location, .. }
            | Self::DuplicateSelect { location, .. }
            | Self::NoDefaultLabel { location, .. }
            | Self::AmbiguousDefaultSelection { location, .. }
            | Self::NoService { location }
            | Self::NoInputSource { location } => *location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A message tied to a script location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
}

/// Collects the non-fatal diagnostics of a script run.
///
/// Messages are prefixed with the dialect name and the script name when rendered,
/// the way each MusicFormats front end tags its own output.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dialect: String,
    script_name: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(dialect: impl Into<String>, script_name: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            script_name: script_name.into(),
            entries: Vec::new(),
        }
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Records a warning. Processing continues.
    pub fn warn(&mut self, location: SourceLocation, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            location,
            message: message.into(),
        };
        log::debug!("{}", self.render(&diagnostic));
        self.entries.push(diagnostic);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Renders one diagnostic as `<dialect>: <severity>: <script>:<line>:<col>: <message>`.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        format!(
            "{}: {}: {}:{}: {}",
            self.dialect, diagnostic.severity, self.script_name, diagnostic.location, diagnostic.message
        )
    }

    /// Renders a fatal error with the same prefix as the collected diagnostics.
    pub fn render_error(&self, error: &ScriptError) -> String {
        format!(
            "{}: {}: {}:{}",
            self.dialect,
            Severity::Error,
            self.script_name,
            error
        )
    }

    /// Prints every collected warning to standard error, once.
    pub fn report(&self) {
        for diagnostic in self.warnings() {
            eprintln!("{}", self.render(diagnostic).yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_collected_in_order() {
        let mut diagnostics = Diagnostics::new("mfsl", "score.mfsl");
        diagnostics.warn(SourceLocation::new(3, 1), "first");
        diagnostics.warn(SourceLocation::new(7, 5), "second");

        let messages: Vec<_> = diagnostics.warnings().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(diagnostics.warning_count(), 2);
    }

    #[test]
    fn test_render_includes_dialect_script_and_location() {
        let mut diagnostics = Diagnostics::new("ischeme", "stdin");
        diagnostics.warn(SourceLocation::new(12, 4), "choice unused");
        let rendered = diagnostics.render(diagnostics.warnings().next().unwrap());
        assert_eq!(rendered, "ischeme: warning: stdin:12:4: choice unused");
    }

    #[test]
    fn test_error_display_carries_location() {
        let error = ScriptError::DuplicateVariant {
            kind: VariantKind::Choice,
            name: "target".to_string(),
            location: SourceLocation::new(4, 8),
        };
        assert_eq!(error.location(), SourceLocation::new(4, 8));
        assert_eq!(
            error.to_string(),
            "4:8: choice \"target\" occurs more than once in the choices table"
        );
        let diagnostics = Diagnostics::new("mfsl", "a.mfsl");
        assert!(diagnostics.render_error(&error).starts_with("mfsl: error: a.mfsl:4:8:"));
    }
}
