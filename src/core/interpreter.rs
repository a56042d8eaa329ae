//! # Script Interpreter
//!
//! One interpreter serves every scripting dialect. It is driven by the script reader
//! during pass 1, where it fills the catalog, keeps the options block and case
//! statement stacks balanced, and records `select` statements. Once the script has
//! been read, the selections are resolved and checked. Pass 2 synthesizes the
//! command list and launches it.

use crate::{
    constants::MAIN_OPTIONS_BLOCK_NAME,
    core::{
        block_stack::OptionsBlockStack,
        case_statement::{CaseStatement, CaseStatementStack},
        catalog::{Catalog, join_with_and},
        dialect::Dialect,
        diagnostics::{Diagnostics, ScriptError, SourceLocation},
        options_block::OptionsBlock,
        parser::{ScriptDriver, parse_script},
        paths,
        runner::{CommandRunner, RunOptions, RunReport, run_commands},
        selection::{CliOverrideMap, SelectedBlock, SelectionResolver},
        synthesizer::{CommandList, CommandSynthesizer},
    },
    models::{OptionEntry, VariantKind},
};

#[derive(Debug)]
pub struct Interpreter {
    dialect: Dialect,
    diagnostics: Diagnostics,
    catalog: Catalog,
    blocks: OptionsBlockStack,
    cases: CaseStatementStack,
    resolver: SelectionResolver,
    service: Option<String>,
    input_sources: Vec<String>,
    first_input_location: Option<SourceLocation>,
    host_input_sources: Vec<String>,
    main_block: Option<OptionsBlock>,
    end_location: SourceLocation,
}

impl Interpreter {
    pub fn new(dialect: Dialect, script_name: &str, overrides: CliOverrideMap) -> Self {
        let diagnostics = Diagnostics::new(dialect.name.clone(), script_name);
        let resolver = SelectionResolver::new(overrides, dialect.select_option.clone());
        Self {
            dialect,
            diagnostics,
            catalog: Catalog::new(),
            blocks: OptionsBlockStack::new(),
            cases: CaseStatementStack::new(),
            resolver,
            service: None,
            input_sources: Vec::new(),
            first_input_location: None,
            host_input_sources: Vec::new(),
            main_block: None,
            end_location: SourceLocation::default(),
        }
    }

    /// Input sources given to the host; they replace the script's own `input` sources.
    pub fn with_host_input_sources(mut self, sources: Vec<String>) -> Self {
        self.host_input_sources = sources;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn input_sources(&self) -> &[String] {
        &self.input_sources
    }

    /// The main options block, once pass 1 is over.
    pub fn main_block(&self) -> Option<&OptionsBlock> {
        self.main_block.as_ref()
    }

    pub fn selected_blocks(&self) -> &[SelectedBlock] {
        self.resolver.selected()
    }

    pub fn block_stack(&self) -> &OptionsBlockStack {
        &self.blocks
    }

    pub fn case_statements_count(&self) -> usize {
        self.cases.opened_count()
    }

    /// Pass 1: reads the script, then resolves the selections and runs the final checks.
    pub fn run_pass1(&mut self, source: &str) -> Result<(), ScriptError> {
        let end = parse_script(source, self)?;
        self.end_location = end;
        log::debug!("{}", self.blocks.describe("end of parsing"));

        self.cases.check_empty(end)?;
        self.main_block = Some(self.blocks.finish(end)?);

        if !self.host_input_sources.is_empty() {
            if !self.input_sources.is_empty() {
                let location = self.first_input_location.unwrap_or(end);
                self.diagnostics.warn(
                    location,
                    format!(
                        "the script's input sources ({}) are overridden by the '--input' option",
                        join_with_and(&self.input_sources)
                    ),
                );
            }
            self.input_sources = self.host_input_sources.clone();
        }

        self.resolver
            .resolve(&mut self.catalog, &mut self.diagnostics, end)?;
        self.resolver
            .final_semantic_check(&mut self.diagnostics, end);
        Ok(())
    }

    /// Pass 2, first half: builds the command list.
    pub fn synthesize(&self) -> Result<CommandList, ScriptError> {
        let location = self.end_location;
        let main_block = self
            .main_block
            .as_ref()
            .ok_or_else(|| ScriptError::OptionsBlockStack {
                problem: "has no main options block".to_string(),
                context: "synthesizing the commands before reading the script".to_string(),
                location,
            })?;

        let service = self
            .service
            .as_deref()
            .or(self.dialect.default_service.as_deref())
            .ok_or(ScriptError::NoService { location })?;

        if self.input_sources.is_empty() {
            return Err(ScriptError::NoInputSource { location });
        }

        CommandSynthesizer {
            service,
            input_sources: &self.input_sources,
            main_block,
            catalog: &self.catalog,
            selected: self.resolver.selected(),
            case_statements_count: self.cases.opened_count(),
        }
        .synthesize(location)
    }

    /// Pass 2: builds the command list and runs it.
    pub fn launch(&self, runner: &mut dyn CommandRunner, options: &RunOptions) -> Result<RunReport, ScriptError> {
        let commands = self.synthesize()?;
        Ok(run_commands(&commands, runner, options))
    }
}

impl ScriptDriver for Interpreter {
    fn begin_script(&mut self, _location: SourceLocation) -> Result<(), ScriptError> {
        self.blocks
            .push(MAIN_OPTIONS_BLOCK_NAME, "Creation of the main options block");
        Ok(())
    }

    fn set_service(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        log::debug!("Service: {}, line {}", name, location.line);
        if !self.dialect.is_known_service(name) {
            let known = join_with_and(&self.dialect.known_services);
            self.diagnostics.warn(
                location,
                format!(
                    "service \"{}\" is not known to {}, the known services are: {}",
                    name, self.dialect.name, known
                ),
            );
        }
        if let Some(previous) = self.service.replace(name.to_string()) {
            self.diagnostics.warn(
                location,
                format!("service \"{}\" replaces service \"{}\"", name, previous),
            );
        }
        Ok(())
    }

    fn append_input_source(&mut self, source: &str, location: SourceLocation) -> Result<(), ScriptError> {
        let expanded = match paths::expand_input_source(source) {
            Ok(expanded) => expanded,
            Err(e) => {
                self.diagnostics.warn(location, e.to_string());
                source.to_string()
            }
        };
        log::debug!("Input source: {}, line {}", expanded, location.line);
        self.first_input_location.get_or_insert(location);
        self.input_sources.push(expanded);
        Ok(())
    }

    fn declare_choice(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.catalog.declare_choice(name, location)
    }

    fn declare_input(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.catalog.declare_input(name, location)
    }

    fn add_label(
        &mut self,
        kind: VariantKind,
        variant: &str,
        label: &str,
        location: SourceLocation,
    ) -> Result<(), ScriptError> {
        match kind {
            VariantKind::Choice => self.catalog.add_label(variant, label, location),
            VariantKind::Input => self.catalog.add_name(variant, label, location),
        }
    }

    fn register_default_label(&mut self, choice: &str, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.catalog.register_default_label(choice, label, location)
    }

    fn register_option(&mut self, option: OptionEntry, location: SourceLocation) -> Result<(), ScriptError> {
        self.blocks.register_option(option, location)
    }

    fn open_case(&mut self, subject: &str, location: SourceLocation) -> Result<(), ScriptError> {
        let statement = CaseStatement::open(&self.catalog, subject, location)?;
        self.cases.push(statement);
        Ok(())
    }

    fn begin_case_alternative(&mut self, location: SourceLocation) -> Result<(), ScriptError> {
        self.cases.current_mut(location)?.begin_alternative();
        Ok(())
    }

    fn register_case_label(&mut self, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.cases.current_mut(location)?.register_label(label, location)
    }

    fn open_case_alternative_body(&mut self, location: SourceLocation) -> Result<(), ScriptError> {
        let statement = self.cases.current_mut(location)?;
        let description = format!(
            "Case alternative for {}, line {}",
            join_with_and(statement.current_labels()),
            location.line
        );
        self.blocks.push(description.clone(), &description);
        Ok(())
    }

    fn end_case_alternative(&mut self, location: SourceLocation) -> Result<(), ScriptError> {
        let statement = self.cases.current_mut(location)?;
        let (kind, subject) = (statement.kind(), statement.subject().to_string());
        let labels = statement.current_labels().to_vec();

        let context = format!(
            "Discarding case alternative options block for {}, line {}",
            join_with_and(&labels),
            location.line
        );
        let alternative_block = self.blocks.pop(&context, location)?;
        for label in &labels {
            self.catalog
                .enrich_label_options_block(kind, &subject, label, &alternative_block, location)?;
        }
        Ok(())
    }

    fn close_case(&mut self, location: SourceLocation) -> Result<(), ScriptError> {
        self.cases.pop(location)?.close(location)
    }

    fn select(&mut self, name: &str, label: &str, location: SourceLocation) -> Result<(), ScriptError> {
        self.resolver
            .record_script_select(&self.catalog, name, label, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MusicFormatsErrorKind;
    use crate::system::executor::ExecutionError;
    use std::time::Duration;

    const TARGET_SCRIPT: &str = r#"
        tool xml2ly;
        input score.xml;
        -title "Der Lindenbaum"
        choice target { pdf, xml } default pdf;
        case target {
            pdf: -lilypond-run-date;
            xml: -loop;
        }
    "#;

    fn mfsl() -> Dialect {
        Dialect::builtin("mfsl").unwrap()
    }

    fn fresh(overrides: &[&str]) -> Interpreter {
        let overrides = CliOverrideMap::from_entries(overrides.iter().copied()).unwrap();
        Interpreter::new(mfsl(), "test.mfsl", overrides)
    }

    fn commands_for(script: &str, overrides: &[&str]) -> Vec<String> {
        let mut interpreter = fresh(overrides);
        interpreter.run_pass1(script).unwrap();
        interpreter.synthesize().unwrap().commands().to_vec()
    }

    #[test]
    fn test_default_label_without_select() {
        assert_eq!(
            commands_for(TARGET_SCRIPT, &[]),
            vec!["xml2ly score.xml -title 'Der Lindenbaum' -lilypond-run-date"]
        );
    }

    #[test]
    fn test_select_all_yields_one_command_per_label() {
        let script = format!("{}\nselect target all;", TARGET_SCRIPT);
        assert_eq!(
            commands_for(&script, &[]),
            vec![
                "xml2ly score.xml -title 'Der Lindenbaum' -lilypond-run-date",
                "xml2ly score.xml -title 'Der Lindenbaum' -loop",
            ]
        );
    }

    #[test]
    fn test_cli_override_beats_script_select() {
        let script = format!("{}\nselect target pdf;", TARGET_SCRIPT);
        let mut interpreter = fresh(&["target=xml"]);
        interpreter.run_pass1(&script).unwrap();

        let commands = interpreter.synthesize().unwrap();
        assert_eq!(
            commands.commands(),
            ["xml2ly score.xml -title 'Der Lindenbaum' -loop"]
        );
        assert_eq!(interpreter.diagnostics().warning_count(), 1);
    }

    #[test]
    fn test_command_count_is_inputs_times_selected_labels() {
        let script = "
            tool xml2ly;
            input a.xml; input b.xml; input c.xml;
            choice target { pdf, xml, midi };
            case target { pdf: -a; xml: -b; midi: -c; }
            select target all;
        ";
        assert_eq!(commands_for(script, &[]).len(), 3 * 3);

        let without_case = "tool xml2ly; input a.xml; input b.xml; -landscape";
        assert_eq!(commands_for(without_case, &[]).len(), 2);
    }

    #[test]
    fn test_options_block_stack_is_balanced_after_nested_scopes() {
        let script = "
            choice a { x, y };
            choice b { u, v };
            case a {
                x: case b { u: -one; v: -two; }
                   ;
                y: -three;
            }
            tool xml2ly; input s.xml;
            select a x;
        ";
        let mut interpreter = fresh(&[]);
        interpreter.run_pass1(script).unwrap();

        let alternatives = 4;
        let stack = interpreter.block_stack();
        assert_eq!(stack.push_count(), alternatives + 1);
        assert_eq!(stack.pop_count(), alternatives);
        assert_eq!(stack.depth(), 0);
        assert_eq!(interpreter.main_block().unwrap().name(), MAIN_OPTIONS_BLOCK_NAME);
        assert_eq!(interpreter.case_statements_count(), 2);
    }

    #[test]
    fn test_alternative_options_feed_every_listed_label() {
        let script = "
            tool xml2ly; input s.xml;
            choice size: small | medium | large, default: small;
            case size:
                small | medium: -compact;
                large: -wide;
            ;
            every size;
        ";
        assert_eq!(
            commands_for(script, &[]),
            vec!["xml2ly s.xml -compact", "xml2ly s.xml -compact", "xml2ly s.xml -wide"]
        );
    }

    #[test]
    fn test_flag_like_option_value_survives_the_options_string() {
        let mut interpreter = fresh(&[]);
        interpreter
            .run_pass1("tool xml2ly; input s.xml; -title \"-x\" -output-file-name \"default\"")
            .unwrap();

        let main = interpreter.main_block().unwrap();
        let reparsed = OptionsBlock::from_options_string(main.name(), &main.as_options_string()).unwrap();
        assert_eq!(&reparsed, main);
        assert_eq!(
            interpreter.synthesize().unwrap().commands(),
            ["xml2ly s.xml -title '-x' -output-file-name default"]
        );
    }

    #[test]
    fn test_non_exhaustive_case_is_fatal() {
        let script = "choice target { pdf, xml };\ncase target {\n  pdf: -a;\n}";
        let err = fresh(&[]).run_pass1(script).unwrap_err();
        assert!(matches!(err, ScriptError::NonExhaustiveCase { ref missing, .. } if missing == "xml"));
        assert_eq!(err.location(), SourceLocation::new(4, 1));
    }

    #[test]
    fn test_duplicate_case_label_is_fatal() {
        let script = "choice target { pdf, xml };\ncase target { pdf: -a; pdf | xml: -b; }";
        let result = fresh(&[]).run_pass1(script);
        assert!(matches!(result, Err(ScriptError::DuplicateCaseLabel { .. })));
    }

    #[test]
    fn test_host_input_sources_replace_the_script_ones() {
        let mut interpreter = fresh(&[])
            .with_host_input_sources(vec!["other.xml".to_string()]);
        interpreter.run_pass1("tool xml2ly; input score.xml;").unwrap();

        assert_eq!(interpreter.input_sources(), ["other.xml"]);
        let warning = interpreter.diagnostics().warnings().next().unwrap();
        assert_eq!(warning.location, SourceLocation::new(1, 20));
        assert_eq!(
            interpreter.synthesize().unwrap().commands(),
            ["xml2ly other.xml"]
        );
    }

    #[test]
    fn test_unknown_service_is_only_a_warning() {
        let mut interpreter = fresh(&[]);
        interpreter.run_pass1("tool lilypond; input a.ly;").unwrap();
        assert_eq!(interpreter.diagnostics().warning_count(), 1);
        assert_eq!(interpreter.synthesize().unwrap().commands(), ["lilypond a.ly"]);
    }

    #[test]
    fn test_missing_service_and_input_are_fatal_at_synthesis() {
        let mut interpreter = fresh(&[]);
        interpreter.run_pass1("input a.xml;").unwrap();
        assert!(matches!(interpreter.synthesize(), Err(ScriptError::NoService { .. })));

        let mut interpreter = fresh(&[]);
        interpreter.run_pass1("tool xml2ly;").unwrap();
        assert!(matches!(interpreter.synthesize(), Err(ScriptError::NoInputSource { .. })));
    }

    #[test]
    fn test_dialect_default_service() {
        let dialect = Dialect::builtin("mffind").unwrap();
        let mut interpreter = Interpreter::new(dialect, "find", CliOverrideMap::new());
        interpreter.run_pass1("input a.xml;").unwrap();
        assert_eq!(interpreter.synthesize().unwrap().commands(), ["xml2ly a.xml"]);
    }

    #[test]
    fn test_unused_cli_choice_is_reported() {
        let mut interpreter = fresh(&["style=jazz"]);
        interpreter.run_pass1(TARGET_SCRIPT).unwrap();
        let messages: Vec<_> = interpreter
            .diagnostics()
            .warnings()
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(
            messages,
            vec!["option-supplied choice \"style\" has not been used in script \"test.mfsl\""]
        );
    }

    #[test]
    fn test_pass2_before_pass1_is_an_error() {
        let interpreter = fresh(&[]);
        assert!(matches!(
            interpreter.synthesize(),
            Err(ScriptError::OptionsBlockStack { .. })
        ));
    }

    struct FailingSecond {
        seen: usize,
    }

    impl CommandRunner for FailingSecond {
        fn run(&mut self, command_line: &str) -> Result<(), ExecutionError> {
            self.seen += 1;
            if self.seen == 2 {
                Err(ExecutionError::NonZeroExitStatus(command_line.to_string(), Some(1)))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_launch_without_launching_keeps_the_commands() {
        let mut interpreter = fresh(&[]);
        interpreter.run_pass1(TARGET_SCRIPT).unwrap();

        let mut runner = FailingSecond { seen: 0 };
        let options = RunOptions {
            no_launch: true,
            ..RunOptions::default()
        };
        let report = interpreter.launch(&mut runner, &options).unwrap();

        assert!(!report.launched);
        assert_eq!(runner.seen, 0);
        assert_eq!(report.commands.len(), 1);
    }

    #[test]
    fn test_launch_aggregates_failures() {
        let script = format!("{}\nselect target all;", TARGET_SCRIPT);
        let mut interpreter = fresh(&[]);
        interpreter.run_pass1(&script).unwrap();

        let mut runner = FailingSecond { seen: 0 };
        let options = RunOptions {
            inter_command_delay: Duration::ZERO,
            ..RunOptions::default()
        };
        let report = interpreter.launch(&mut runner, &options).unwrap();

        assert_eq!(runner.seen, 2);
        assert_eq!(report.commands.len(), 2);
        assert_eq!(report.executed, 2);
        assert_eq!(report.error_kind(), MusicFormatsErrorKind::InvalidFile);
    }
}
