// src/core/runner.rs

use crate::{
    constants::DEFAULT_INTER_COMMAND_DELAY_MS,
    core::synthesizer::CommandList,
    models::MusicFormatsErrorKind,
    system::executor::ExecutionError,
};
use colored::*;
use std::time::Duration;

/// Launches one synthesized command line and waits for it to finish.
pub trait CommandRunner {
    fn run(&mut self, command_line: &str) -> Result<(), ExecutionError>;
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Report the commands instead of launching them.
    pub no_launch: bool,
    /// Echo each command before launching it.
    pub display_commands: bool,
    pub inter_command_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            no_launch: false,
            display_commands: false,
            inter_command_delay: Duration::from_millis(DEFAULT_INTER_COMMAND_DELAY_MS),
        }
    }
}

#[derive(Debug)]
pub struct CommandFailure {
    pub command: String,
    pub error: ExecutionError,
}

/// The outcome of a run over a whole command list.
#[derive(Debug, Default)]
pub struct RunReport {
    /// The commands of the run, launched or not.
    pub commands: CommandList,
    pub launched: bool,
    pub executed: usize,
    pub failures: Vec<CommandFailure>,
}

impl RunReport {
    /// A single error kind for the whole run: any failing command fails the run.
    pub fn error_kind(&self) -> MusicFormatsErrorKind {
        if self.failures.is_empty() {
            MusicFormatsErrorKind::None
        } else {
            MusicFormatsErrorKind::InvalidFile
        }
    }
}

/// Runs every command in order, sleeping between two launches.
///
/// A failing command does not stop the ones after it.
pub fn run_commands(list: &CommandList, runner: &mut dyn CommandRunner, options: &RunOptions) -> RunReport {
    let mut report = RunReport {
        commands: list.clone(),
        ..RunReport::default()
    };

    if options.no_launch {
        log::debug!("No-launch mode, {} command(s) not executed", list.len());
        return report;
    }

    report.launched = true;
    for (index, command) in list.iter().enumerate() {
        if index > 0 && !options.inter_command_delay.is_zero() {
            std::thread::sleep(options.inter_command_delay);
        }
        if options.display_commands {
            println!("{} {}", "→".blue(), command.green());
        }
        log::debug!("Executing command: [{}]", command);

        report.executed += 1;
        if let Err(error) = runner.run(command) {
            log::warn!("Command [{}] failed: {}", command, error);
            report.failures.push(CommandFailure {
                command: command.to_string(),
                error,
            });
        }
    }
    report
}

/// The dry-run rendering of a command list.
pub fn dry_run_report(list: &CommandList) -> String {
    let mut lines: Vec<String> = list.iter().map(str::to_string).collect();
    let count = list.len();
    lines.push(format!(
        "The {} {} above {} *NOT* executed",
        count,
        if count == 1 { "command" } else { "commands" },
        if count == 1 { "is" } else { "are" },
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{catalog::Catalog, diagnostics::SourceLocation, options_block::OptionsBlock},
        core::synthesizer::CommandSynthesizer,
    };

    /// Records every command and fails the ones containing `fail`.
    #[derive(Default)]
    struct RecordingRunner {
        seen: Vec<String>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command_line: &str) -> Result<(), ExecutionError> {
            self.seen.push(command_line.to_string());
            if command_line.contains("fail") {
                Err(ExecutionError::NonZeroExitStatus(command_line.to_string(), Some(1)))
            } else {
                Ok(())
            }
        }
    }

    fn list_for(inputs: &[&str]) -> CommandList {
        let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
        let catalog = Catalog::new();
        let main = OptionsBlock::new("main");
        CommandSynthesizer {
            service: "xml2ly",
            input_sources: &inputs,
            main_block: &main,
            catalog: &catalog,
            selected: &[],
            case_statements_count: 0,
        }
        .synthesize(SourceLocation::new(1, 1))
        .unwrap()
    }

    fn quick() -> RunOptions {
        RunOptions {
            inter_command_delay: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_all_commands_run_in_order_despite_failures() {
        let list = list_for(&["a.xml", "fail.xml", "c.xml"]);
        let mut runner = RecordingRunner::default();

        let report = run_commands(&list, &mut runner, &quick());

        assert_eq!(
            runner.seen,
            vec!["xml2ly a.xml", "xml2ly fail.xml", "xml2ly c.xml"]
        );
        assert_eq!(report.executed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.error_kind(), MusicFormatsErrorKind::InvalidFile);
    }

    #[test]
    fn test_successful_run_has_no_error() {
        let list = list_for(&["a.xml"]);
        let mut runner = RecordingRunner::default();
        let report = run_commands(&list, &mut runner, &quick());
        assert!(report.launched);
        assert_eq!(report.error_kind(), MusicFormatsErrorKind::None);
    }

    #[test]
    fn test_no_launch_runs_nothing() {
        let list = list_for(&["a.xml", "b.xml"]);
        let mut runner = RecordingRunner::default();
        let options = RunOptions {
            no_launch: true,
            ..quick()
        };

        let report = run_commands(&list, &mut runner, &options);

        assert!(runner.seen.is_empty());
        assert!(!report.launched);
        assert_eq!(report.commands, list);
        assert_eq!(report.error_kind(), MusicFormatsErrorKind::None);
        assert!(dry_run_report(&list).ends_with("The 2 commands above are *NOT* executed"));
    }

    #[test]
    fn test_dry_run_report_singular() {
        let list = list_for(&["a.xml"]);
        assert_eq!(
            dry_run_report(&list),
            "xml2ly a.xml\nThe 1 command above is *NOT* executed"
        );
    }
}
