// src/cli/handlers/run.rs

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::time::Duration;

use crate::{
    cli::{Cli, handlers::commons},
    core::{
        interpreter::Interpreter,
        runner::{CommandRunner, RunOptions, dry_run_report},
        selection::CliOverrideMap,
    },
    models::MusicFormatsErrorKind,
    system::executor::SystemRunner,
};

/// Main entry point: reads and runs the script named on the command line.
pub fn handle(cli: &Cli) -> Result<MusicFormatsErrorKind> {
    let mut runner = SystemRunner::new(cli.timeout.map(Duration::from_secs));
    handle_with_runner(cli, &mut runner)
}

/// Same as [`handle`], launching the commands through `runner`.
pub fn handle_with_runner(cli: &Cli, runner: &mut dyn CommandRunner) -> Result<MusicFormatsErrorKind> {
    // 1. Host-side setup: dialect and select overrides.
    let dialect = commons::load_dialect(&cli.dialect, cli.config.as_deref())?;
    let overrides = match CliOverrideMap::from_entries(&cli.select) {
        Ok(overrides) => overrides,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return Ok(MusicFormatsErrorKind::InvalidOption);
        }
    };

    // 2. Pass 1.
    let script = commons::read_script(&cli.script)?;
    log::debug!("Running {} script '{}'", dialect.name, script.name);
    let mut interpreter =
        Interpreter::new(dialect, &script.name, overrides).with_host_input_sources(cli.input.clone());

    let pass1 = interpreter.run_pass1(&script.text);
    interpreter.diagnostics().report();
    if let Err(e) = pass1 {
        return Err(anyhow!(interpreter.diagnostics().render_error(&e)));
    }

    // 3. Pass 2.
    let options = RunOptions {
        no_launch: cli.no_launch,
        display_commands: cli.display_commands,
        inter_command_delay: Duration::from_millis(cli.delay_ms),
    };
    let report = interpreter
        .launch(runner, &options)
        .map_err(|e| anyhow!(interpreter.diagnostics().render_error(&e)))?;

    if !report.launched {
        if cli.json {
            let json = serde_json::to_string_pretty(&report.commands).context("Failed to serialize the commands")?;
            println!("{}", json);
        } else {
            println!("{}", dry_run_report(&report.commands));
        }
        return Ok(MusicFormatsErrorKind::None);
    }

    for failure in &report.failures {
        eprintln!("{} {}", "✗".red(), failure.error);
    }
    if report.failures.is_empty() {
        log::debug!("{} command(s) executed", report.executed);
    } else {
        let summary = format!("{} of {} command(s) failed", report.failures.len(), report.executed);
        println!("{}", summary.yellow());
    }
    Ok(report.error_kind())
}
