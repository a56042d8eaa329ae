// src/bin/mfscript.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use mfscript::{
    cli::{Cli, handlers},
    models::MusicFormatsErrorKind,
};

/// The main entry point of `mfscript`.
/// It sets up logging, parses arguments, runs the script and maps the outcome to
/// the process exit code.
fn main() {
    env_logger::init();

    match run_cli(Cli::parse()) {
        Ok(kind) => std::process::exit(kind.exit_code()),
        Err(e) => {
            // Script errors and host failures alike end up here.
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run_cli(cli: Cli) -> Result<MusicFormatsErrorKind> {
    log::debug!("CLI args parsed: {:?}", cli);
    handlers::run::handle(&cli)
}
