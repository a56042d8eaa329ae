// EN: src/system/executor.rs

use crate::{constants::PROCESS_POLL_INTERVAL_MS, core::runner::CommandRunner};
use std::process::{Command as StdCommand, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error(
        "Command '{0}' exited with a non-zero error code ({status})",
        status = .1.map_or("killed by a signal".to_string(), |code| code.to_string())
    )]
    NonZeroExitStatus(String, Option<i32>),
    #[error("Command '{command}' did not finish within {seconds} seconds and was killed.")]
    TimedOut { command: String, seconds: u64 },
}

/// Executes a service command line and waits for it to finish.
/// The command is split with shell quoting rules but no shell is involved.
/// With a `timeout`, a command still running when it expires is killed.
pub fn execute_command(command_line: &str, timeout: Option<Duration>) -> Result<(), ExecutionError> {
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let parts = shlex::split(trimmed_command)
        .ok_or_else(|| ExecutionError::CommandParse(trimmed_command.to_string()))?;
    let (program, args) = parts.split_first().ok_or(ExecutionError::EmptyCommand)?;

    let mut child = StdCommand::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

    let started = Instant::now();

    // Non-blocking wait loop to allow for the timeout.
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return Err(ExecutionError::NonZeroExitStatus(
                        trimmed_command.to_string(),
                        status.code(),
                    ));
                }
                return Ok(());
            }
            Ok(None) => {
                if let Some(limit) = timeout {
                    if started.elapsed() >= limit {
                        log::debug!(
                            "Timeout reached, killing child process (PID: {})...",
                            child.id()
                        );
                        if let Err(e) = child.kill() {
                            log::warn!("Failed to kill child process {}: {}", child.id(), e);
                        }
                        child.wait().ok();
                        return Err(ExecutionError::TimedOut {
                            command: trimmed_command.to_string(),
                            seconds: limit.as_secs(),
                        });
                    }
                }
                std::thread::sleep(Duration::from_millis(PROCESS_POLL_INTERVAL_MS));
            }
            Err(e) => {
                return Err(ExecutionError::CommandFailed(
                    trimmed_command.to_string(),
                    e,
                ));
            }
        }
    }
}

/// Launches commands as real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    pub timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command_line: &str) -> Result<(), ExecutionError> {
        execute_command(command_line, self.timeout)
    }
}
