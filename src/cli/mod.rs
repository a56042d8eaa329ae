use clap::Parser;
use std::path::PathBuf;

use crate::constants::{DEFAULT_DIALECT_NAME, DEFAULT_INTER_COMMAND_DELAY_MS};

pub mod handlers;

/// mfscript: runs MusicFormats command scripts (mfsl, ischeme, mfFind, stringFilter).
///
/// The script names a service, its input sources and options, and may declare choices
/// whose labels carry their own options. One service command is launched per input
/// source and per selected label.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The script to run, or `-` to read it from standard input.
    pub script: String,

    /// The scripting dialect the script is written in.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_DIALECT_NAME)]
    pub dialect: String,

    /// A dialects file to use instead of the one in the config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Selects a label for a choice or input, overriding every `select` in the script.
    /// May be repeated; `NAME:LABEL` is accepted too.
    #[arg(short, long = "select", visible_alias = "sel", value_name = "NAME=LABEL")]
    pub select: Vec<String>,

    /// An input source replacing the script's own `input` sources. May be repeated.
    #[arg(long, value_name = "SOURCE")]
    pub input: Vec<String>,

    /// Only display the commands, do not launch them.
    #[arg(long)]
    pub no_launch: bool,

    /// Display each command before launching it.
    #[arg(long)]
    pub display_commands: bool,

    /// With `--no-launch`, print the commands as JSON.
    #[arg(long, requires = "no_launch")]
    pub json: bool,

    /// Milliseconds to wait between two launched commands.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INTER_COMMAND_DELAY_MS)]
    pub delay_ms: u64,

    /// Kill a launched command after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mfscript", "score.mfsl"]).unwrap();
        assert_eq!(cli.script, "score.mfsl");
        assert_eq!(cli.dialect, "mfsl");
        assert_eq!(cli.delay_ms, 100);
        assert!(cli.select.is_empty());
        assert!(cli.timeout.is_none());
        assert!(!cli.no_launch);
    }

    #[test]
    fn test_repeated_selects_and_inputs() {
        let cli = Cli::try_parse_from([
            "mfscript", "-s", "target=pdf", "--select", "size:large", "--sel", "voice=alto",
            "--input", "a.xml", "--input", "b.xml", "-",
        ])
        .unwrap();
        assert_eq!(cli.select, vec!["target=pdf", "size:large", "voice=alto"]);
        assert_eq!(cli.input, vec!["a.xml", "b.xml"]);
        assert_eq!(cli.script, "-");
    }

    #[test]
    fn test_json_requires_no_launch() {
        assert!(Cli::try_parse_from(["mfscript", "--json", "s.mfsl"]).is_err());
        assert!(Cli::try_parse_from(["mfscript", "--no-launch", "--json", "s.mfsl"]).is_ok());
    }
}
