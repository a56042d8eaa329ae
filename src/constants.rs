// src/constants.rs

/// The pseudo-label selecting every label of a choice or input.
pub const ALL_PSEUDO_LABEL: &str = "all";

/// The name given to the outermost options block of a script.
pub const MAIN_OPTIONS_BLOCK_NAME: &str = "Main options block";

/// The name used in diagnostics when the script is read from standard input.
pub const STDIN_SCRIPT_NAME: &str = "stdin";

/// The script path meaning "read the script from standard input".
pub const STDIN_SCRIPT_PATH: &str = "-";

/// The delay inserted between two consecutive service launches.
pub const DEFAULT_INTER_COMMAND_DELAY_MS: u64 = 100;

/// How often a running service process is polled for completion.
pub const PROCESS_POLL_INTERVAL_MS: u64 = 100;

/// The name of the directory holding mfscript configuration (in the user config dir).
pub const CONFIG_DIR_NAME: &str = "mfscript";

/// The name of the dialects configuration file (inside the config dir).
pub const DIALECTS_CONFIG_FILENAME: &str = "dialects.toml";

/// The dialect used when none is requested on the command line.
pub const DEFAULT_DIALECT_NAME: &str = "mfsl";

/// The MusicFormats services every built-in dialect knows about.
pub const KNOWN_MUSICFORMATS_SERVICES: &[&str] = &["xml2ly", "xml2brl", "xml2xml", "xml2gmn", "msdl"];
