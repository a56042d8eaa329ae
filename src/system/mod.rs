//! # System Interaction Layer
//!
//! This module is the boundary between the interpreter core and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns a synthesized service command as a child process and waits
//!   for it, optionally killing it when a timeout expires. `SystemRunner` plugs it into
//!   the core's `CommandRunner` seam.
//! - **`dialects_config`**: loads `dialects.toml`, which describes the scripting dialects
//!   and the MusicFormats services each one knows about.

pub mod dialects_config;
pub mod executor;
