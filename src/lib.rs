//! Interpreter for the MusicFormats command-scripting languages.
//!
//! A script names a service, its input sources and its options, and may declare
//! choices whose labels each carry their own options. Reading the script (pass 1)
//! builds those tables; pass 2 turns the selected labels into service command lines
//! and launches them one after the other.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
