// src/core/mod.rs

//! The interpreter core: everything between the script text and the command list.

pub mod block_stack;
pub mod case_statement;
pub mod catalog;
pub mod diagnostics;
pub mod dialect;
pub mod interpreter;
pub mod lexer;
pub mod options_block;
pub mod parser;
pub mod paths;
pub mod runner;
pub mod selection;
pub mod synthesizer;
