// src/cli/handlers/mod.rs

pub mod commons;
pub mod run;
