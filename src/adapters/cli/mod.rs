//! CLI Adapter
//!
//! Command-line interface for spot-cycler.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, RunCmd, TargetsCmd};
