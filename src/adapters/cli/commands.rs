//! CLI Command Definitions
//!
//! Argument structs for every spot-cycler command.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// spot-cycler - Single-pair spot cycle bot
#[derive(Parser, Debug)]
#[command(
    name = "spot-cycler",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Single-pair spot cycle bot",
    long_about = "spot-cycler buys when price falls to a fee-adjusted buy target, holds until \
                  price reaches the sell target, sells, and repeats."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the trading loop against the paper exchange
    Run(RunCmd),

    /// Print sell and buy targets for a reference price
    Targets(TargetsCmd),
}

/// Start trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/cycle.toml")]
    pub config: PathBuf,

    /// Override the tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Override the paper exchange price seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

/// Compute targets
#[derive(Parser, Debug)]
pub struct TargetsCmd {
    /// Reference price, e.g. 12.345
    #[arg(value_name = "PRICE")]
    pub price: Decimal,

    /// Profit multiplier (1.01 = 1%)
    #[arg(long, value_name = "MULTIPLIER", default_value = "1.01")]
    pub profit: Decimal,

    /// Fee rate applied to both targets
    #[arg(long, value_name = "RATE", default_value = "0.001")]
    pub fee: Decimal,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
