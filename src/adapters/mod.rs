//! Adapters Layer - External System Implementations
//!
//! - Paper: simulated exchange implementing `ExchangePort`
//! - CLI: Command-line interface definitions

pub mod cli;
pub mod paper;

pub use cli::CliApp;
pub use paper::{PaperConfig, PaperExchange};
