//! Paper Exchange Adapter
//!
//! Simulated single-pair exchange for dry runs: random-walk prices, an
//! in-memory account, full fills at the quoted price with taker fees.

mod exchange;

pub use exchange::{PaperConfig, PaperExchange, PaperFill, PaperSummary};
