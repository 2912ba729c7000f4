//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, the cycle only talks to an exchange
//! through [`ExchangePort`]. Adapters implement it; `mocks` provides a
//! scripted implementation for tests and dry runs.

pub mod exchange;
pub mod mocks;

pub use exchange::{ExchangeError, ExchangePort, OrderReceipt, OrderRequest};
pub use mocks::MockExchange;
