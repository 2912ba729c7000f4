//! spot-cycler - Single-pair spot cycle bot library
//!
//! Buys when price falls to a fee-adjusted buy target, holds until it
//! reaches the sell target, sells, and repeats.
//!
//! # Modules
//!
//! - `domain`: Core business logic (PriceSmoother, targets, Session)
//! - `ports`: Trait abstractions (ExchangePort) and the mock exchange
//! - `strategy`: Cycle parameters and the trade state machine
//! - `adapters`: External implementations (paper exchange, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Trade loop driver

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
