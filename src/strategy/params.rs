//! Cycle Parameters
//!
//! Configuration for one buy/sell cycle on a single pair.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main cycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Exchange symbol of the pair, e.g. "BTCUSDT"
    pub pair_symbol: String,
    /// Asset being accumulated and sold
    pub base_asset: String,
    /// Asset used to price the base asset
    pub quote_asset: String,
    /// Sell target ratio over the reference price (1.01 = 1% profit)
    pub profit_multiplier: Decimal,
    /// Sell quantity used when the base balance reads zero
    pub fallback_quantity: Decimal,
    /// Delay between ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Fraction of the quote balance held back for commission when buying
    pub commission_haircut: Decimal,
    /// Fee rate used when the exchange cannot report one
    pub default_fee_rate: Decimal,
    /// Wait for a smoothed price before seeding targets
    pub smoothed_bootstrap: bool,
    /// Cap on price history used by the smoother. None keeps all samples.
    pub smoother_window: Option<usize>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            pair_symbol: "BTCUSDT".to_string(),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            profit_multiplier: dec!(1.01),
            fallback_quantity: dec!(0),
            tick_interval_ms: 3000,
            commission_haircut: dec!(0.001),
            default_fee_rate: dec!(0.001),
            smoothed_bootstrap: false,
            smoother_window: None,
        }
    }
}

impl CycleConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_profit_multiplier(mut self, multiplier: Decimal) -> Self {
        self.profit_multiplier = multiplier;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.pair_symbol.is_empty() {
            return Err(ParamsError::MissingSymbol("pair_symbol"));
        }
        if self.base_asset.is_empty() {
            return Err(ParamsError::MissingSymbol("base_asset"));
        }
        if self.quote_asset.is_empty() {
            return Err(ParamsError::MissingSymbol("quote_asset"));
        }
        // Multipliers of 2 or more would put the buy target at or below zero
        if self.profit_multiplier <= Decimal::ZERO || self.profit_multiplier >= dec!(2) {
            return Err(ParamsError::InvalidProfitMultiplier(self.profit_multiplier));
        }
        if self.fallback_quantity < Decimal::ZERO {
            return Err(ParamsError::InvalidFallbackQuantity(self.fallback_quantity));
        }
        if self.commission_haircut < Decimal::ZERO || self.commission_haircut >= Decimal::ONE {
            return Err(ParamsError::InvalidRate("commission_haircut", self.commission_haircut));
        }
        if self.default_fee_rate < Decimal::ZERO || self.default_fee_rate >= Decimal::ONE {
            return Err(ParamsError::InvalidRate("default_fee_rate", self.default_fee_rate));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} cannot be empty")]
    MissingSymbol(&'static str),
    #[error("Profit multiplier must be in (0, 2), got {0}")]
    InvalidProfitMultiplier(Decimal),
    #[error("Fallback quantity must be >= 0, got {0}")]
    InvalidFallbackQuantity(Decimal),
    #[error("{0} must be in [0, 1), got {1}")]
    InvalidRate(&'static str, Decimal),
}
