use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::market::TradingRules;
use super::smoother::PriceSmoother;

/// Where the cycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Nothing decided yet
    Start,
    /// Holding quote currency, waiting for price to fall to the buy target
    Wait,
    /// Holding the base asset, waiting for price to rise to the sell target
    Hold,
    Sell,
    Buy,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStatus::Start => "start",
            TradeStatus::Wait => "wait",
            TradeStatus::Hold => "hold",
            TradeStatus::Sell => "sell",
            TradeStatus::Buy => "buy",
        };
        f.write_str(s)
    }
}

/// Mutable state of one bot process. Owned by the driver, never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub status: TradeStatus,
    /// True while the base asset is held
    pub in_trade: bool,
    pub sell_target: Decimal,
    pub buy_target: Decimal,
    pub successful_trades: u64,
    pub smoother: PriceSmoother,
    pub smoothed_start_price: Option<Decimal>,
    /// Set once the targets have been seeded
    pub initialized: bool,
    pub ticks: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::with_smoother(PriceSmoother::new())
    }

    pub fn with_smoother(smoother: PriceSmoother) -> Self {
        Self {
            status: TradeStatus::Start,
            in_trade: false,
            sell_target: Decimal::ZERO,
            buy_target: Decimal::ZERO,
            successful_trades: 0,
            smoother,
            smoothed_start_price: None,
            initialized: false,
            ticks: 0,
        }
    }

    /// Feed a price to the smoother and remember the result
    pub fn observe_price(&mut self, price: Decimal) -> Option<Decimal> {
        self.smoothed_start_price = self.smoother.observe(price);
        self.smoothed_start_price
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            in_trade: self.in_trade,
            successful_trades: self.successful_trades,
            sell_target: self.sell_target,
            buy_target: self.buy_target,
            smoothed_start_price: self.smoothed_start_price,
            ticks: self.ticks,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy of the session for logging and telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: TradeStatus,
    pub in_trade: bool,
    pub successful_trades: u64,
    pub sell_target: Decimal,
    pub buy_target: Decimal,
    pub smoothed_start_price: Option<Decimal>,
    pub ticks: u64,
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} in_trade={} trades={} sell_target={} buy_target={}",
            self.status, self.in_trade, self.successful_trades, self.sell_target, self.buy_target
        )
    }
}

/// Market facts gathered at the start of a tick
#[derive(Debug, Clone, PartialEq)]
pub struct TradingContext {
    pub current_price: Decimal,
    pub sell_fee_rate: Decimal,
    pub buy_fee_rate: Decimal,
    pub base_balance: Decimal,
    pub quote_balance: Decimal,
    /// `None` when the exchange could not supply rules this tick
    pub rules: Option<TradingRules>,
}
