use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FeeRates, OrderSide, TradingRules};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Price fetch failed for {symbol}: {reason}")]
    PriceFetch { symbol: String, reason: String },
    #[error("Balance fetch failed for {asset}: {reason}")]
    BalanceFetch { asset: String, reason: String },
    #[error("Trading rules unavailable for {symbol}: {reason}")]
    RulesFetch { symbol: String, reason: String },
    #[error("Fee rates unavailable for {symbol}: {reason}")]
    FeeFetch { symbol: String, reason: String },
    #[error("Order placement failed: {0}")]
    OrderPlacement(String),
}

/// Market order to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub pair_symbol: String,
    pub side: OrderSide,
    /// Base asset quantity
    pub quantity: Decimal,
}

impl OrderRequest {
    pub fn market(pair_symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            pair_symbol: pair_symbol.to_string(),
            side,
            quantity,
        }
    }
}

/// Exchange acknowledgement of a filled market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Average fill price, when the exchange reports it
    pub price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Everything the cycle needs from an exchange.
///
/// Calls carry no timeout here; adapters are expected to bound their own I/O.
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Current market price of the pair
    async fn get_price(&self, pair_symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Free balance of a single asset
    async fn get_balance(&self, asset: &str) -> Result<Decimal, ExchangeError>;

    async fn get_trading_rules(&self, pair_symbol: &str) -> Result<TradingRules, ExchangeError>;

    async fn get_fee_rates(&self, pair_symbol: &str) -> Result<FeeRates, ExchangeError>;

    async fn place_market_order(&self, order: OrderRequest) -> Result<OrderReceipt, ExchangeError>;
}
