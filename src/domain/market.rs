use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order direction on the traded pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Spend quote currency on the base asset
    Buy,
    /// Sell the base asset for quote currency
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Exchange lot-size and notional constraints for a pair.
///
/// Advisory only: the cycle logs when an order breaks them but still submits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingRules {
    pub min_qty: Decimal,
    pub min_notional: Decimal,
    /// Quantity increment, e.g. 0.001
    pub step_size: Decimal,
}

impl TradingRules {
    /// Floor `quantity` to a multiple of the step size
    pub fn floor_to_step(&self, quantity: Decimal) -> Decimal {
        if self.step_size <= Decimal::ZERO {
            return quantity;
        }
        (quantity / self.step_size).floor() * self.step_size
    }

    /// Reasons an order of `quantity` at `price` would be rejected by a strict exchange
    pub fn violations(&self, quantity: Decimal, price: Decimal) -> Vec<String> {
        let mut out = Vec::new();
        if quantity < self.min_qty {
            out.push(format!("quantity {} below min_qty {}", quantity, self.min_qty));
        }
        let notional = quantity * price;
        if notional < self.min_notional {
            out.push(format!("notional {} below min_notional {}", notional, self.min_notional));
        }
        out
    }
}

/// Floor to a fixed number of decimals, used when no step size is known
pub fn floor_to_decimals(quantity: Decimal, dp: u32) -> Decimal {
    quantity.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Commission fractions charged by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker: Decimal,
    pub taker: Decimal,
}

impl FeeRates {
    pub fn flat(rate: Decimal) -> Self {
        Self { maker: rate, taker: rate }
    }

    /// Rate applied to the sell target
    pub fn sell_rate(&self) -> Decimal {
        self.taker
    }

    /// Rate applied to the buy target
    pub fn buy_rate(&self) -> Decimal {
        self.maker
    }
}
