//! Target Price Calculator
//!
//! Fee-adjusted sell and buy targets for one round trip.
//!
//! sell = round(p * m * (1 + f), decimals(p))
//! buy  = round(p * (2 - m) * (1 - f), decimals(p))
//!
//! Both targets keep the precision of the reference price so they compare
//! cleanly against the prices the exchange quotes.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TargetError {
    #[error("Reference price must be > 0, got {0}")]
    InvalidPrice(Decimal),
    #[error("Profit multiplier must be > 0, got {0}")]
    InvalidMultiplier(Decimal),
    #[error("Fee rate must be in [0, 1), got {0}")]
    InvalidFeeRate(Decimal),
}

/// Number of digits after the decimal point in the shortest textual form of `price`.
///
/// Trailing zeros do not count: `12.50` has one decimal, `100` has none.
pub fn decimals_of(price: Decimal) -> u32 {
    price.normalize().scale()
}

fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Price at which an open position should be sold.
///
/// The fee is added on top of the profit-scaled price so the exit covers its own commission.
pub fn sell_target(price: Decimal, profit_multiplier: Decimal, fee_rate: Decimal) -> Decimal {
    let base = price * profit_multiplier;
    let fee = base * fee_rate;
    round_to(base + fee, decimals_of(price))
}

/// Price at which quote currency should be spent on the base asset again.
///
/// Mirror of [`sell_target`]: the profit margin is taken below the reference
/// and the fee is subtracted.
pub fn buy_target(price: Decimal, profit_multiplier: Decimal, fee_rate: Decimal) -> Decimal {
    let adjusted = price * (Decimal::ONE - (profit_multiplier - Decimal::ONE));
    let fee = adjusted * fee_rate;
    round_to(adjusted - fee, decimals_of(price))
}

/// Validated pair of parameters for repeated target calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCalculator {
    profit_multiplier: Decimal,
}

impl TargetCalculator {
    pub fn new(profit_multiplier: Decimal) -> Result<Self, TargetError> {
        if profit_multiplier <= Decimal::ZERO {
            return Err(TargetError::InvalidMultiplier(profit_multiplier));
        }
        Ok(Self { profit_multiplier })
    }

    pub fn profit_multiplier(&self) -> Decimal {
        self.profit_multiplier
    }

    pub fn sell(&self, price: Decimal, fee_rate: Decimal) -> Result<Decimal, TargetError> {
        check_inputs(price, fee_rate)?;
        Ok(sell_target(price, self.profit_multiplier, fee_rate))
    }

    pub fn buy(&self, price: Decimal, fee_rate: Decimal) -> Result<Decimal, TargetError> {
        check_inputs(price, fee_rate)?;
        Ok(buy_target(price, self.profit_multiplier, fee_rate))
    }

    /// Buy target used when seeding a fresh session: no profit margin, fee only.
    pub fn initial_buy(&self, price: Decimal, fee_rate: Decimal) -> Result<Decimal, TargetError> {
        check_inputs(price, fee_rate)?;
        Ok(buy_target(price, Decimal::ONE, fee_rate))
    }
}

fn check_inputs(price: Decimal, fee_rate: Decimal) -> Result<(), TargetError> {
    if price <= Decimal::ZERO {
        return Err(TargetError::InvalidPrice(price));
    }
    if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
        return Err(TargetError::InvalidFeeRate(fee_rate));
    }
    Ok(())
}
