//! Domain Layer - Core business logic for the spot cycle
//!
//! Pure types and calculations with no I/O. All exchange interaction happens
//! through the ports layer.
//!
//! - `smoother`: averaged starting price from observed prices
//! - `targets`: fee-adjusted sell/buy target prices
//! - `market`: order side, lot-size rules, fee rates
//! - `session`: per-process trading state

pub mod market;
pub mod session;
pub mod smoother;
pub mod targets;

pub use market::{floor_to_decimals, FeeRates, OrderSide, TradingRules};
pub use session::{Session, SessionSnapshot, TradeStatus, TradingContext};
pub use smoother::{PriceSmoother, MIN_SAMPLES};
pub use targets::{buy_target, decimals_of, sell_target, TargetCalculator, TargetError};
