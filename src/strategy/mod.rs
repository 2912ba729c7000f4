//! Strategy Layer - Buy low / sell high cycle on one pair
//!
//! - `params`: cycle configuration (profit multiplier, tick interval, fees)
//! - `state_machine`: start/wait/hold/sell/buy transitions

pub mod params;
pub mod state_machine;

pub use params::{CycleConfig, ParamsError};
pub use state_machine::{Action, Decision, TradeStateMachine, MIN_QUOTE_TO_BUY};
