pub mod driver;

pub use driver::{DriverError, DriverHandle, TickOutcome, TradeLoopDriver, DEFAULT_QUANTITY_DECIMALS};
