use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::exchange::{ExchangeError, ExchangePort, OrderReceipt, OrderRequest};
use crate::domain::{FeeRates, TradingRules};

#[derive(Debug, Default)]
struct MockState {
    prices: VecDeque<Decimal>,
    last_price: Option<Decimal>,
    balances: HashMap<String, Decimal>,
    rules: Option<TradingRules>,
    fees: Option<FeeRates>,
    /// Outcome of upcoming orders, front first. Empty means success.
    order_outcomes: VecDeque<bool>,
    orders: Vec<OrderRequest>,
    price_calls: usize,
    /// Price reported on receipts instead of the last quoted price
    fill_price: Option<Decimal>,
}

/// Scripted exchange that records calls and returns controlled responses.
///
/// Prices are served from a queue; once it runs dry the last price repeats.
/// Cloning shares state so a test can keep a handle after moving the mock
/// into a driver.
#[derive(Debug, Default, Clone)]
pub struct MockExchange {
    state: Arc<Mutex<MockState>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue prices
    pub fn with_prices(self, prices: &[Decimal]) -> Self {
        self.state.lock().unwrap().prices.extend(prices.iter().copied());
        self
    }

    /// Builder method to set a free balance
    pub fn with_balance(self, asset: &str, amount: Decimal) -> Self {
        self.set_balance(asset, amount);
        self
    }

    pub fn with_rules(self, rules: TradingRules) -> Self {
        self.state.lock().unwrap().rules = Some(rules);
        self
    }

    pub fn with_fees(self, fees: FeeRates) -> Self {
        self.state.lock().unwrap().fees = Some(fees);
        self
    }

    /// Report `price` on every order receipt
    pub fn with_fill_price(self, price: Decimal) -> Self {
        self.state.lock().unwrap().fill_price = Some(price);
        self
    }

    /// Replace the reported fee rates. `None` makes fee lookups fail.
    pub fn set_fees(&self, fees: Option<FeeRates>) {
        self.state.lock().unwrap().fees = fees;
    }

    pub fn push_price(&self, price: Decimal) {
        self.state.lock().unwrap().prices.push_back(price);
    }

    pub fn set_balance(&self, asset: &str, amount: Decimal) {
        self.state.lock().unwrap().balances.insert(asset.to_string(), amount);
    }

    /// Make the next order fail
    pub fn fail_next_order(&self) {
        self.state.lock().unwrap().order_outcomes.push_back(false);
    }

    /// Get all submitted orders, including failed ones
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn price_calls(&self) -> usize {
        self.state.lock().unwrap().price_calls
    }
}

#[async_trait]
impl ExchangePort for MockExchange {
    async fn get_price(&self, pair_symbol: &str) -> Result<Decimal, ExchangeError> {
        let mut state = self.state.lock().unwrap();
        state.price_calls += 1;
        if let Some(price) = state.prices.pop_front() {
            state.last_price = Some(price);
        }
        state.last_price.ok_or_else(|| ExchangeError::PriceFetch {
            symbol: pair_symbol.to_string(),
            reason: "No price configured".to_string(),
        })
    }

    async fn get_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(asset)
            .copied()
            .ok_or_else(|| ExchangeError::BalanceFetch {
                asset: asset.to_string(),
                reason: "No balance configured".to_string(),
            })
    }

    async fn get_trading_rules(&self, pair_symbol: &str) -> Result<TradingRules, ExchangeError> {
        self.state.lock().unwrap().rules.ok_or_else(|| ExchangeError::RulesFetch {
            symbol: pair_symbol.to_string(),
            reason: "No rules configured".to_string(),
        })
    }

    async fn get_fee_rates(&self, pair_symbol: &str) -> Result<FeeRates, ExchangeError> {
        self.state.lock().unwrap().fees.ok_or_else(|| ExchangeError::FeeFetch {
            symbol: pair_symbol.to_string(),
            reason: "No fees configured".to_string(),
        })
    }

    async fn place_market_order(&self, order: OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        let mut state = self.state.lock().unwrap();
        state.orders.push(order.clone());
        let succeed = state.order_outcomes.pop_front().unwrap_or(true);
        if !succeed {
            return Err(ExchangeError::OrderPlacement(format!(
                "{} {} rejected by mock",
                order.side, order.quantity
            )));
        }

        Ok(OrderReceipt {
            order_id: format!("mock-{}", state.orders.len()),
            side: order.side,
            quantity: order.quantity,
            price: state.fill_price.or(state.last_price),
            timestamp: Utc::now(),
        })
    }
}
