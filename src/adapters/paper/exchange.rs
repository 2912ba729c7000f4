use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::{FeeRates, OrderSide, TradingRules};
use crate::ports::{ExchangeError, ExchangePort, OrderReceipt, OrderRequest};

/// Simulated market and account parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub start_price: Decimal,
    /// Maximum price move per quote, in basis points
    pub volatility_bps: u32,
    /// Decimals quoted prices are rounded to
    pub price_decimals: u32,
    pub base_balance: Decimal,
    pub quote_balance: Decimal,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    pub min_qty: Decimal,
    pub min_notional: Decimal,
    pub step_size: Decimal,
    /// Fixed seed for reproducible price paths
    pub seed: Option<u64>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            start_price: dec!(100.00),
            volatility_bps: 25,
            price_decimals: 2,
            base_balance: dec!(0),
            quote_balance: dec!(1000),
            maker_fee: dec!(0.001),
            taker_fee: dec!(0.001),
            min_qty: dec!(0.001),
            min_notional: dec!(5),
            step_size: dec!(0.001),
            seed: None,
        }
    }
}

/// A simulated fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperFill {
    pub order_id: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Commission, in the asset received
    pub fee: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub fills: usize,
    pub buys: usize,
    pub sells: usize,
    pub base_balance: Decimal,
    pub quote_balance: Decimal,
    pub last_price: Decimal,
    /// Quote balance plus base balance marked at the last price
    pub equity: Decimal,
}

#[derive(Debug)]
struct PaperState {
    rng: StdRng,
    price: Decimal,
    balances: HashMap<String, Decimal>,
    fills: Vec<PaperFill>,
}

/// In-memory exchange with a bounded random-walk price.
///
/// Market orders fill in full at the last quoted price. Buys pay the taker
/// fee in the base asset, sells pay it in the quote asset.
#[derive(Debug, Clone)]
pub struct PaperExchange {
    pair_symbol: String,
    base_asset: String,
    quote_asset: String,
    config: PaperConfig,
    state: Arc<Mutex<PaperState>>,
}

impl PaperExchange {
    pub fn new(pair_symbol: &str, base_asset: &str, quote_asset: &str, config: PaperConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut balances = HashMap::new();
        balances.insert(base_asset.to_string(), config.base_balance);
        balances.insert(quote_asset.to_string(), config.quote_balance);

        let state = PaperState {
            rng,
            price: config.start_price,
            balances,
            fills: Vec::new(),
        };

        Self {
            pair_symbol: pair_symbol.to_string(),
            base_asset: base_asset.to_string(),
            quote_asset: quote_asset.to_string(),
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn fills(&self) -> Vec<PaperFill> {
        self.lock().fills.clone()
    }

    pub fn summary(&self) -> PaperSummary {
        let state = self.lock();
        let base = state.balances.get(&self.base_asset).copied().unwrap_or_default();
        let quote = state.balances.get(&self.quote_asset).copied().unwrap_or_default();
        let buys = state.fills.iter().filter(|f| f.side == OrderSide::Buy).count();

        PaperSummary {
            fills: state.fills.len(),
            buys,
            sells: state.fills.len() - buys,
            base_balance: base,
            quote_balance: quote,
            last_price: state.price,
            equity: quote + base * state.price,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_symbol(&self, pair_symbol: &str) -> Result<(), String> {
        if pair_symbol == self.pair_symbol {
            Ok(())
        } else {
            Err(format!("unknown pair {}", pair_symbol))
        }
    }

    fn next_price(&self, state: &mut PaperState) -> Decimal {
        let vol = i64::from(self.config.volatility_bps);
        let step_bps = if vol == 0 { 0 } else { state.rng.gen_range(-vol..=vol) };
        let factor = Decimal::ONE + Decimal::new(step_bps, 4);
        let tick = Decimal::new(1, self.config.price_decimals);

        let next = (state.price * factor)
            .round_dp_with_strategy(self.config.price_decimals, RoundingStrategy::MidpointAwayFromZero);
        next.max(tick)
    }
}

#[async_trait]
impl ExchangePort for PaperExchange {
    async fn get_price(&self, pair_symbol: &str) -> Result<Decimal, ExchangeError> {
        self.check_symbol(pair_symbol).map_err(|reason| ExchangeError::PriceFetch {
            symbol: pair_symbol.to_string(),
            reason,
        })?;

        let mut state = self.lock();
        let price = self.next_price(&mut state);
        state.price = price;
        Ok(price)
    }

    async fn get_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        self.lock()
            .balances
            .get(asset)
            .copied()
            .ok_or_else(|| ExchangeError::BalanceFetch {
                asset: asset.to_string(),
                reason: "asset not held in paper account".to_string(),
            })
    }

    async fn get_trading_rules(&self, pair_symbol: &str) -> Result<TradingRules, ExchangeError> {
        self.check_symbol(pair_symbol).map_err(|reason| ExchangeError::RulesFetch {
            symbol: pair_symbol.to_string(),
            reason,
        })?;

        Ok(TradingRules {
            min_qty: self.config.min_qty,
            min_notional: self.config.min_notional,
            step_size: self.config.step_size,
        })
    }

    async fn get_fee_rates(&self, pair_symbol: &str) -> Result<FeeRates, ExchangeError> {
        self.check_symbol(pair_symbol).map_err(|reason| ExchangeError::FeeFetch {
            symbol: pair_symbol.to_string(),
            reason,
        })?;

        Ok(FeeRates {
            maker: self.config.maker_fee,
            taker: self.config.taker_fee,
        })
    }

    async fn place_market_order(&self, order: OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        self.check_symbol(&order.pair_symbol)
            .map_err(ExchangeError::OrderPlacement)?;
        if order.quantity <= Decimal::ZERO {
            return Err(ExchangeError::OrderPlacement(format!(
                "invalid quantity {}",
                order.quantity
            )));
        }

        let mut state = self.lock();
        let price = state.price;
        let base = state.balances.get(&self.base_asset).copied().unwrap_or_default();
        let quote = state.balances.get(&self.quote_asset).copied().unwrap_or_default();
        let notional = order.quantity * price;

        let (new_base, new_quote, fee) = match order.side {
            OrderSide::Buy => {
                if notional > quote {
                    return Err(ExchangeError::OrderPlacement(format!(
                        "insufficient {}: need {}, have {}",
                        self.quote_asset, notional, quote
                    )));
                }
                let fee = order.quantity * self.config.taker_fee;
                (base + order.quantity - fee, quote - notional, fee)
            }
            OrderSide::Sell => {
                if order.quantity > base {
                    return Err(ExchangeError::OrderPlacement(format!(
                        "insufficient {}: need {}, have {}",
                        self.base_asset, order.quantity, base
                    )));
                }
                let fee = notional * self.config.taker_fee;
                (base - order.quantity, quote + notional - fee, fee)
            }
        };

        state.balances.insert(self.base_asset.clone(), new_base);
        state.balances.insert(self.quote_asset.clone(), new_quote);

        let order_id = format!("paper-{}", state.fills.len() + 1);
        state.fills.push(PaperFill {
            order_id: order_id.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            fee,
        });

        tracing::info!(
            "PAPER {} {} {} at {} (fee {})",
            order.side,
            order.quantity,
            self.base_asset,
            price,
            fee
        );

        Ok(OrderReceipt {
            order_id,
            side: order.side,
            quantity: order.quantity,
            price: Some(price),
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(seed: u64) -> PaperExchange {
        let config = PaperConfig {
            seed: Some(seed),
            ..PaperConfig::default()
        };
        PaperExchange::new("BTCUSDT", "BTC", "USDT", config)
    }

    #[tokio::test]
    async fn test_price_walk_is_bounded_and_rounded() {
        let exchange = paper(7);
        let mut last = dec!(100.00);

        for _ in 0..200 {
            let price = exchange.get_price("BTCUSDT").await.unwrap();
            assert!(price > Decimal::ZERO);
            assert!(price.scale() <= 2);
            // 25 bps max move plus rounding
            assert!((price - last).abs() <= last * dec!(0.0025) + dec!(0.01));
            last = price;
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_path() {
        let a = paper(42);
        let b = paper(42);
        for _ in 0..20 {
            assert_eq!(
                a.get_price("BTCUSDT").await.unwrap(),
                b.get_price("BTCUSDT").await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_zero_volatility_is_flat() {
        let config = PaperConfig {
            volatility_bps: 0,
            ..PaperConfig::default()
        };
        let exchange = PaperExchange::new("BTCUSDT", "BTC", "USDT", config);
        assert_eq!(exchange.get_price("BTCUSDT").await.unwrap(), dec!(100));
        assert_eq!(exchange.get_price("BTCUSDT").await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_buy_then_sell_updates_balances() {
        let config = PaperConfig {
            volatility_bps: 0,
            ..PaperConfig::default()
        };
        let exchange = PaperExchange::new("BTCUSDT", "BTC", "USDT", config);
        exchange.get_price("BTCUSDT").await.unwrap();

        let receipt = exchange
            .place_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(2)))
            .await
            .unwrap();
        assert_eq!(receipt.price, Some(dec!(100)));
        assert_eq!(exchange.get_balance("USDT").await.unwrap(), dec!(800));
        // 0.1% taker fee taken in BTC
        assert_eq!(exchange.get_balance("BTC").await.unwrap(), dec!(1.998));

        exchange
            .place_market_order(OrderRequest::market("BTCUSDT", OrderSide::Sell, dec!(1.998)))
            .await
            .unwrap();
        assert_eq!(exchange.get_balance("BTC").await.unwrap(), dec!(0));
        // 199.8 - 0.1998 fee
        assert_eq!(exchange.get_balance("USDT").await.unwrap(), dec!(999.6002));

        let summary = exchange.summary();
        assert_eq!(summary.fills, 2);
        assert_eq!(summary.buys, 1);
        assert_eq!(summary.sells, 1);
        assert_eq!(summary.equity, dec!(999.6002));
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected() {
        let exchange = paper(1);

        let result = exchange
            .place_market_order(OrderRequest::market("BTCUSDT", OrderSide::Sell, dec!(1)))
            .await;
        assert!(matches!(result, Err(ExchangeError::OrderPlacement(_))));

        let result = exchange
            .place_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(100)))
            .await;
        assert!(matches!(result, Err(ExchangeError::OrderPlacement(_))));
        assert!(exchange.fills().is_empty());
    }

    #[test]
    fn test_unknown_pair() {
        let exchange = paper(1);
        let result = tokio_test::block_on(exchange.get_price("ETHUSDT"));
        assert!(matches!(result, Err(ExchangeError::PriceFetch { .. })));

        let rules = tokio_test::block_on(exchange.get_trading_rules("BTCUSDT")).unwrap();
        assert_eq!(rules.step_size, dec!(0.001));
    }
}
