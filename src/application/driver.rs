//! Trade Loop Driver
//!
//! Runs the cycle against an exchange: fetch price, seed targets once,
//! decide, execute, sleep, repeat until stopped.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{
    decimals_of, floor_to_decimals, FeeRates, OrderSide, PriceSmoother, Session, SessionSnapshot,
    TargetCalculator, TargetError, TradeStatus, TradingContext, TradingRules,
};
use crate::ports::{ExchangeError, ExchangePort, OrderReceipt, OrderRequest};
use crate::strategy::{Action, CycleConfig, ParamsError, TradeStateMachine};

/// Precision used for buy quantities when the exchange gave no step size
pub const DEFAULT_QUANTITY_DECIMALS: u32 = 8;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ParamsError),
    #[error("Market data error: {0}")]
    MarketData(ExchangeError),
    #[error("Balance error: {0}")]
    Balance(ExchangeError),
    #[error("Target calculation error: {0}")]
    Target(#[from] TargetError),
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Waiting for the smoother before seeding targets
    WarmingUp { samples: usize },
    /// Targets seeded; the next tick follows without delay
    Seeded { sell_target: Decimal, buy_target: Decimal },
    /// No order this tick
    Settled(TradeStatus),
    Filled(OrderReceipt),
    /// Order rejected or skipped. Session left as it was, retried next tick.
    OrderFailed { side: OrderSide, reason: String },
}

/// Stops a running driver between ticks
#[derive(Debug, Clone)]
pub struct DriverHandle {
    is_running: Arc<RwLock<bool>>,
}

impl DriverHandle {
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to driver");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }
}

pub struct TradeLoopDriver<E: ExchangePort> {
    exchange: E,
    config: CycleConfig,
    calculator: TargetCalculator,
    machine: TradeStateMachine,
    session: Session,
    /// Last fee rates the exchange reported
    last_fees: Option<FeeRates>,
    is_running: Arc<RwLock<bool>>,
}

impl<E: ExchangePort> TradeLoopDriver<E> {
    pub fn new(config: CycleConfig, exchange: E) -> Result<Self, DriverError> {
        config.validate()?;
        let calculator = TargetCalculator::new(config.profit_multiplier)?;
        let smoother = match config.smoother_window {
            Some(window) => PriceSmoother::with_window(window),
            None => PriceSmoother::new(),
        };

        Ok(Self {
            exchange,
            config,
            calculator,
            machine: TradeStateMachine::new(),
            session: Session::with_smoother(smoother),
            last_fees: None,
            is_running: Arc::new(RwLock::new(true)),
        })
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            is_running: Arc::clone(&self.is_running),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Run ticks until stopped or a price/balance fetch fails.
    ///
    /// A stop issued before `run` is honoured: the loop exits without ticking.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        tracing::info!(
            "Starting cycle on {} - profit x{}, tick interval {:?}",
            self.config.pair_symbol,
            self.config.profit_multiplier,
            self.config.tick_interval()
        );

        while *self.is_running.read().await {
            let outcome = match self.tick().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    *self.is_running.write().await = false;
                    tracing::error!("Tick aborted: {}", e);
                    return Err(e);
                }
            };

            if matches!(outcome, TickOutcome::Seeded { .. }) {
                continue;
            }
            tokio::time::sleep(self.config.tick_interval()).await;
        }

        tracing::info!(
            "Cycle stopped after {} ticks, {} successful trades",
            self.session.ticks,
            self.session.successful_trades
        );
        Ok(())
    }

    /// Execute one iteration of the cycle
    pub async fn tick(&mut self) -> Result<TickOutcome, DriverError> {
        let price = self.fetch_price().await?;
        let rules = self.fetch_rules().await;
        let fees = self.fetch_fees().await;

        self.session.ticks += 1;
        let smoothed = self.session.observe_price(price);

        if !self.session.initialized {
            return self.bootstrap(price, smoothed, fees);
        }

        let base_balance = self
            .exchange
            .get_balance(&self.config.base_asset)
            .await
            .map_err(DriverError::Balance)?;
        let quote_balance = self
            .exchange
            .get_balance(&self.config.quote_asset)
            .await
            .map_err(DriverError::Balance)?;

        let ctx = TradingContext {
            current_price: price,
            sell_fee_rate: fees.sell_rate(),
            buy_fee_rate: fees.buy_rate(),
            base_balance,
            quote_balance,
            rules,
        };

        let decision = self.machine.decide(&self.session, &ctx);
        let previous = self.session.status;
        self.session.status = decision.status;

        let outcome = match decision.action {
            Action::Posture { in_trade } => {
                self.session.in_trade = in_trade;
                self.log_posture(previous, &ctx);
                TickOutcome::Settled(decision.status)
            }
            Action::PlaceOrder(OrderSide::Sell) => self.execute_sell(&ctx).await?,
            Action::PlaceOrder(OrderSide::Buy) => self.execute_buy(&ctx).await?,
        };

        tracing::debug!("{}", self.session.snapshot());
        Ok(outcome)
    }

    async fn fetch_price(&self) -> Result<Decimal, DriverError> {
        let price = self
            .exchange
            .get_price(&self.config.pair_symbol)
            .await
            .map_err(DriverError::MarketData)?;

        if price <= Decimal::ZERO {
            return Err(DriverError::MarketData(ExchangeError::PriceFetch {
                symbol: self.config.pair_symbol.clone(),
                reason: format!("non-positive price {}", price),
            }));
        }
        Ok(price)
    }

    async fn fetch_rules(&self) -> Option<TradingRules> {
        match self.exchange.get_trading_rules(&self.config.pair_symbol).await {
            Ok(rules) => Some(rules),
            Err(e) => {
                tracing::warn!("{} - continuing without lot-size rules", e);
                None
            }
        }
    }

    async fn fetch_fees(&mut self) -> FeeRates {
        let fallback = self
            .last_fees
            .unwrap_or_else(|| FeeRates::flat(self.config.default_fee_rate));

        match self.exchange.get_fee_rates(&self.config.pair_symbol).await {
            Ok(fees) if valid_rate(fees.maker) && valid_rate(fees.taker) => {
                self.last_fees = Some(fees);
                fees
            }
            Ok(fees) => {
                tracing::warn!(
                    "Ignoring out-of-range fee rates maker={} taker={}",
                    fees.maker,
                    fees.taker
                );
                fallback
            }
            Err(e) => {
                tracing::warn!("{} - using maker={} taker={}", e, fallback.maker, fallback.taker);
                fallback
            }
        }
    }

    fn bootstrap(
        &mut self,
        price: Decimal,
        smoothed: Option<Decimal>,
        fees: FeeRates,
    ) -> Result<TickOutcome, DriverError> {
        let reference = match smoothed {
            Some(mean) => {
                mean.round_dp_with_strategy(decimals_of(price), RoundingStrategy::MidpointAwayFromZero)
            }
            None if self.config.smoothed_bootstrap => {
                let samples = self.session.smoother.len();
                tracing::info!("Warming up price smoother ({} samples)", samples);
                return Ok(TickOutcome::WarmingUp { samples });
            }
            None => price,
        };

        let sell_target = self.calculator.sell(reference, fees.sell_rate())?;
        let buy_target = self.calculator.initial_buy(reference, fees.buy_rate())?;

        self.session.sell_target = sell_target;
        self.session.buy_target = buy_target;
        self.session.initialized = true;

        tracing::info!(
            "Targets seeded from {} - sell at {}, buy at {}",
            reference,
            sell_target,
            buy_target
        );
        Ok(TickOutcome::Seeded { sell_target, buy_target })
    }

    fn log_posture(&self, previous: TradeStatus, ctx: &TradingContext) {
        match (previous, self.session.status) {
            (TradeStatus::Start, status) => tracing::info!(
                "Initial posture: {} (quote balance {}). Buy target {}, current price {}",
                status,
                ctx.quote_balance,
                self.session.buy_target,
                ctx.current_price
            ),
            (_, TradeStatus::Hold) => tracing::info!(
                "Holding for sell target {}, current price {}",
                self.session.sell_target,
                ctx.current_price
            ),
            (_, status) => tracing::info!(
                "{}: waiting for buy target {}, current price {}",
                status,
                self.session.buy_target,
                ctx.current_price
            ),
        }
    }

    /// Full base balance, floored to the lot step when known
    fn sell_quantity(&self, ctx: &TradingContext) -> Decimal {
        if ctx.base_balance <= Decimal::ZERO {
            return self.config.fallback_quantity;
        }
        match ctx.rules {
            Some(rules) => rules.floor_to_step(ctx.base_balance),
            None => ctx.base_balance,
        }
    }

    /// Quote balance minus the commission haircut, converted at the current price
    fn buy_quantity(&self, ctx: &TradingContext) -> Decimal {
        let spend = ctx.quote_balance * (Decimal::ONE - self.config.commission_haircut);
        let raw = spend / ctx.current_price;
        match ctx.rules {
            Some(rules) if rules.step_size > Decimal::ZERO => rules.floor_to_step(raw),
            _ => floor_to_decimals(raw, DEFAULT_QUANTITY_DECIMALS),
        }
    }

    async fn execute_sell(&mut self, ctx: &TradingContext) -> Result<TickOutcome, DriverError> {
        let quantity = self.sell_quantity(ctx);
        let receipt = match self.place(OrderSide::Sell, quantity, ctx).await {
            Ok(receipt) => receipt,
            Err(outcome) => return Ok(outcome),
        };

        let executed = executed_price(&receipt, ctx);
        self.session.sell_target = self.calculator.sell(executed, ctx.sell_fee_rate)?;
        self.session.successful_trades += 1;
        self.session.in_trade = false;

        tracing::info!(
            "Sold {} {} at {} ({}). Next sell target {}",
            receipt.quantity,
            self.config.base_asset,
            executed,
            receipt.order_id,
            self.session.sell_target
        );
        Ok(TickOutcome::Filled(receipt))
    }

    async fn execute_buy(&mut self, ctx: &TradingContext) -> Result<TickOutcome, DriverError> {
        let quantity = self.buy_quantity(ctx);
        let receipt = match self.place(OrderSide::Buy, quantity, ctx).await {
            Ok(receipt) => receipt,
            Err(outcome) => return Ok(outcome),
        };

        let executed = executed_price(&receipt, ctx);
        self.session.buy_target = self.calculator.buy(executed, ctx.buy_fee_rate)?;
        self.session.in_trade = true;
        self.session.status = TradeStatus::Hold;

        tracing::info!(
            "Bought {} {} at {} ({}). Next buy target {}",
            receipt.quantity,
            self.config.base_asset,
            executed,
            receipt.order_id,
            self.session.buy_target
        );
        Ok(TickOutcome::Filled(receipt))
    }

    /// Submit a market order. Any failure comes back as the tick outcome.
    async fn place(
        &self,
        side: OrderSide,
        quantity: Decimal,
        ctx: &TradingContext,
    ) -> Result<OrderReceipt, TickOutcome> {
        if quantity <= Decimal::ZERO {
            let reason = format!("{} quantity rounds to zero", side);
            tracing::warn!("Skipping order: {}", reason);
            return Err(TickOutcome::OrderFailed { side, reason });
        }

        if let Some(rules) = ctx.rules {
            for violation in rules.violations(quantity, ctx.current_price) {
                tracing::warn!("{} order may be rejected: {}", side, violation);
            }
        }

        let order = OrderRequest::market(&self.config.pair_symbol, side, quantity);
        self.exchange.place_market_order(order).await.map_err(|e| {
            tracing::warn!("{} of {} failed, retrying next tick: {}", side, quantity, e);
            TickOutcome::OrderFailed {
                side,
                reason: e.to_string(),
            }
        })
    }
}

/// Fill price from the receipt; the tick's price when none or a non-positive one is reported
fn executed_price(receipt: &OrderReceipt, ctx: &TradingContext) -> Decimal {
    receipt
        .price
        .filter(|p| *p > Decimal::ZERO)
        .unwrap_or(ctx.current_price)
}

fn valid_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate < Decimal::ONE
}
