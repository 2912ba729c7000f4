//! Trade State Machine
//!
//! Turns one price observation into the next status of the cycle.
//!
//! Transition rules once past `start`, first match wins:
//! 1. in trade, price >= sell target  -> sell
//! 2. in trade, price <= sell target  -> hold
//! 3. flat,     price <= buy target   -> buy
//! 4. flat,     price >= buy target   -> wait
//!
//! Ties therefore resolve to `sell` and `buy`.

use rust_decimal::Decimal;

use crate::domain::{OrderSide, Session, TradeStatus, TradingContext};

/// Quote balance at or above which a fresh session starts out buying
pub const MIN_QUOTE_TO_BUY: Decimal = Decimal::ONE;

/// What the driver should do with the settled status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No order. `in_trade` is set to the given value.
    Posture { in_trade: bool },
    /// Submit a market order
    PlaceOrder(OrderSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Status the session moves to this tick
    pub status: TradeStatus,
    pub action: Action,
}

/// Stateless transition function over [`Session`] and [`TradingContext`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeStateMachine;

impl TradeStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Status implied by the rules, ignoring `start` handling
    pub fn transition(
        &self,
        in_trade: bool,
        price: Decimal,
        sell_target: Decimal,
        buy_target: Decimal,
    ) -> TradeStatus {
        if in_trade {
            if price >= sell_target {
                TradeStatus::Sell
            } else {
                TradeStatus::Hold
            }
        } else if price <= buy_target {
            TradeStatus::Buy
        } else {
            TradeStatus::Wait
        }
    }

    /// Decide this tick's status and action
    pub fn decide(&self, session: &Session, ctx: &TradingContext) -> Decision {
        if session.status == TradeStatus::Start {
            return self.initial_posture(ctx.quote_balance);
        }

        let status = self.transition(
            session.in_trade,
            ctx.current_price,
            session.sell_target,
            session.buy_target,
        );

        let action = match status {
            TradeStatus::Sell => Action::PlaceOrder(OrderSide::Sell),
            TradeStatus::Buy => Action::PlaceOrder(OrderSide::Buy),
            TradeStatus::Hold => Action::Posture { in_trade: true },
            TradeStatus::Wait | TradeStatus::Start => Action::Posture { in_trade: false },
        };

        Decision { status, action }
    }

    /// First tick: holding quote currency means we buy next, otherwise
    /// assume the base asset is already held and sell next.
    fn initial_posture(&self, quote_balance: Decimal) -> Decision {
        if quote_balance >= MIN_QUOTE_TO_BUY {
            Decision {
                status: TradeStatus::Buy,
                action: Action::Posture { in_trade: false },
            }
        } else {
            Decision {
                status: TradeStatus::Sell,
                action: Action::Posture { in_trade: true },
            }
        }
    }
}
