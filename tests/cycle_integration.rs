//! Trade Cycle Integration Tests
//!
//! Drives the full buy -> hold -> sell cycle through `TradeLoopDriver`:
//! 1. Scripted prices against `MockExchange`
//! 2. Order failures and retries
//! 3. Long seeded runs against `PaperExchange`
//!
//! All tests are deterministic and make no network calls.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use spot_cycler::adapters::paper::{PaperConfig, PaperExchange};
use spot_cycler::application::{TickOutcome, TradeLoopDriver};
use spot_cycler::domain::{FeeRates, OrderSide, TradeStatus, TradingRules};
use spot_cycler::ports::MockExchange;
use spot_cycler::strategy::CycleConfig;

// ============================================================================
// Test Fixtures
// ============================================================================

fn cycle_config() -> CycleConfig {
    CycleConfig {
        pair_symbol: "BTCUSDT".to_string(),
        base_asset: "BTC".to_string(),
        quote_asset: "USDT".to_string(),
        profit_multiplier: dec!(1.01),
        fallback_quantity: dec!(0.01),
        tick_interval_ms: 1,
        commission_haircut: dec!(0.001),
        default_fee_rate: dec!(0.001),
        smoothed_bootstrap: false,
        smoother_window: None,
    }
}

fn mock_exchange(prices: &[Decimal]) -> MockExchange {
    MockExchange::new()
        .with_prices(prices)
        .with_balance("BTC", dec!(0))
        .with_balance("USDT", dec!(100))
        .with_fees(FeeRates::flat(dec!(0.001)))
        .with_rules(TradingRules {
            min_qty: dec!(0.0001),
            min_notional: dec!(5),
            step_size: dec!(0.0001),
        })
}

// ============================================================================
// Scripted Cycle
// ============================================================================

#[tokio::test]
async fn test_full_round_trip() {
    let mock = mock_exchange(&[dec!(250.25), dec!(250.25), dec!(249.90)]);
    let mut driver = TradeLoopDriver::new(cycle_config(), mock.clone()).unwrap();

    // Bootstrap: 250.25 * 1.01 * 1.001 = 253.0052525, 250.25 * 0.999 = 249.99975
    let outcome = driver.tick().await.unwrap();
    assert_eq!(
        outcome,
        TickOutcome::Seeded { sell_target: dec!(253.01), buy_target: dec!(250.00) }
    );

    // Start tick: quote balance of 100 means buy posture, no order yet
    let outcome = driver.tick().await.unwrap();
    assert_eq!(outcome, TickOutcome::Settled(TradeStatus::Buy));
    assert!(mock.orders().is_empty());

    // Price at or below buy target buys
    let outcome = driver.tick().await.unwrap();
    let receipt = match outcome {
        TickOutcome::Filled(receipt) => receipt,
        other => panic!("Expected a buy fill, got {:?}", other),
    };
    assert_eq!(receipt.side, OrderSide::Buy);
    // 100 * 0.999 / 249.90 = 0.39975.. floored to 0.0001
    assert_eq!(receipt.quantity, dec!(0.3997));

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.status, TradeStatus::Hold);
    assert!(snapshot.in_trade);
    // 249.9 * 0.99 = 247.401, minus 0.1% = 247.153599 -> 247.2
    assert_eq!(snapshot.buy_target, dec!(247.2));
    assert_eq!(snapshot.sell_target, dec!(253.01));

    mock.set_balance("BTC", dec!(0.3997));
    mock.set_balance("USDT", dec!(0.1));

    // Below sell target: hold
    mock.push_price(dec!(252.00));
    assert_eq!(driver.tick().await.unwrap(), TickOutcome::Settled(TradeStatus::Hold));

    // Above sell target: sell everything
    mock.push_price(dec!(253.50));
    let outcome = driver.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Filled(ref r) if r.side == OrderSide::Sell));

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.successful_trades, 1);
    assert!(!snapshot.in_trade);
    // 253.5 * 1.01 * 1.001 = 256.291035 -> 256.3
    assert_eq!(snapshot.sell_target, dec!(256.3));
    assert_eq!(mock.orders()[1].quantity, dec!(0.3997));

    // Flat and above buy target: wait
    mock.set_balance("BTC", dec!(0));
    mock.set_balance("USDT", dec!(101));
    assert_eq!(driver.tick().await.unwrap(), TickOutcome::Settled(TradeStatus::Wait));
    assert_eq!(driver.snapshot().successful_trades, 1);
}

#[tokio::test]
async fn test_targets_only_move_after_fills() {
    let mock = mock_exchange(&[dec!(250.25), dec!(250.25), dec!(251.00), dec!(252.50), dec!(251.75)]);
    let mut driver = TradeLoopDriver::new(cycle_config(), mock.clone()).unwrap();

    driver.tick().await.unwrap();
    let seeded = driver.snapshot();

    for _ in 0..4 {
        driver.tick().await.unwrap();
        let snapshot = driver.snapshot();
        assert_eq!(snapshot.sell_target, seeded.sell_target);
        assert_eq!(snapshot.buy_target, seeded.buy_target);
    }
    assert!(mock.orders().is_empty());
    assert_eq!(driver.snapshot().status, TradeStatus::Wait);
}

#[tokio::test]
async fn test_failed_buy_is_retried() {
    let mock = mock_exchange(&[dec!(250.25), dec!(250.25), dec!(249.90)]);
    let mut driver = TradeLoopDriver::new(cycle_config(), mock.clone()).unwrap();

    driver.tick().await.unwrap();
    driver.tick().await.unwrap();

    mock.fail_next_order();
    let outcome = driver.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::OrderFailed { side: OrderSide::Buy, .. }));

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.status, TradeStatus::Buy);
    assert!(!snapshot.in_trade);
    assert_eq!(snapshot.buy_target, dec!(250.00));

    let outcome = driver.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Filled(_)));
    assert_eq!(driver.snapshot().status, TradeStatus::Hold);
    assert_eq!(mock.orders().len(), 2);
}

#[tokio::test]
async fn test_missing_rules_do_not_stop_the_cycle() {
    let mock = MockExchange::new()
        .with_prices(&[dec!(250.25), dec!(250.25), dec!(249.90)])
        .with_balance("BTC", dec!(0))
        .with_balance("USDT", dec!(100));
    let mut driver = TradeLoopDriver::new(cycle_config(), mock.clone()).unwrap();

    for _ in 0..3 {
        driver.tick().await.unwrap();
    }

    // 99.9 / 249.9 at 8 decimals
    assert_eq!(mock.orders().len(), 1);
    assert_eq!(mock.orders()[0].quantity, dec!(0.39975990));
    assert!(driver.snapshot().in_trade);
}

// ============================================================================
// Paper Exchange
// ============================================================================

#[tokio::test]
async fn test_paper_flat_market_buys_once() {
    let paper = PaperExchange::new(
        "BTCUSDT",
        "BTC",
        "USDT",
        PaperConfig {
            start_price: dec!(123.45),
            volatility_bps: 0,
            maker_fee: dec!(0),
            taker_fee: dec!(0),
            ..PaperConfig::default()
        },
    );
    let mut driver = TradeLoopDriver::new(cycle_config(), paper.clone()).unwrap();

    for _ in 0..6 {
        driver.tick().await.unwrap();
    }

    let summary = paper.summary();
    assert_eq!(summary.fills, 1);
    assert_eq!(summary.buys, 1);
    // 1000 * 0.999 / 123.45 floored to 0.001
    assert_eq!(summary.base_balance, dec!(8.092));

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.status, TradeStatus::Hold);
    assert!(snapshot.in_trade);
    assert_eq!(snapshot.sell_target, dec!(124.68));
    assert_eq!(snapshot.buy_target, dec!(122.22));
}

#[tokio::test]
async fn test_paper_long_run_invariants() {
    let paper = PaperExchange::new(
        "BTCUSDT",
        "BTC",
        "USDT",
        PaperConfig {
            start_price: dec!(100.00),
            volatility_bps: 40,
            seed: Some(2024),
            ..PaperConfig::default()
        },
    );
    let config = CycleConfig {
        profit_multiplier: dec!(1.005),
        smoothed_bootstrap: true,
        ..cycle_config()
    };
    let mut driver = TradeLoopDriver::new(config, paper.clone()).unwrap();

    for _ in 0..1000 {
        driver.tick().await.unwrap();

        let summary = paper.summary();
        let snapshot = driver.snapshot();

        assert!(summary.base_balance >= Decimal::ZERO);
        assert!(summary.quote_balance >= Decimal::ZERO);
        assert_eq!(snapshot.successful_trades as usize, summary.sells);

        if let Some(last) = paper.fills().last() {
            assert_eq!(snapshot.in_trade, last.side == OrderSide::Buy);
        }
        if snapshot.status == TradeStatus::Hold {
            assert!(snapshot.in_trade);
        }
        if snapshot.status == TradeStatus::Wait {
            assert!(!snapshot.in_trade);
        }
    }

    assert_eq!(driver.snapshot().ticks, 1000);
}
