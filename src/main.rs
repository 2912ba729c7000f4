//! spot-cycler - Single-pair spot cycle bot
//!
//! Runs the buy/hold/sell cycle against the paper exchange.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use spot_cycler::adapters::cli::{CliApp, Command, RunCmd, TargetsCmd};
use spot_cycler::adapters::paper::PaperExchange;
use spot_cycler::application::TradeLoopDriver;
use spot_cycler::config::load_config;
use spot_cycler::domain::TargetCalculator;
use spot_cycler::strategy::CycleConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PAIR_SYMBOL, PROFIT, SPEED_TRADE, ...)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Targets(cmd) => {
            init_logging(app.verbose, app.debug, None)?;
            targets_command(cmd)
        }
    }
}

/// CLI flags win over the configured level; `RUST_LOG` wins over both
fn init_logging(verbose: bool, debug: bool, config_level: Option<&str>) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level.unwrap_or("warn")
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;
    Ok(())
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config_path = shellexpand::tilde(&cmd.config.to_string_lossy()).to_string();
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_logging(verbose, debug, Some(&config.logging.level))?;
    tracing::info!("Starting spot-cycler...");

    if let Some(seed) = cmd.seed {
        config.paper.seed = Some(seed);
    }

    let mut cycle_config = CycleConfig::from(&config);
    if let Some(ms) = cmd.interval_ms {
        cycle_config = cycle_config.with_tick_interval_ms(ms);
    }

    let exchange = PaperExchange::new(
        &config.pair.symbol,
        &config.pair.base_asset,
        &config.pair.quote_asset,
        config.paper.clone(),
    );
    tracing::warn!("PAPER TRADING MODE - no real orders are sent");

    let mut driver = TradeLoopDriver::new(cycle_config, exchange.clone())
        .context("Failed to create trade loop driver")?;

    // Setup Ctrl+C handler
    let handle = driver.handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    let result = driver.run().await;

    let summary = exchange.summary();
    tracing::info!(
        "Session: {} | paper fills {} (buys {}, sells {}) | {} {}, {} {} | equity {} {}",
        driver.snapshot(),
        summary.fills,
        summary.buys,
        summary.sells,
        summary.base_balance,
        config.pair.base_asset,
        summary.quote_balance,
        config.pair.quote_asset,
        summary.equity,
        config.pair.quote_asset
    );

    result.context("Trading loop aborted")?;
    tracing::info!("spot-cycler stopped");
    Ok(())
}

fn targets_command(cmd: TargetsCmd) -> Result<()> {
    let calculator = TargetCalculator::new(cmd.profit)?;
    let sell = calculator.sell(cmd.price, cmd.fee)?;
    let buy = calculator.buy(cmd.price, cmd.fee)?;

    if cmd.json {
        let out = json!({
            "price": cmd.price,
            "profit_multiplier": cmd.profit,
            "fee_rate": cmd.fee,
            "sell_target": sell,
            "buy_target": buy,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Reference price: {}", cmd.price);
        println!("Sell target:     {} (x{} + {} fee)", sell, cmd.profit, cmd.fee);
        println!("Buy target:      {} (x{} - {} fee)", buy, cmd.profit, cmd.fee);
    }

    Ok(())
}
