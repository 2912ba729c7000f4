//! Configuration Loader
//!
//! Loads and validates configuration from TOML files, then applies the
//! environment overrides (`PAIR_SYMBOL`, `BASE_COIN`, `QUOTE_COIN`, `PROFIT`,
//! `QUANTITY`, `SPEED_TRADE`).

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::adapters::paper::PaperConfig;
use crate::strategy::params::CycleConfig;

/// Main configuration structure matching cycle.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pair: PairSection,
    pub cycle: CycleSection,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Traded pair
#[derive(Debug, Clone, Deserialize)]
pub struct PairSection {
    /// Exchange symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Asset bought and sold
    pub base_asset: String,
    /// Asset prices are quoted in
    pub quote_asset: String,
}

/// Cycle parameters
#[derive(Debug, Clone, Deserialize)]
pub struct CycleSection {
    /// Sell target ratio over the reference price
    pub profit_multiplier: Decimal,
    /// Sell quantity used when the base balance reads zero
    #[serde(default)]
    pub fallback_quantity: Decimal,
    /// Delay between ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fraction of the quote balance kept back for commission on buys
    #[serde(default = "default_rate")]
    pub commission_haircut: Decimal,
    /// Fee rate used while the exchange reports none
    #[serde(default = "default_rate")]
    pub default_fee_rate: Decimal,
    #[serde(default)]
    pub smoothed_bootstrap: bool,
    #[serde(default)]
    pub smoother_window: Option<usize>,
}

fn default_tick_interval_ms() -> u64 {
    3000
}

fn default_rate() -> Decimal {
    Decimal::new(1, 3)
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    EnvError { key: &'static str, value: String },
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file with environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Apply overrides from `lookup`, which maps an env var name to its value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PAIR_SYMBOL") {
            self.pair.symbol = v;
        }
        if let Some(v) = lookup("BASE_COIN") {
            self.pair.base_asset = v;
        }
        if let Some(v) = lookup("QUOTE_COIN") {
            self.pair.quote_asset = v;
        }
        if let Some(v) = lookup("PROFIT") {
            self.cycle.profit_multiplier = parse_env("PROFIT", &v)?;
        }
        if let Some(v) = lookup("QUANTITY") {
            self.cycle.fallback_quantity = parse_env("QUANTITY", &v)?;
        }
        if let Some(v) = lookup("SPEED_TRADE") {
            self.cycle.tick_interval_ms = parse_env("SPEED_TRADE", &v)?;
        }
        Ok(())
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        CycleConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.paper.start_price <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "paper.start_price must be > 0, got {}",
                self.paper.start_price
            )));
        }

        if self.paper.base_balance < Decimal::ZERO || self.paper.quote_balance < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "paper balances cannot be negative".to_string(),
            ));
        }

        for (name, rate) in [("maker_fee", self.paper.maker_fee), ("taker_fee", self.paper.taker_fee)] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(ConfigError::ValidationError(format!(
                    "paper.{} must be in [0, 1), got {}",
                    name, rate
                )));
            }
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvError {
        key,
        value: value.to_string(),
    })
}

// Conversion from Config to CycleConfig
impl From<&Config> for CycleConfig {
    fn from(config: &Config) -> Self {
        CycleConfig {
            pair_symbol: config.pair.symbol.clone(),
            base_asset: config.pair.base_asset.clone(),
            quote_asset: config.pair.quote_asset.clone(),
            profit_multiplier: config.cycle.profit_multiplier,
            fallback_quantity: config.cycle.fallback_quantity,
            tick_interval_ms: config.cycle.tick_interval_ms,
            commission_haircut: config.cycle.commission_haircut,
            default_fee_rate: config.cycle.default_fee_rate,
            smoothed_bootstrap: config.cycle.smoothed_bootstrap,
            smoother_window: config.cycle.smoother_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[pair]
symbol = "BTCUSDT"
base_asset = "BTC"
quote_asset = "USDT"

[cycle]
profit_multiplier = "1.01"
fallback_quantity = "0.001"
tick_interval_ms = 3000
commission_haircut = "0.001"
default_fee_rate = "0.001"
smoothed_bootstrap = false

[paper]
start_price = "27000.50"
volatility_bps = 20
price_decimals = 2
quote_balance = "500"
seed = 42

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn parse(content: &str) -> Config {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.cycle.tick_interval_ms, 3000);
        assert_eq!(config.paper.start_price, dec!(27000.50));
        assert_eq!(config.paper.seed, Some(42));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/cycle.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_optional_sections_default() {
        let config = parse(
            r#"
[pair]
symbol = "ETHUSDT"
base_asset = "ETH"
quote_asset = "USDT"

[cycle]
profit_multiplier = "1.02"
"#,
        );

        assert!(config.validate().is_ok());
        assert_eq!(config.cycle.tick_interval_ms, 3000);
        assert_eq!(config.cycle.commission_haircut, dec!(0.001));
        assert_eq!(config.cycle.fallback_quantity, dec!(0));
        assert_eq!(config.cycle.smoother_window, None);
        assert_eq!(config.paper, PaperConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_profit_multiplier() {
        let content = create_valid_config().replace("profit_multiplier = \"1.01\"", "profit_multiplier = \"0\"");
        let file = write_config(&content);

        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_paper_fee() {
        let content = create_valid_config().replace("seed = 42", "seed = 42\ntaker_fee = \"1.5\"");
        let file = write_config(&content);

        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[pair\nsymbol = ");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse(&create_valid_config());
        let env: HashMap<&str, &str> = [
            ("PAIR_SYMBOL", "ETHBTC"),
            ("BASE_COIN", "ETH"),
            ("QUOTE_COIN", "BTC"),
            ("PROFIT", "1.05"),
            ("QUANTITY", "2.5"),
            ("SPEED_TRADE", "1500"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.pair.symbol, "ETHBTC");
        assert_eq!(config.pair.base_asset, "ETH");
        assert_eq!(config.pair.quote_asset, "BTC");
        assert_eq!(config.cycle.profit_multiplier, dec!(1.05));
        assert_eq!(config.cycle.fallback_quantity, dec!(2.5));
        assert_eq!(config.cycle.tick_interval_ms, 1500);
    }

    #[test]
    fn test_bad_env_override() {
        let mut config = parse(&create_valid_config());
        let result = config.apply_overrides(|key| {
            (key == "SPEED_TRADE").then(|| "fast".to_string())
        });

        match result {
            Err(ConfigError::EnvError { key, value }) => {
                assert_eq!(key, "SPEED_TRADE");
                assert_eq!(value, "fast");
            }
            other => panic!("Expected EnvError, got {:?}", other),
        }
    }

    #[test]
    fn test_config_to_cycle_config() {
        let config = parse(&create_valid_config());
        let cycle = CycleConfig::from(&config);

        assert_eq!(cycle.pair_symbol, "BTCUSDT");
        assert_eq!(cycle.base_asset, "BTC");
        assert_eq!(cycle.quote_asset, "USDT");
        assert_eq!(cycle.profit_multiplier, dec!(1.01));
        assert_eq!(cycle.fallback_quantity, dec!(0.001));
        assert!(!cycle.smoothed_bootstrap);
    }
}
