// 7.0 config.rs: all settings in one place. book ladder, margin, highlight timer, logging.
// 7.1 presets per environment; everything loads from JSON and is validated before use.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::highlighter::HighlightParams;
use crate::margin::MarginParams;
use crate::order_book::LadderParams;
use crate::types::USDC_DECIMALS;

/// Order book display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    // Minimum price increment in USDC. None until contract specs are known
    pub tick_size: Option<Decimal>,
    pub ladder: LadderParams,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            tick_size: Some(dec!(0.01)),
            ladder: LadderParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    // EnvFilter directive, RUST_LOG wins when set
    pub log_level: String,
    pub json_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub book: BookConfig,
    pub margin: MarginParams,
    pub highlight: HighlightParams,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.book.tick_size = Some(dec!(0.05));
        config.logging.log_level = "debug".to_string();
        config
    }

    pub fn mainnet() -> Self {
        let mut config = Self::default();
        config.logging.json_output = true;
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tick) = self.book.tick_size {
            if tick <= Decimal::ZERO {
                return Err(ConfigError::InvalidBook {
                    reason: "tick size must be positive".to_string(),
                });
            }
        }

        if self.book.ladder.half_depth == 0 {
            return Err(ConfigError::InvalidBook {
                reason: "ladder needs at least one row per side".to_string(),
            });
        }

        // live prices can't be finer than the token itself
        if self.book.ladder.live_price_decimals > USDC_DECIMALS {
            return Err(ConfigError::InvalidBook {
                reason: format!("live price decimals above {USDC_DECIMALS}"),
            });
        }

        if self.margin.margin_percent > 100 {
            return Err(ConfigError::InvalidMargin {
                reason: "margin percent must be 0..=100".to_string(),
            });
        }

        if self.margin.delivery_duration_days <= 0 {
            return Err(ConfigError::InvalidMargin {
                reason: "delivery duration must be at least one day".to_string(),
            });
        }

        if self.highlight.clear_after_ms <= 0 {
            return Err(ConfigError::InvalidHighlight {
                reason: "highlight delay must be positive".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid book config: {reason}")]
    InvalidBook { reason: String },

    #[error("invalid margin config: {reason}")]
    InvalidMargin { reason: String },

    #[error("invalid highlight config: {reason}")]
    InvalidHighlight { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> AppConfig {
        match self {
            Environment::Development => AppConfig::default(),
            Environment::Testnet => AppConfig::testnet(),
            Environment::Mainnet => AppConfig::mainnet(),
        }
    }
}
