//! Kernel configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid:
//!
//! ```toml
//! [adjust]
//! decimals = 2
//! price_level_keys = ["ma5", "ma20", "bb_upper", "bb_lower"]
//!
//! [signals]
//! fast_key = "ma5"
//! slow_key = "ma20"
//! rsi_oversold = 30.0
//! rsi_overbought = 70.0
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

use crate::domain::IndicatorKind;
use crate::error::ConfigError;

/// Top-level kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub adjust: AdjustConfig,
    pub signals: SignalConfig,
}

impl KernelConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.adjust.validate()?;
        self.signals.validate()
    }
}

/// Back-adjustment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustConfig {
    /// Decimal places kept when a scaled value is rounded.
    pub decimals: u32,
    /// Explicit list of price-level indicator names. `None` classifies by name.
    pub price_level_keys: Option<Vec<String>>,
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            price_level_keys: None,
        }
    }
}

impl AdjustConfig {
    /// Whether the indicator array `name` is rescaled by adjustment.
    pub fn is_price_level(&self, name: &str) -> bool {
        match &self.price_level_keys {
            Some(keys) => keys.iter().any(|k| k == name),
            None => IndicatorKind::classify(name).is_price_level(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.decimals > 8 {
            return Err(ConfigError::Invalid(format!(
                "adjust.decimals must be <= 8, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Signal detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub ma_cross: bool,
    pub macd_flip: bool,
    pub rsi_reentry: bool,
    pub fast_key: String,
    pub slow_key: String,
    pub macd_key: String,
    pub rsi_key: String,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            ma_cross: true,
            macd_flip: true,
            rsi_reentry: true,
            fast_key: "ma5".into(),
            slow_key: "ma20".into(),
            macd_key: "macd_histogram".into(),
            rsi_key: "rsi".into(),
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

impl SignalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rsi_oversold.partial_cmp(&self.rsi_overbought) != Some(Ordering::Less) {
            return Err(ConfigError::Invalid(format!(
                "signals.rsi_oversold ({}) must be below signals.rsi_overbought ({})",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        if self.fast_key == self.slow_key {
            return Err(ConfigError::Invalid(format!(
                "signals.fast_key and signals.slow_key are both '{}'",
                self.fast_key
            )));
        }
        Ok(())
    }
}
