//! Price-level vs ratio indicator classification.

use serde::{Deserialize, Serialize};

/// How an indicator array responds to back-adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    /// Expressed in currency units; scaled with price.
    PriceLevel,
    /// Ratio, oscillator or volume measure; invariant under adjustment.
    Ratio,
}

const BAND_KEYS: [&str; 4] = ["bb_upper", "bb_middle", "bb_lower", "vwap"];

impl IndicatorKind {
    /// Classify an indicator array by name.
    ///
    /// Moving averages (`ma5`, `ma120`, `sma_20`, `ema_12`), Bollinger bands and
    /// VWAP are price-level. Everything else, including unknown names, is ratio.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if BAND_KEYS.contains(&lower.as_str()) || is_moving_average(&lower) {
            IndicatorKind::PriceLevel
        } else {
            IndicatorKind::Ratio
        }
    }

    pub fn is_price_level(&self) -> bool {
        matches!(self, IndicatorKind::PriceLevel)
    }
}

fn is_moving_average(name: &str) -> bool {
    let digits_after = |prefix: &str| {
        name.strip_prefix(prefix)
            .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    };
    digits_after("ma") || digits_after("sma_") || digits_after("ema_")
}
