//! PricePoint: one daily OHLCV sample.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV sample for one security.
///
/// A price series is ordered ascending by `date` with no duplicate dates.
/// The backend names the high/low columns `max`/`min`; both spellings load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    #[serde(alias = "max")]
    pub high: f64,
    #[serde(alias = "min")]
    pub low: f64,
    pub close: f64,
    #[serde(default, alias = "Trading_Volume")]
    pub volume: u64,
}

impl PricePoint {
    /// Scale the four price fields by `multiplier`, rounding each to `decimals` places.
    ///
    /// Volume is left as traded.
    pub fn scaled(&self, multiplier: f64, decimals: u32) -> Self {
        Self {
            date: self.date,
            open: round_to(self.open * multiplier, decimals),
            high: round_to(self.high * multiplier, decimals),
            low: round_to(self.low * multiplier, decimals),
            close: round_to(self.close * multiplier, decimals),
            volume: self.volume,
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
