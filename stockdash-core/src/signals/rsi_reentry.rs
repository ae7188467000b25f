//! RSI threshold re-entry.
//!
//! Buy when RSI climbs back through the oversold line, sell when it drops
//! back through the overbought line. A reading that stays beyond a line
//! fires nothing until it crosses back.

use super::{CrossDetector, SignalKind, SignalSource};
use crate::series::IndicatorSeries;

#[derive(Debug, Clone)]
pub struct RsiReentry {
    key: String,
    oversold: f64,
    overbought: f64,
}

impl RsiReentry {
    pub fn new(key: impl Into<String>, oversold: f64, overbought: f64) -> Self {
        assert!(oversold < overbought, "oversold must be below overbought");
        Self {
            key: key.into(),
            oversold,
            overbought,
        }
    }
}

impl Default for RsiReentry {
    fn default() -> Self {
        Self::new("rsi", 30.0, 70.0)
    }
}

impl CrossDetector for RsiReentry {
    fn source(&self) -> SignalSource {
        SignalSource::RsiReentry
    }

    fn required_keys(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evaluate(&self, series: &IndicatorSeries, index: usize) -> Option<SignalKind> {
        let (prev, cur) = super::pair(series, &self.key, index)?;
        if prev < self.oversold && cur >= self.oversold {
            Some(SignalKind::Buy)
        } else if prev > self.overbought && cur <= self.overbought {
            Some(SignalKind::Sell)
        } else {
            None
        }
    }
}
