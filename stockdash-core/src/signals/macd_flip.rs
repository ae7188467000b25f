//! MACD histogram sign flip against the zero line.

use super::{CrossDetector, SignalKind, SignalSource};
use crate::series::IndicatorSeries;

/// Buy when the histogram goes from negative to non-negative; sell when it
/// goes from positive to non-positive.
#[derive(Debug, Clone)]
pub struct MacdFlip {
    key: String,
}

impl MacdFlip {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for MacdFlip {
    fn default() -> Self {
        Self::new("macd_histogram")
    }
}

impl CrossDetector for MacdFlip {
    fn source(&self) -> SignalSource {
        SignalSource::MacdFlip
    }

    fn required_keys(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evaluate(&self, series: &IndicatorSeries, index: usize) -> Option<SignalKind> {
        let (prev, cur) = super::pair(series, &self.key, index)?;
        if prev < 0.0 && cur >= 0.0 {
            Some(SignalKind::Buy)
        } else if prev > 0.0 && cur <= 0.0 {
            Some(SignalKind::Sell)
        } else {
            None
        }
    }
}
