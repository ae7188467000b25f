//! Moving-average crossover: golden cross and death cross.
//!
//! Buy when the fast MA moves from at-or-below the slow MA to above it.
//! Sell when it moves from at-or-above to below. A sample sitting exactly
//! on the slow MA still counts as the pre-cross side, so a cross through an
//! exact tie is never missed.

use super::{CrossDetector, SignalKind, SignalSource};
use crate::series::IndicatorSeries;

#[derive(Debug, Clone)]
pub struct MaCross {
    fast_key: String,
    slow_key: String,
}

impl MaCross {
    pub fn new(fast_key: impl Into<String>, slow_key: impl Into<String>) -> Self {
        Self {
            fast_key: fast_key.into(),
            slow_key: slow_key.into(),
        }
    }
}

impl Default for MaCross {
    fn default() -> Self {
        Self::new("ma5", "ma20")
    }
}

impl CrossDetector for MaCross {
    fn source(&self) -> SignalSource {
        SignalSource::MaCross
    }

    fn required_keys(&self) -> Vec<&str> {
        vec![self.fast_key.as_str(), self.slow_key.as_str()]
    }

    fn evaluate(&self, series: &IndicatorSeries, index: usize) -> Option<SignalKind> {
        let (fast_prev, fast_cur) = super::pair(series, &self.fast_key, index)?;
        let (slow_prev, slow_cur) = super::pair(series, &self.slow_key, index)?;

        let diff_prev = fast_prev - slow_prev;
        let diff_cur = fast_cur - slow_cur;

        if diff_prev <= 0.0 && diff_cur > 0.0 {
            Some(SignalKind::Buy)
        } else if diff_prev >= 0.0 && diff_cur < 0.0 {
            Some(SignalKind::Sell)
        } else {
            None
        }
    }
}
