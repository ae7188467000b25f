//! Technical signal detection for chart markers.
//!
//! Each detector scans the aligned indicator arrays forward by index and
//! reports edge-triggered crossings: a sustained condition produces one event
//! at the bar where it starts, not one per bar. Detectors run independently;
//! their events are concatenated in detector order without deduplication.
//!
//! A null sample at either side of a comparison skips that index. There is no
//! carry-forward of the last known value.

pub mod ma_cross;
pub mod macd_flip;
pub mod rsi_reentry;

pub use ma_cross::MaCross;
pub use macd_flip::MacdFlip;
pub use rsi_reentry::RsiReentry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SignalConfig;
use crate::domain::PricePoint;
use crate::series::{aligned_len, IndicatorSeries};

/// Marker direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Buy,
    Sell,
}

/// Which detector produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    MaCross,
    MacdFlip,
    RsiReentry,
}

impl SignalSource {
    pub fn id(&self) -> &'static str {
        match self {
            SignalSource::MaCross => "ma_cross",
            SignalSource::MacdFlip => "macd_flip",
            SignalSource::RsiReentry => "rsi_reentry",
        }
    }

    /// Short marker text.
    pub fn label(&self) -> &'static str {
        match self {
            SignalSource::MaCross => "MA cross",
            SignalSource::MacdFlip => "MACD",
            SignalSource::RsiReentry => "RSI",
        }
    }
}

/// A detected crossing.
///
/// `anchor_price` is the bar's low for a buy and its high for a sell, so a
/// marker sits below or above the candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub source: SignalSource,
    pub anchor_price: f64,
}

/// One crossing rule over named indicator arrays.
pub trait CrossDetector: Send + Sync {
    fn source(&self) -> SignalSource;

    /// Names of the arrays this detector reads.
    fn required_keys(&self) -> Vec<&str>;

    /// Evaluate the crossing between `index - 1` and `index`.
    ///
    /// Returns `None` at index 0, when any sample involved is null, or when
    /// nothing crosses.
    fn evaluate(&self, series: &IndicatorSeries, index: usize) -> Option<SignalKind>;
}

/// Runs a list of detectors over one indicator/price snapshot.
pub struct SignalDetector {
    detectors: Vec<Box<dyn CrossDetector>>,
}

impl SignalDetector {
    pub fn new(detectors: Vec<Box<dyn CrossDetector>>) -> Self {
        Self { detectors }
    }

    /// Build the enabled detectors from configuration, in the order
    /// MA cross, MACD flip, RSI re-entry.
    pub fn from_config(config: &SignalConfig) -> Self {
        let mut detectors: Vec<Box<dyn CrossDetector>> = Vec::new();
        if config.ma_cross {
            detectors.push(Box::new(MaCross::new(&config.fast_key, &config.slow_key)));
        }
        if config.macd_flip {
            detectors.push(Box::new(MacdFlip::new(&config.macd_key)));
        }
        if config.rsi_reentry {
            detectors.push(Box::new(RsiReentry::new(
                &config.rsi_key,
                config.rsi_oversold,
                config.rsi_overbought,
            )));
        }
        Self::new(detectors)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Scan `series` against `prices` and collect every crossing.
    ///
    /// Indices past the shorter of the date axis and the price series are
    /// skipped. A detector whose arrays are absent produces nothing.
    pub fn detect(&self, series: &IndicatorSeries, prices: &[PricePoint]) -> Vec<SignalEvent> {
        let mut events = Vec::new();

        for detector in &self.detectors {
            let keys = detector.required_keys();
            if let Some(missing) = keys.iter().find(|k| !series.contains(k)) {
                debug!(
                    source = detector.source().id(),
                    missing = *missing,
                    "indicator array absent; detector skipped"
                );
                continue;
            }

            let mut lengths = vec![("date", series.len()), ("prices", prices.len())];
            lengths.extend(
                keys.iter()
                    .map(|k| (*k, series.series(k).map_or(0, |v| v.len()))),
            );
            let n = aligned_len(detector.source().id(), &lengths);

            let before = events.len();
            for index in 1..n {
                if let Some(kind) = detector.evaluate(series, index) {
                    let bar = &prices[index];
                    events.push(SignalEvent {
                        index,
                        date: series.dates[index],
                        kind,
                        source: detector.source(),
                        anchor_price: match kind {
                            SignalKind::Buy => bar.low,
                            SignalKind::Sell => bar.high,
                        },
                    });
                }
            }
            debug!(
                source = detector.source().id(),
                events = events.len() - before,
                "signal scan complete"
            );
        }

        events
    }
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::from_config(&SignalConfig::default())
    }
}

/// Detect with the default detectors (ma5/ma20, macd_histogram, rsi 30/70).
pub fn detect(series: &IndicatorSeries, prices: &[PricePoint]) -> Vec<SignalEvent> {
    SignalDetector::default().detect(series, prices)
}

/// Previous and current sample of `key`, or `None` if either is null.
pub(crate) fn pair(series: &IndicatorSeries, key: &str, index: usize) -> Option<(f64, f64)> {
    if index == 0 {
        return None;
    }
    Some((series.get(key, index - 1)?, series.get(key, index)?))
}
