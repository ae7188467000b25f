//! Ex-dividend back-adjustment.
//!
//! Rebuilds a continuity-adjusted price history so the mechanical drop on an
//! ex-dividend date does not read as a real move. Each event contributes a
//! factor
//!
//! ```text
//! factor = (reference - cash) / (reference * (1 + stock / 10))
//! ```
//!
//! where `reference` is the last close before the ex-date in the unadjusted
//! series. Walking from the newest point to the oldest, every point that
//! predates an event picks up that event's factor into a cumulative
//! multiplier. Points are rounded as they are scaled, each with the
//! multiplier in force at that point.
//!
//! Inputs are never mutated. Calling with no events returns a copy, which is
//! how the caller restores the unadjusted view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdjustConfig;
use crate::domain::price::round_to;
use crate::domain::{CorporateActionEvent, PricePoint};
use crate::series::{aligned_len, IndicatorSeries};

/// Factor resolved for one corporate-action event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFactor {
    pub ex_date: NaiveDate,
    pub cash_amount: f64,
    pub stock_amount: f64,
    /// Close the factor was computed against; `None` when the price series is empty.
    pub reference_price: Option<f64>,
    /// Multiplicative factor; exactly 1.0 when the event was skipped.
    pub factor: f64,
}

/// Output of [`AdjustmentEngine::adjust`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjusted {
    pub prices: Vec<PricePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSeries>,
    /// Per-event factors, most recent ex-date first.
    pub factors: Vec<EventFactor>,
}

/// Applies corporate-action factors to prices and price-level indicators.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentEngine {
    config: AdjustConfig,
}

impl AdjustmentEngine {
    pub fn new(config: AdjustConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdjustConfig {
        &self.config
    }

    /// Back-adjust `prices` (and optionally `indicators`) for `events`.
    pub fn adjust(
        &self,
        prices: &[PricePoint],
        events: &[CorporateActionEvent],
        indicators: Option<&IndicatorSeries>,
    ) -> Adjusted {
        let factors = event_factors(prices, events);

        // Both walks are bounded by the newest price date.
        let covered_until = prices.last().map(|p| p.date);

        let price_dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
        let price_mults = match covered_until {
            Some(until) => multipliers(&price_dates, &factors, until),
            None => Vec::new(),
        };
        let adjusted_prices = prices
            .iter()
            .zip(&price_mults)
            .map(|(p, &m)| {
                if m != 1.0 {
                    p.scaled(m, self.config.decimals)
                } else {
                    p.clone()
                }
            })
            .collect();

        let adjusted_indicators =
            indicators.map(|series| self.adjust_indicators(series, &factors, covered_until));

        debug!(
            points = prices.len(),
            events = events.len(),
            oldest_multiplier = price_mults.first().copied().unwrap_or(1.0),
            "back-adjusted price series"
        );

        Adjusted {
            prices: adjusted_prices,
            indicators: adjusted_indicators,
            factors,
        }
    }

    /// Walk the indicator date axis on its own and rescale price-level arrays.
    ///
    /// `covered_until` is the newest price date; without prices the indicator
    /// axis bounds itself.
    fn adjust_indicators(
        &self,
        series: &IndicatorSeries,
        factors: &[EventFactor],
        covered_until: Option<NaiveDate>,
    ) -> IndicatorSeries {
        let mut out = series.clone();
        let Some(until) = covered_until.or_else(|| series.dates.last().copied()) else {
            return out;
        };
        let mults = multipliers(&series.dates, factors, until);

        for (name, values) in out.series_mut() {
            if !self.config.is_price_level(name) {
                continue;
            }
            let n = aligned_len(
                "adjust_indicators",
                &[("date", mults.len()), (name.as_str(), values.len())],
            );
            for (value, &m) in values[..n].iter_mut().zip(&mults[..n]) {
                if m == 1.0 {
                    continue;
                }
                if let Some(v) = value.as_mut() {
                    if !v.is_nan() {
                        *v = round_to(*v * m, self.config.decimals);
                    }
                }
            }
        }
        out
    }
}

/// Back-adjust with the default configuration.
pub fn adjust(
    prices: &[PricePoint],
    events: &[CorporateActionEvent],
    indicators: Option<&IndicatorSeries>,
) -> Adjusted {
    AdjustmentEngine::default().adjust(prices, events, indicators)
}

/// Resolve each event's factor against the unadjusted `prices`.
///
/// The result is sorted by ex-date, most recent first; events sharing an
/// ex-date keep their input order.
pub fn event_factors(prices: &[PricePoint], events: &[CorporateActionEvent]) -> Vec<EventFactor> {
    let mut sorted: Vec<&CorporateActionEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.ex_date.cmp(&a.ex_date));

    sorted
        .into_iter()
        .map(|event| {
            let reference_price = reference_price(prices, event.ex_date);
            let factor = match reference_price {
                Some(reference) if reference > 0.0 => {
                    let f = (reference - event.cash_amount)
                        / (reference * (1.0 + event.stock_rate()));
                    if f.is_finite() {
                        f
                    } else {
                        1.0
                    }
                }
                _ => 1.0,
            };
            debug!(
                ex_date = %event.ex_date,
                cash = event.cash_amount,
                stock = event.stock_amount,
                ?reference_price,
                factor,
                "resolved ex-dividend factor"
            );
            EventFactor {
                ex_date: event.ex_date,
                cash_amount: event.cash_amount,
                stock_amount: event.stock_amount,
                reference_price,
                factor,
            }
        })
        .collect()
}

/// Close of the last point before `ex_date`.
///
/// Falls back to the nearest earlier usable close, then to the newest usable
/// close when nothing precedes the ex-date.
fn reference_price(prices: &[PricePoint], ex_date: NaiveDate) -> Option<f64> {
    let before = prices.partition_point(|p| p.date < ex_date);
    prices[..before]
        .iter()
        .rev()
        .chain(prices.iter().rev())
        .map(|p| p.close)
        .find(|c| !c.is_nan())
}

/// Cumulative multiplier for every date on an ascending axis.
///
/// `factors` must be sorted most recent first (as [`event_factors`] returns
/// them). One cursor walks the factors while the index walks the axis from
/// newest to oldest; a factor is folded in at the first point that predates
/// its ex-date. Ex-dates after `covered_until` (the newest price date) are
/// outside the covered range and contribute nothing.
pub fn multipliers(
    dates: &[NaiveDate],
    factors: &[EventFactor],
    covered_until: NaiveDate,
) -> Vec<f64> {
    let mut out = vec![1.0; dates.len()];
    if dates.is_empty() {
        return out;
    }

    let mut cursor = factors
        .iter()
        .take_while(|f| f.ex_date > covered_until)
        .count();
    if cursor > 0 {
        debug!(skipped = cursor, %covered_until, "ex-dates after the covered range ignored");
    }

    let mut multiplier = 1.0;
    for i in (0..dates.len()).rev() {
        while cursor < factors.len() && dates[i] < factors[cursor].ex_date {
            multiplier *= factors[cursor].factor;
            cursor += 1;
        }
        out[i] = multiplier;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn point(date: &str, close: f64) -> PricePoint {
        PricePoint {
            date: d(date),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn cash(date: &str, amount: f64) -> CorporateActionEvent {
        CorporateActionEvent::cash(d(date), amount)
    }

    #[test]
    fn cash_dividend_scales_points_before_ex_date() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 102.0)];
        let events = vec![cash("2024-01-02", 2.0)];

        let out = adjust(&prices, &events, None);

        assert_eq!(out.factors.len(), 1);
        assert_eq!(out.factors[0].reference_price, Some(100.0));
        assert!((out.factors[0].factor - 0.98).abs() < 1e-12);
        assert_eq!(out.prices[0].close, 98.0);
        assert_eq!(out.prices[0].high, 98.98);
        assert_eq!(out.prices[1], prices[1]);
    }

    #[test]
    fn empty_prices_is_noop() {
        let out = adjust(&[], &[cash("2024-01-02", 2.0)], None);
        assert!(out.prices.is_empty());
        assert_eq!(out.factors[0].reference_price, None);
        assert_eq!(out.factors[0].factor, 1.0);
    }

    #[test]
    fn no_events_returns_copy() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 102.0)];
        let out = adjust(&prices, &[], None);
        assert_eq!(out.prices, prices);
        assert!(out.factors.is_empty());
    }

    #[test]
    fn stock_dividend_uses_per_lot_rate() {
        let prices = vec![point("2024-01-01", 110.0), point("2024-01-02", 100.0)];
        let events = vec![CorporateActionEvent {
            ex_date: d("2024-01-02"),
            cash_amount: 0.0,
            stock_amount: 1.0,
        }];
        let out = adjust(&prices, &events, None);
        // 110 / (110 * 1.1)
        assert_eq!(out.prices[0].close, 100.0);
    }

    #[test]
    fn ex_date_after_newest_point_is_ignored() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 102.0)];
        let out = adjust(&prices, &[cash("2024-02-01", 5.0)], None);
        assert_eq!(out.prices, prices);
    }

    #[test]
    fn ex_date_on_or_before_oldest_point_is_ignored() {
        let prices = vec![point("2024-01-02", 100.0), point("2024-01-03", 102.0)];
        let out = adjust(&prices, &[cash("2024-01-02", 5.0), cash("2023-12-01", 3.0)], None);
        assert_eq!(out.prices, prices);
    }

    #[test]
    fn ex_date_between_trading_days_uses_previous_close() {
        // 2024-01-06 is not a trading day; reference is the 01-05 close.
        let prices = vec![
            point("2024-01-04", 50.0),
            point("2024-01-05", 40.0),
            point("2024-01-08", 39.0),
        ];
        let out = adjust(&prices, &[cash("2024-01-06", 4.0)], None);
        assert_eq!(out.factors[0].reference_price, Some(40.0));
        assert_eq!(out.prices[0].close, 45.0);
        assert_eq!(out.prices[1].close, 36.0);
        assert_eq!(out.prices[2].close, 39.0);
    }

    #[test]
    fn non_positive_reference_skips_event() {
        let prices = vec![point("2024-01-01", 0.0), point("2024-01-02", 10.0)];
        let out = adjust(&prices, &[cash("2024-01-02", 1.0)], None);
        assert_eq!(out.factors[0].factor, 1.0);
        assert_eq!(out.prices, prices);
    }

    #[test]
    fn reference_falls_back_to_newest_close() {
        let prices = vec![point("2024-01-02", 20.0), point("2024-01-03", 25.0)];
        assert_eq!(reference_price(&prices, d("2024-01-01")), Some(25.0));
        assert_eq!(reference_price(&prices, d("2024-01-03")), Some(20.0));
        assert_eq!(reference_price(&[], d("2024-01-03")), None);
    }

    #[test]
    fn reference_skips_nan_close() {
        let mut gap = point("2024-01-02", 0.0);
        gap.close = f64::NAN;
        let prices = vec![point("2024-01-01", 30.0), gap, point("2024-01-03", 25.0)];
        assert_eq!(reference_price(&prices, d("2024-01-03")), Some(30.0));
    }

    #[test]
    fn events_are_folded_newest_first() {
        let prices = vec![
            point("2024-01-01", 100.0),
            point("2024-01-02", 100.0),
            point("2024-01-03", 100.0),
        ];
        // Given out of order on purpose.
        let events = vec![cash("2024-01-02", 10.0), cash("2024-01-03", 5.0)];
        let factors = event_factors(&prices, &events);
        assert_eq!(factors[0].ex_date, d("2024-01-03"));
        assert_eq!(factors[1].ex_date, d("2024-01-02"));

        let dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
        let m = multipliers(&dates, &factors, d("2024-01-03"));
        assert_eq!(m[2], 1.0);
        assert!((m[1] - 0.95).abs() < 1e-12);
        assert!((m[0] - 0.95 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn each_point_rounds_with_its_own_multiplier() {
        let prices = vec![
            point("2024-01-01", 33.33),
            point("2024-01-02", 33.33),
            point("2024-01-03", 33.33),
        ];
        let events = vec![cash("2024-01-02", 1.11), cash("2024-01-03", 2.22)];
        let out = adjust(&prices, &events, None);

        let f_new = (33.33 - 2.22) / 33.33;
        let f_old = (33.33 - 1.11) / 33.33;
        assert_eq!(out.prices[1].close, round_to(33.33 * f_new, 2));
        assert_eq!(out.prices[0].close, round_to(33.33 * (f_new * f_old), 2));
    }

    #[test]
    fn indicators_scale_price_level_only() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 102.0)];
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(50.0), Some(101.0)])
            .with("bb_upper", vec![None, Some(110.0)])
            .with("vwap", vec![Some(99.5), Some(101.0)])
            .with("rsi", vec![Some(40.0), Some(55.0)])
            .with("macd_histogram", vec![Some(-1.5), Some(0.5)]);

        let out = adjust(&prices, &[cash("2024-01-02", 2.0)], Some(&indicators));
        let ind = out.indicators.unwrap();

        assert_eq!(ind.get("ma5", 0), Some(49.0));
        assert_eq!(ind.get("ma5", 1), Some(101.0));
        assert_eq!(ind.series("bb_upper").unwrap()[0], None);
        assert_eq!(ind.get("vwap", 0), Some(97.51));
        assert_eq!(ind.get("rsi", 0), Some(40.0));
        assert_eq!(ind.get("macd_histogram", 0), Some(-1.5));
        assert_eq!(ind.dates, indicators.dates);
    }

    #[test]
    fn indicator_walk_uses_its_own_date_axis() {
        let prices = vec![
            point("2024-01-01", 100.0),
            point("2024-01-02", 100.0),
            point("2024-01-03", 100.0),
        ];
        // Indicator axis only covers the last two days.
        let indicators = IndicatorSeries::new(vec![d("2024-01-02"), d("2024-01-03")])
            .with("ma5", vec![Some(80.0), Some(80.0)]);
        let out = adjust(&prices, &[cash("2024-01-03", 10.0)], Some(&indicators));
        let ind = out.indicators.unwrap();
        assert_eq!(ind.get("ma5", 0), Some(72.0));
        assert_eq!(ind.get("ma5", 1), Some(80.0));
    }

    #[test]
    fn shorter_indicator_axis_shares_price_multipliers() {
        let prices = vec![
            point("2024-01-01", 100.0),
            point("2024-01-02", 100.0),
            point("2024-01-03", 100.0),
        ];
        // Indicator axis ends a day before the prices; the ex-date is past it.
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(100.0), Some(100.0)]);
        let out = adjust(&prices, &[cash("2024-01-03", 10.0)], Some(&indicators));
        let ind = out.indicators.unwrap();

        assert_eq!(out.prices[1].close, 90.0);
        assert_eq!(ind.get("ma5", 1), Some(90.0));
        assert_eq!(ind.get("ma5", 0), Some(90.0));
        assert_eq!(out.prices[2].close, 100.0);
    }

    #[test]
    fn indicators_without_prices_bound_themselves() {
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(100.0), Some(100.0)]);
        let out = adjust(&[], &[cash("2024-01-02", 10.0)], Some(&indicators));
        // No prices means no reference close, so the factor is identity.
        assert_eq!(out.indicators.unwrap(), indicators);
    }

    #[test]
    fn cash_and_stock_in_one_event() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 95.0)];
        let events = vec![CorporateActionEvent {
            ex_date: d("2024-01-02"),
            cash_amount: 2.0,
            stock_amount: 1.0,
        }];
        let out = adjust(&prices, &events, None);

        // (100 - 2) / (100 * 1.1)
        assert!((out.factors[0].factor - 98.0 / 110.0).abs() < 1e-12);
        assert_eq!(out.prices[0].close, 89.09);
        assert_eq!(out.prices[0].high, 89.98);
        assert_eq!(out.prices[0].low, 88.2);
        assert_eq!(out.prices[1], prices[1]);
    }

    #[test]
    fn configured_keys_replace_name_classification() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 100.0)];
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(50.0), Some(50.0)])
            .with("atr", vec![Some(2.0), Some(2.0)]);
        let engine = AdjustmentEngine::new(AdjustConfig {
            decimals: 2,
            price_level_keys: Some(vec!["atr".into()]),
        });
        let out = engine.adjust(&prices, &[cash("2024-01-02", 50.0)], Some(&indicators));
        let ind = out.indicators.unwrap();
        assert_eq!(ind.get("atr", 0), Some(1.0));
        assert_eq!(ind.get("ma5", 0), Some(50.0));
    }

    #[test]
    fn short_indicator_array_scales_common_prefix() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 100.0)];
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(50.0)]);
        let out = adjust(&prices, &[cash("2024-01-02", 50.0)], Some(&indicators));
        assert_eq!(out.indicators.unwrap().series("ma5").unwrap(), &[Some(25.0)]);
    }

    #[test]
    fn inputs_are_untouched() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 102.0)];
        let indicators = IndicatorSeries::new(vec![d("2024-01-01"), d("2024-01-02")])
            .with("ma5", vec![Some(50.0), Some(101.0)]);
        let prices_before = prices.clone();
        let indicators_before = indicators.clone();

        let _ = adjust(&prices, &[cash("2024-01-02", 2.0)], Some(&indicators));

        assert_eq!(prices, prices_before);
        assert_eq!(indicators, indicators_before);
    }

    #[test]
    fn custom_decimals() {
        let prices = vec![point("2024-01-01", 100.0), point("2024-01-02", 100.0)];
        let engine = AdjustmentEngine::new(AdjustConfig {
            decimals: 0,
            price_level_keys: None,
        });
        let out = engine.adjust(&prices, &[cash("2024-01-02", 33.3)], None);
        assert_eq!(out.prices[0].close, 67.0);
    }
}
