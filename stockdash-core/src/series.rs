//! Date-aligned series shared by every kernel call.
//!
//! A kernel call sees one date axis. Price points and indicator arrays are
//! index-aligned to it: sample `i` of every array belongs to `dates[i]`.
//! Null samples (insufficient history) are `None`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::PricePoint;
use crate::error::SeriesError;

/// Named indicator arrays over a shared date axis.
///
/// Serialized as `{ "date": [...], "<name>": [number | null, ...], ... }`,
/// the shape the backend returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    #[serde(rename = "date")]
    pub dates: Vec<NaiveDate>,
    #[serde(flatten)]
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorSeries {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            series: BTreeMap::new(),
        }
    }

    /// Insert (or replace) a named array.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(name.into(), values);
    }

    /// Builder-style [`insert`](Self::insert) for tests and fixtures.
    pub fn with(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.insert(name, values);
        self
    }

    /// Sample `index` of array `name`.
    ///
    /// `None` when the array is missing, the index is out of range, or the
    /// sample is null. A NaN sample is treated as null.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(index).copied().flatten())
            .filter(|x| !x.is_nan())
    }

    pub fn series(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub(crate) fn series_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<Option<f64>>)> {
        self.series.iter_mut()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Names of all arrays, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    /// Length of the date axis.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Every named array has exactly one sample per date.
    pub fn check_aligned(&self) -> Result<(), SeriesError> {
        for (name, values) in &self.series {
            if values.len() != self.dates.len() {
                return Err(SeriesError::LengthMismatch {
                    name: name.clone(),
                    expected: self.dates.len(),
                    actual: values.len(),
                });
            }
        }
        check_dates(&self.dates)
    }

    /// The indicator axis is the price axis, date for date.
    pub fn check_matches_prices(&self, prices: &[PricePoint]) -> Result<(), SeriesError> {
        if self.dates.len() != prices.len() {
            return Err(SeriesError::LengthMismatch {
                name: "date".into(),
                expected: prices.len(),
                actual: self.dates.len(),
            });
        }
        for (index, (date, point)) in self.dates.iter().zip(prices).enumerate() {
            if *date != point.date {
                return Err(SeriesError::DateMismatch {
                    index,
                    price: point.date,
                    indicator: *date,
                });
            }
        }
        Ok(())
    }
}

/// Price dates are strictly increasing.
pub fn validate_prices(prices: &[PricePoint]) -> Result<(), SeriesError> {
    let dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
    check_dates(&dates)
}

fn check_dates(dates: &[NaiveDate]) -> Result<(), SeriesError> {
    for (index, pair) in dates.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current == previous {
            return Err(SeriesError::DuplicateDate {
                index: index + 1,
                date: current,
            });
        }
        if current < previous {
            return Err(SeriesError::Unsorted {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}

/// Usable length of several arrays that should be index-aligned.
///
/// Returns the shortest length. A disagreement is a caller error, but it is
/// tolerated by scanning only the common prefix; it is logged at `warn`.
pub fn aligned_len(context: &str, lengths: &[(&str, usize)]) -> usize {
    let shortest = lengths.iter().map(|(_, n)| *n).min().unwrap_or(0);
    let longest = lengths.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if shortest != longest {
        warn!(
            context,
            ?lengths,
            usable = shortest,
            "series lengths disagree; indices beyond the shorter array are skipped"
        );
    }
    shortest
}
