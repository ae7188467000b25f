//! Consecutive net-flow streaks.
//!
//! A streak is the run of same-signed daily nets ending at the most recent
//! date. Records are grouped per date (several rows for one date and scope
//! are summed) and walked newest first. The first day sets the direction;
//! the walk stops at the first day whose sign differs, and an exact zero
//! always stops it.
//!
//! A raw row counts toward every category its institution name matches, so a
//! `Foreign_Dealer_Self` row feeds both the Foreign and the Dealer streak.
//! The aggregate streak runs over the per-day sum of every record, each
//! counted once. It is not derived from the category streaks and can differ
//! from all of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::domain::{Category, NetFlowRecord};

/// What a streak is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StreakScope {
    Category(Category),
    Aggregate,
}

impl StreakScope {
    fn includes(&self, record: &NetFlowRecord) -> bool {
        match self {
            StreakScope::Category(c) => record.counts_toward(*c),
            StreakScope::Aggregate => true,
        }
    }
}

impl fmt::Display for StreakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreakScope::Category(c) => f.write_str(c.as_str()),
            StreakScope::Aggregate => f.write_str("aggregate"),
        }
    }
}

impl FromStr for StreakScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("aggregate") {
            return Ok(StreakScope::Aggregate);
        }
        s.parse::<Category>().map(StreakScope::Category)
    }
}

impl From<StreakScope> for String {
    fn from(scope: StreakScope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for StreakScope {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Category> for StreakScope {
    fn from(c: Category) -> Self {
        StreakScope::Category(c)
    }
}

/// Current streak for one scope.
///
/// `day_count` carries the direction: positive for a buying streak, negative
/// for a selling streak, zero when the latest day is flat or there is no data.
/// `magnitude` is the absolute sum of the nets inside the streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakResult {
    pub scope: StreakScope,
    pub day_count: i64,
    pub magnitude: f64,
}

impl StreakResult {
    pub fn neutral(scope: StreakScope) -> Self {
        Self {
            scope,
            day_count: 0,
            magnitude: 0.0,
        }
    }

    pub fn is_buying(&self) -> bool {
        self.day_count > 0
    }

    pub fn is_selling(&self) -> bool {
        self.day_count < 0
    }

    pub fn days(&self) -> u64 {
        self.day_count.unsigned_abs()
    }
}

impl fmt::Display for StreakResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.day_count.signum() {
            1 => "buy",
            -1 => "sell",
            _ => return f.write_str("neutral"),
        };
        let unit = if self.days() == 1 { "day" } else { "days" };
        write!(
            f,
            "{} consecutive {side} {unit} (total {})",
            self.days(),
            self.magnitude
        )
    }
}

/// Streaks for each institution present in the data, plus the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakTable {
    pub categories: Vec<StreakResult>,
    pub aggregate: StreakResult,
}

impl StreakTable {
    pub fn get(&self, category: Category) -> Option<&StreakResult> {
        self.categories
            .iter()
            .find(|r| r.scope == StreakScope::Category(category))
    }
}

/// Daily nets for `scope`, newest date first.
pub fn daily_nets(records: &[NetFlowRecord], scope: StreakScope) -> Vec<(NaiveDate, f64)> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records.iter().filter(|r| scope.includes(r)) {
        *by_date.entry(record.date).or_insert(0.0) += record.net();
    }
    by_date.into_iter().rev().collect()
}

/// Current streak for `scope`.
pub fn streak(records: &[NetFlowRecord], scope: impl Into<StreakScope>) -> StreakResult {
    let scope = scope.into();
    let nets = daily_nets(records, scope);

    let direction = match nets.first() {
        Some(&(_, latest)) => sign(latest),
        None => 0,
    };
    if direction == 0 {
        return StreakResult::neutral(scope);
    }

    let mut day_count = 0i64;
    let mut sum = 0.0;
    for &(_, net) in &nets {
        if sign(net) != direction {
            break;
        }
        day_count += direction;
        sum += net;
    }

    debug!(%scope, day_count, sum, days_available = nets.len(), "computed flow streak");

    StreakResult {
        scope,
        day_count,
        magnitude: sum.abs(),
    }
}

/// Streaks for Foreign, Trust and Dealer (those with at least one record)
/// and the aggregate over all categories.
pub fn streak_table(records: &[NetFlowRecord]) -> StreakTable {
    let categories = Category::INSTITUTIONS
        .into_iter()
        .filter(|c| records.iter().any(|r| r.counts_toward(*c)))
        .map(|c| streak(records, c))
        .collect();

    StreakTable {
        categories,
        aggregate: streak(records, StreakScope::Aggregate),
    }
}

fn sign(net: f64) -> i64 {
    if net > 0.0 {
        1
    } else if net < 0.0 {
        -1
    } else {
        0
    }
}
