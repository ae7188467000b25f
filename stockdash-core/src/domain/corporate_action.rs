//! Corporate-action events (cash and stock dividends).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{blank_date_as_none, null_as_zero};

/// One ex-dividend event.
///
/// `stock_amount` is the stock dividend declared per 1,000-share lot, so a
/// value of 1.0 means 100 new shares per lot (a 10% share-count increase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateActionEvent {
    #[serde(alias = "exDate")]
    pub ex_date: NaiveDate,
    #[serde(default, alias = "cashAmount", deserialize_with = "null_as_zero")]
    pub cash_amount: f64,
    #[serde(default, alias = "stockAmount", deserialize_with = "null_as_zero")]
    pub stock_amount: f64,
}

impl CorporateActionEvent {
    pub fn cash(ex_date: NaiveDate, cash_amount: f64) -> Self {
        Self {
            ex_date,
            cash_amount,
            stock_amount: 0.0,
        }
    }

    /// Fractional share-count increase per existing share.
    pub fn stock_rate(&self) -> f64 {
        self.stock_amount / 10.0
    }
}

/// Raw dividend row as the backend returns it.
///
/// Carries up to three candidate dates; see [`DividendRecord::ex_date`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividendRecord {
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "CashExDividendTradingDate",
        deserialize_with = "blank_date_as_none"
    )]
    pub cash_ex_date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "StockExDividendTradingDate",
        deserialize_with = "blank_date_as_none"
    )]
    pub stock_ex_date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "CashEarningsDistribution",
        alias = "cash_dividend",
        deserialize_with = "null_as_zero"
    )]
    pub cash: f64,
    #[serde(
        default,
        rename = "StockEarningsDistribution",
        alias = "stock_dividend",
        deserialize_with = "null_as_zero"
    )]
    pub stock: f64,
}

impl DividendRecord {
    /// Resolved ex-date: cash ex-date, then stock ex-date, then the row date.
    pub fn ex_date(&self) -> Option<NaiveDate> {
        self.cash_ex_date.or(self.stock_ex_date).or(self.date)
    }

    /// Convert to a kernel event. Rows without any usable date are dropped.
    pub fn into_event(self) -> Option<CorporateActionEvent> {
        let ex_date = self.ex_date()?;
        Some(CorporateActionEvent {
            ex_date,
            cash_amount: self.cash,
            stock_amount: self.stock,
        })
    }
}
