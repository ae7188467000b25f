//! Domain types for the analytics kernel.

pub mod corporate_action;
pub mod flow;
pub mod indicator;
pub mod price;

pub use corporate_action::{CorporateActionEvent, DividendRecord};
pub use flow::{Category, InstitutionalRow, NetFlowRecord};
pub use indicator::IndicatorKind;
pub use price::PricePoint;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Deserialize a nullable number, treating `null` as zero.
///
/// Backend payloads send `null` for an amount that was never declared.
pub(crate) fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Deserialize an optional ISO date where the backend uses `""` for "no date".
pub(crate) fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
