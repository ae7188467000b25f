//! Payload loading for the CLI (JSON files, CSV price files).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use stockdash_core::{
    CorporateActionEvent, DividendRecord, IndicatorSeries, InstitutionalRow, KernelConfig,
    NetFlowRecord, PricePoint,
};

/// An events file may hold kernel events or raw backend dividend rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventRow {
    Event(CorporateActionEvent),
    Dividend(DividendRecord),
}

/// A flow file may hold categorised records or raw institutional rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlowRow {
    Record(NetFlowRecord),
    Institutional(InstitutionalRow),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

/// Load prices from a `.csv` file (header `date,open,high,low,close,volume`)
/// or from a JSON array.
pub fn load_prices(path: &Path) -> Result<Vec<PricePoint>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let prices: Vec<PricePoint> = if is_csv {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open CSV {}", path.display()))?;
        reader
            .deserialize()
            .enumerate()
            .map(|(row, record)| {
                record.with_context(|| format!("Bad price row {} in {}", row + 1, path.display()))
            })
            .collect::<Result<_>>()?
    } else {
        read_json(path)?
    };

    info!(path = %path.display(), points = prices.len(), "loaded prices");
    Ok(prices)
}

pub fn load_events(path: &Path) -> Result<Vec<CorporateActionEvent>> {
    let rows: Vec<EventRow> = read_json(path)?;
    let (events, dropped) = resolve_events(rows);
    if dropped > 0 {
        warn!(
            path = %path.display(),
            dropped,
            "event rows without a usable ex-date dropped"
        );
    }
    info!(path = %path.display(), events = events.len(), "loaded corporate actions");
    Ok(events)
}

/// Resolve rows into kernel events, counting the rows that had no usable date.
///
/// A kernel event whose `exDate` fails to parse lands here as a dateless
/// dividend row and is counted as dropped.
fn resolve_events(rows: Vec<EventRow>) -> (Vec<CorporateActionEvent>, usize) {
    let total = rows.len();
    let events: Vec<CorporateActionEvent> = rows
        .into_iter()
        .filter_map(|row| match row {
            EventRow::Event(event) => Some(event),
            EventRow::Dividend(record) => record.into_event(),
        })
        .collect();
    let dropped = total - events.len();
    (events, dropped)
}

pub fn load_indicators(path: &Path) -> Result<IndicatorSeries> {
    let series: IndicatorSeries = read_json(path)?;
    info!(
        path = %path.display(),
        dates = series.len(),
        arrays = series.names().count(),
        "loaded indicators"
    );
    Ok(series)
}

pub fn load_records(path: &Path) -> Result<Vec<NetFlowRecord>> {
    let rows: Vec<FlowRow> = read_json(path)?;
    let records: Vec<NetFlowRecord> = rows
        .into_iter()
        .map(|row| match row {
            FlowRow::Record(record) => record,
            FlowRow::Institutional(row) => row.into(),
        })
        .collect();
    info!(path = %path.display(), records = records.len(), "loaded flow records");
    Ok(records)
}

/// Kernel configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<KernelConfig> {
    match path {
        Some(path) => KernelConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(KernelConfig::default()),
    }
}
