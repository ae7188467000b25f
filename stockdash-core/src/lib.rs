//! StockDash Core: the quantitative kernel behind the stock dashboard.
//!
//! Three independent, pure transforms over in-memory series:
//! - [`adjust`]: ex-dividend back-adjustment of prices and price-level indicators
//! - [`signals`]: edge-triggered MA / MACD / RSI crossing detection
//! - [`streak`]: consecutive institutional net-flow streaks
//!
//! Every call is synchronous and deterministic, owns no state between calls,
//! and never mutates its inputs. Fetching, rendering and storage live outside
//! this crate.

pub mod adjust;
pub mod config;
pub mod domain;
pub mod error;
pub mod series;
pub mod signals;
pub mod streak;

pub use adjust::{Adjusted, AdjustmentEngine, EventFactor};
pub use config::{AdjustConfig, KernelConfig, SignalConfig};
pub use domain::{
    Category, CorporateActionEvent, DividendRecord, IndicatorKind, InstitutionalRow,
    NetFlowRecord, PricePoint,
};
pub use error::{ConfigError, SeriesError};
pub use series::IndicatorSeries;
pub use signals::{SignalDetector, SignalEvent, SignalKind, SignalSource};
pub use streak::{StreakResult, StreakScope, StreakTable};
