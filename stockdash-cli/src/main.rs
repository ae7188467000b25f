//! stockdash CLI: run the analytics kernel over payload files.
//!
//! Commands:
//! - `adjust`: back-adjust prices (and price-level indicators) for dividends
//! - `signals`: detect MA cross, MACD flip, and RSI re-entry markers
//! - `streak`: institutional net-flow streaks per category and in aggregate
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod input;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockdash_core::series::validate_prices;
use stockdash_core::streak::{streak, streak_table};
use stockdash_core::{
    AdjustmentEngine, IndicatorSeries, PricePoint, SeriesError, SignalDetector, StreakScope,
};

#[derive(Parser)]
#[command(name = "stockdash", about = "Stock dashboard analytics kernel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back-adjust a price series for ex-dividend events.
    Adjust {
        /// Price series (.csv with date,open,high,low,close,volume, or JSON).
        #[arg(long)]
        prices: PathBuf,

        /// Corporate-action events or raw dividend rows (JSON).
        #[arg(long)]
        events: PathBuf,

        /// Indicator arrays to rescale alongside the prices (JSON).
        #[arg(long)]
        indicators: Option<PathBuf>,

        /// Kernel config file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail on ordering or alignment problems instead of warning.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Detect buy/sell markers from indicator crossings.
    Signals {
        /// Price series (.csv or JSON).
        #[arg(long)]
        prices: PathBuf,

        /// Indicator arrays aligned with the prices (JSON).
        #[arg(long)]
        indicators: PathBuf,

        /// Kernel config file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail on ordering or alignment problems instead of warning.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Current consecutive buy/sell streaks from institutional flows.
    Streak {
        /// Flow records or raw institutional rows (JSON).
        #[arg(long)]
        records: PathBuf,

        /// foreign, trust, dealer, other, aggregate, or all.
        #[arg(long, default_value = "all")]
        category: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockdash=info,stockdash_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Adjust {
            prices,
            events,
            indicators,
            config,
            strict,
        } => run_adjust(&prices, &events, indicators.as_deref(), config.as_deref(), strict),
        Commands::Signals {
            prices,
            indicators,
            config,
            strict,
        } => run_signals(&prices, &indicators, config.as_deref(), strict),
        Commands::Streak { records, category } => run_streak(&records, &category),
    }
}

fn run_adjust(
    prices_path: &Path,
    events_path: &Path,
    indicators_path: Option<&Path>,
    config_path: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let config = input::load_config(config_path)?;
    let prices = input::load_prices(prices_path)?;
    let events = input::load_events(events_path)?;
    let indicators = indicators_path.map(input::load_indicators).transpose()?;

    check(strict, validate_prices(&prices))?;
    if let Some(series) = &indicators {
        check(strict, series.check_aligned())?;
    }

    let engine = AdjustmentEngine::new(config.adjust);
    let adjusted = engine.adjust(&prices, &events, indicators.as_ref());
    let applied = adjusted.factors.iter().filter(|f| f.factor != 1.0).count();
    info!(events = events.len(), applied, "adjustment complete");

    print_json(&adjusted)
}

fn run_signals(
    prices_path: &Path,
    indicators_path: &Path,
    config_path: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let config = input::load_config(config_path)?;
    let prices = input::load_prices(prices_path)?;
    let indicators = input::load_indicators(indicators_path)?;

    check_snapshot(strict, &prices, &indicators)?;

    let detector = SignalDetector::from_config(&config.signals);
    let events = detector.detect(&indicators, &prices);
    info!(detectors = detector.len(), events = events.len(), "signal scan complete");

    print_json(&events)
}

fn run_streak(records_path: &Path, category: &str) -> Result<()> {
    let records = input::load_records(records_path)?;

    if category.eq_ignore_ascii_case("all") {
        let table = streak_table(&records);
        for result in table.categories.iter().chain(std::iter::once(&table.aggregate)) {
            info!(scope = %result.scope, "{result}");
        }
        return print_json(&table);
    }

    let scope: StreakScope = match category.parse() {
        Ok(scope) => scope,
        Err(e) => bail!("{e}; expected foreign, trust, dealer, other, aggregate, or all"),
    };
    let result = streak(&records, scope);
    info!(scope = %result.scope, "{result}");
    print_json(&result)
}

fn check_snapshot(strict: bool, prices: &[PricePoint], indicators: &IndicatorSeries) -> Result<()> {
    check(strict, validate_prices(prices))?;
    check(strict, indicators.check_aligned())?;
    check(strict, indicators.check_matches_prices(prices))
}

/// In strict mode a validation failure is fatal; otherwise it is logged and
/// the kernel's truncation rules apply.
fn check(strict: bool, outcome: std::result::Result<(), SeriesError>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e) if strict => Err(e).context("input validation failed"),
        Err(e) => {
            warn!(error = %e, "input validation failed; continuing");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
