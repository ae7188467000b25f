//! Error types for validation and configuration.
//!
//! Kernel transforms themselves never fail; these errors come from the
//! explicit validation helpers and from loading configuration.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Ordering or alignment violation in caller-supplied series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("dates out of order at index {index}: {previous} followed by {current}")]
    Unsorted {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate date {date} at index {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("series '{name}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("indicator date {indicator} at index {index} does not match price date {price}")]
    DateMismatch {
        index: usize,
        price: NaiveDate,
        indicator: NaiveDate,
    },
}

/// Failure loading or validating a [`KernelConfig`](crate::config::KernelConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
