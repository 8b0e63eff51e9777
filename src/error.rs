//! Error type shared by the loader, the aggregations and the chart renderer.
//!
//! The binary wraps these in `anyhow` with stage context; library callers can
//! match on the variants directly.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StatsError {
    /// The data file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A price column holds something other than numbers
    #[error("Column '{column}' is not numeric (found {dtype})")]
    NonNumeric { column: String, dtype: String },

    /// A timestamp cell could not be read as a date/time
    #[error("Cannot parse timestamp value: {value}")]
    TimestampParse { value: String },

    /// A date argument was not an ISO `YYYY-MM-DD` calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, StatsError>;
