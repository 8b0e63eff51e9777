pub mod csv;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

use crate::error::{Result, StatsError};

/// Key column; every `PriceTable` carries it first, typed as a naive datetime.
pub const TIMESTAMP_COL: &str = "TIMESTAMP";
pub const HIGH_COL: &str = "high";
pub const LOW_COL: &str = "low";
pub const CLOSE_COL: &str = "close";

pub trait PriceSource {
    fn load_prices(&self) -> Result<PriceTable>;
}

/// Price records keyed by `TIMESTAMP`.
///
/// Rows keep their source order; timestamps are neither deduplicated nor
/// sorted. The table is never mutated once built, derived views are new frames.
#[derive(Debug, Clone)]
pub struct PriceTable {
    frame: DataFrame,
}

impl PriceTable {
    /// Build a table from an in-memory frame, normalizing `TIMESTAMP` to
    /// `Datetime(Microseconds, None)` and moving it to the first column.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let df = normalize_timestamp(df)?;
        let frame = with_key_first(df)?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Timestamps in row order.
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        datetime_values(self.frame.column(TIMESTAMP_COL)?)
    }

    /// Fail unless `name` exists and holds a primitive numeric dtype.
    pub fn require_numeric(&self, name: &str) -> Result<()> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| StatsError::MissingColumn(name.to_string()))?;
        let dtype = column.dtype();
        if dtype.is_primitive_numeric() {
            Ok(())
        } else {
            Err(StatsError::NonNumeric {
                column: name.to_string(),
                dtype: dtype.to_string(),
            })
        }
    }
}

/// Convert the `TIMESTAMP` column to `Datetime(Microseconds, None)`.
///
/// `Date` columns land at midnight. `String` columns are parsed with the
/// pattern polars infers from the first value, then with each of
/// [`FALLBACK_FORMATS`] in turn; the first pattern that reads every cell wins.
/// If none does, the table fails with the first offending value (empty cells
/// count as unparseable).
pub fn normalize_timestamp(df: DataFrame) -> Result<DataFrame> {
    let src_dtype = df
        .column(TIMESTAMP_COL)
        .map_err(|_| StatsError::MissingColumn(TIMESTAMP_COL.to_string()))?
        .dtype()
        .clone();
    let target = DataType::Datetime(TimeUnit::Microseconds, None);

    let normalized = match &src_dtype {
        DataType::Datetime(TimeUnit::Microseconds, None) => df.clone(),
        DataType::Date | DataType::Datetime(_, _) => df
            .clone()
            .lazy()
            .with_column(col(TIMESTAMP_COL).cast(target))
            .collect()?,
        DataType::String => parse_text_timestamps(&df)?,
        other => {
            return Err(StatsError::TimestampParse {
                value: format!("<column of type {other}>"),
            })
        }
    };

    if normalized.column(TIMESTAMP_COL)?.null_count() > 0 {
        return Err(StatsError::TimestampParse {
            value: first_unparsed(&df, &normalized)?,
        });
    }

    Ok(normalized)
}

/// Explicit patterns tried when inference cannot read the whole column.
/// Slash dates are month-first here; day-first slash dates are covered by
/// inference.
pub const FALLBACK_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%Y%m%d %H%M%S",
    "%Y%m%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

fn parse_text_timestamps(df: &DataFrame) -> Result<DataFrame> {
    // Inference errors outright when the first value matches no known pattern.
    let inferred = parse_with(df, None).ok();
    if let Some(parsed) = &inferred {
        if parsed.column(TIMESTAMP_COL)?.null_count() == 0 {
            return Ok(parsed.clone());
        }
    }

    for &format in FALLBACK_FORMATS {
        let parsed = parse_with(df, Some(format))?;
        if parsed.column(TIMESTAMP_COL)?.null_count() == 0 {
            tracing::debug!(format, "Parsed timestamps with explicit format");
            return Ok(parsed);
        }
    }

    match inferred {
        Some(parsed) => Ok(parsed),
        None => parse_with(df, Some(FALLBACK_FORMATS[0])),
    }
}

fn parse_with(df: &DataFrame, format: Option<&str>) -> Result<DataFrame> {
    let parsed = df
        .clone()
        .lazy()
        .with_column(col(TIMESTAMP_COL).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                format: format.map(PlSmallStr::from),
                strict: false,
                ..Default::default()
            },
            lit("raise"),
        ))
        .collect()?;
    Ok(parsed)
}

/// Raw text of the first timestamp that came out of parsing as null.
fn first_unparsed(raw: &DataFrame, parsed: &DataFrame) -> Result<String> {
    let parsed_nulls = parsed.column(TIMESTAMP_COL)?.is_null();
    let raw_text = raw.column(TIMESTAMP_COL)?.cast(&DataType::String)?;
    let value = raw_text
        .str()?
        .into_iter()
        .zip(parsed_nulls.into_iter())
        .find_map(|(value, is_null)| {
            (is_null == Some(true)).then(|| value.unwrap_or("<empty>").to_string())
        });
    Ok(value.unwrap_or_else(|| "<empty>".to_string()))
}

fn with_key_first(df: DataFrame) -> Result<DataFrame> {
    let mut order = vec![PlSmallStr::from(TIMESTAMP_COL)];
    order.extend(
        df.get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != TIMESTAMP_COL)
            .cloned(),
    );
    Ok(df.select(order)?)
}

/// Read a microsecond `Datetime` column back into chrono values.
pub(crate) fn datetime_values(column: &Column) -> Result<Vec<NaiveDateTime>> {
    let micros = column.cast(&DataType::Int64)?;
    micros
        .i64()?
        .into_iter()
        .map(|value| {
            value
                .and_then(DateTime::from_timestamp_micros)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| StatsError::TimestampParse {
                    value: format!("{value:?}"),
                })
        })
        .collect()
}
