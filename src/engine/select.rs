use chrono::NaiveDate;
use polars::prelude::*;

use super::types::{ClosePoint, DateSelection};
use crate::data::{datetime_values, PriceTable, CLOSE_COL, TIMESTAMP_COL};
use crate::error::{Result, StatsError};

/// Parse a calendar date written as `YYYY-MM-DD`.
///
/// Day-first or month-first forms such as `26/02/2018` are rejected rather
/// than guessed at.
pub fn parse_chart_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let well_formed = trimmed.len() == 10
        && trimmed
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(StatsError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| StatsError::InvalidDate(s.to_string()))
}

/// Rows whose timestamp falls on `date`, any time of day, in table order.
///
/// A date with no rows yields an empty selection, not an error. Rows with a
/// null close are skipped since they have nothing to plot.
pub fn select_date(table: &PriceTable, date: NaiveDate) -> Result<DateSelection> {
    table.require_numeric(CLOSE_COL)?;

    let mut selection = DateSelection {
        date,
        points: Vec::new(),
    };
    let (start, end) = selection.day_bounds();

    let selected = table
        .frame()
        .clone()
        .lazy()
        .filter(
            col(TIMESTAMP_COL)
                .gt_eq(lit(start))
                .and(col(TIMESTAMP_COL).lt(lit(end))),
        )
        .select([
            col(TIMESTAMP_COL),
            col(CLOSE_COL).cast(DataType::Float64),
        ])
        .collect()?;

    let timestamps = datetime_values(selected.column(TIMESTAMP_COL)?)?;
    let closes = selected.column(CLOSE_COL)?.f64()?;
    selection.points = timestamps
        .into_iter()
        .zip(closes.into_iter())
        .filter_map(|(timestamp, close)| close.map(|close| ClosePoint { timestamp, close }))
        .collect();

    if selection.is_empty() {
        tracing::warn!(%date, "No price rows on requested date");
    } else {
        tracing::debug!(%date, points = selection.points.len(), "Selected rows for date");
    }
    Ok(selection)
}
