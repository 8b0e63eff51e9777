use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::Deserialize;
use std::str::FromStr;

use crate::data::{CLOSE_COL, HIGH_COL, LOW_COL};
use crate::error::{Result, StatsError};

/// Column holding the bucket day in frames built from daily results.
pub const DAY_COL: &str = "day";

/// What to do with day buckets that hold no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyDayPolicy {
    /// Keep the day with a `None` value so the sequence has no gaps.
    #[default]
    Keep,
    /// Omit the day from the output.
    Drop,
}

impl FromStr for EmptyDayPolicy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "drop" => Ok(Self::Drop),
            other => Err(StatsError::InvalidConfig(format!(
                "empty day policy must be 'keep' or 'drop', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAverage {
    pub day: NaiveDate,
    pub close: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRange {
    pub day: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

/// Mean close per calendar day, ascending by day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyAverageSeries {
    pub entries: Vec<DailyAverage>,
}

impl DailyAverageSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, day: NaiveDate) -> Option<&DailyAverage> {
        self.entries.iter().find(|e| e.day == day)
    }

    /// Two-column frame (`day`, `close`); empty days show as null.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let days: Vec<NaiveDate> = self.entries.iter().map(|e| e.day).collect();
        let closes: Vec<Option<f64>> = self.entries.iter().map(|e| e.close).collect();

        let mut df = df! { CLOSE_COL => &closes }?;
        df.with_column(DateChunked::from_naive_date(PlSmallStr::from(DAY_COL), days).into_column())?;
        Ok(df.select([DAY_COL, CLOSE_COL])?)
    }
}

/// Highest high and lowest low per calendar day, ascending by day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyRangeTable {
    pub entries: Vec<DailyRange>,
}

impl DailyRangeTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, day: NaiveDate) -> Option<&DailyRange> {
        self.entries.iter().find(|e| e.day == day)
    }

    /// Three-column frame (`day`, `high`, `low`); empty days show as null.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let days: Vec<NaiveDate> = self.entries.iter().map(|e| e.day).collect();
        let highs: Vec<Option<f64>> = self.entries.iter().map(|e| e.high).collect();
        let lows: Vec<Option<f64>> = self.entries.iter().map(|e| e.low).collect();

        let mut df = df! {
            HIGH_COL => &highs,
            LOW_COL => &lows,
        }?;
        df.with_column(DateChunked::from_naive_date(PlSmallStr::from(DAY_COL), days).into_column())?;
        Ok(df.select([DAY_COL, HIGH_COL, LOW_COL])?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePoint {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// Close prices of the rows falling on one calendar day, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateSelection {
    pub date: NaiveDate,
    pub points: Vec<ClosePoint>,
}

impl DateSelection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Half-open `[midnight, next midnight)` window of the selected day.
    pub fn day_bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.date.and_time(NaiveTime::MIN);
        let end = self
            .date
            .succ_opt()
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN));
        (start, end)
    }

    /// Lowest and highest close, `None` when nothing was selected.
    pub fn close_bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.close, p.close)),
            Some((lo, hi)) => Some((lo.min(p.close), hi.max(p.close))),
        })
    }
}
