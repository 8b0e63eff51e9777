use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

use super::types::{
    DailyAverage, DailyAverageSeries, DailyRange, DailyRangeTable, EmptyDayPolicy, DAY_COL,
};
use crate::data::{PriceTable, CLOSE_COL, HIGH_COL, LOW_COL, TIMESTAMP_COL};
use crate::error::{Result, StatsError};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Mean close per calendar day.
///
/// With `EmptyDayPolicy::Keep` the result covers every day from the first to
/// the last timestamp, inclusive; days without rows carry `None`.
pub fn daily_average(table: &PriceTable, policy: EmptyDayPolicy) -> Result<DailyAverageSeries> {
    table.require_numeric(CLOSE_COL)?;

    let grouped = bucket_by_day(
        table,
        [col(CLOSE_COL).cast(DataType::Float64).mean().alias(CLOSE_COL)],
    )?;

    let days = grouped.column(DAY_COL)?.i32()?;
    let closes = grouped.column(CLOSE_COL)?.f64()?;
    let buckets: BTreeMap<i32, Option<f64>> = days
        .into_iter()
        .zip(closes.into_iter())
        .filter_map(|(day, close)| day.map(|d| (d, close)))
        .collect();

    let entries = span_days(&buckets)?
        .into_iter()
        .map(|(day, close)| DailyAverage {
            day,
            close: close.flatten(),
        })
        .filter(|e| policy == EmptyDayPolicy::Keep || e.close.is_some())
        .collect::<Vec<_>>();

    tracing::debug!(
        rows = table.height(),
        buckets = entries.len(),
        "Computed daily average close"
    );
    Ok(DailyAverageSeries { entries })
}

/// Highest `high` and lowest `low` per calendar day, each reduced on its own.
pub fn daily_high_low(table: &PriceTable, policy: EmptyDayPolicy) -> Result<DailyRangeTable> {
    table.require_numeric(HIGH_COL)?;
    table.require_numeric(LOW_COL)?;

    let grouped = bucket_by_day(
        table,
        [
            col(HIGH_COL).cast(DataType::Float64).max().alias(HIGH_COL),
            col(LOW_COL).cast(DataType::Float64).min().alias(LOW_COL),
        ],
    )?;

    let days = grouped.column(DAY_COL)?.i32()?;
    let highs = grouped.column(HIGH_COL)?.f64()?;
    let lows = grouped.column(LOW_COL)?.f64()?;
    let buckets: BTreeMap<i32, (Option<f64>, Option<f64>)> = days
        .into_iter()
        .zip(highs.into_iter().zip(lows.into_iter()))
        .filter_map(|(day, range)| day.map(|d| (d, range)))
        .collect();

    let entries = span_days(&buckets)?
        .into_iter()
        .map(|(day, range)| {
            let (high, low) = range.unwrap_or((None, None));
            DailyRange { day, high, low }
        })
        .filter(|e| policy == EmptyDayPolicy::Keep || e.high.is_some() || e.low.is_some())
        .collect::<Vec<_>>();

    tracing::debug!(
        rows = table.height(),
        buckets = entries.len(),
        "Computed daily high/low"
    );
    Ok(DailyRangeTable { entries })
}

/// Group rows by the calendar day of `TIMESTAMP`, keyed as days since the
/// Unix epoch in an `Int32` column named `day`.
fn bucket_by_day<E: AsRef<[Expr]>>(table: &PriceTable, aggs: E) -> Result<DataFrame> {
    let grouped = table
        .frame()
        .clone()
        .lazy()
        .with_column(
            col(TIMESTAMP_COL)
                .cast(DataType::Date)
                .cast(DataType::Int32)
                .alias(DAY_COL),
        )
        .group_by([col(DAY_COL)])
        .agg(aggs)
        .collect()?;
    Ok(grouped)
}

/// Every day from the first to the last bucket, paired with that day's
/// value if it has one.
fn span_days<T: Clone>(buckets: &BTreeMap<i32, T>) -> Result<Vec<(NaiveDate, Option<T>)>> {
    let (Some((&first, _)), Some((&last, _))) = (buckets.first_key_value(), buckets.last_key_value())
    else {
        return Ok(Vec::new());
    };

    (first..=last)
        .map(|day| Ok((epoch_day_to_date(day)?, buckets.get(&day).cloned())))
        .collect()
}

fn epoch_day_to_date(day: i32) -> Result<NaiveDate> {
    day.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| StatsError::TimestampParse {
            value: format!("day {day} since 1970-01-01"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 2, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 2, d).unwrap()
    }

    fn table(times: &[NaiveDateTime], high: &[f64], low: &[f64], close: &[f64]) -> PriceTable {
        let df = df! {
            TIMESTAMP_COL => times,
            HIGH_COL => high,
            LOW_COL => low,
            CLOSE_COL => close,
        }
        .unwrap();
        PriceTable::from_frame(df).unwrap()
    }

    #[test]
    fn epoch_day_conversion() {
        assert_eq!(epoch_day_to_date(0).unwrap(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(epoch_day_to_date(17_588).unwrap(), day(26));
        assert_eq!(epoch_day_to_date(-1).unwrap(), NaiveDate::from_ymd_opt(1969, 12, 31).unwrap());
    }

    #[test]
    fn mean_of_one_bucket() {
        let t = table(
            &[at(26, 9, 0), at(26, 12, 0), at(26, 23, 59)],
            &[10.0, 12.0, 9.0],
            &[5.0, 6.0, 4.0],
            &[1.0, 2.0, 3.0],
        );
        let avg = daily_average(&t, EmptyDayPolicy::Keep).unwrap();
        assert_eq!(avg.entries, vec![DailyAverage { day: day(26), close: Some(2.0) }]);
    }

    #[test]
    fn high_and_low_reduce_independently() {
        let t = table(
            &[at(26, 9, 0), at(26, 12, 0), at(26, 23, 59)],
            &[10.0, 12.0, 9.0],
            &[5.0, 6.0, 4.0],
            &[1.0, 2.0, 3.0],
        );
        let range = daily_high_low(&t, EmptyDayPolicy::Keep).unwrap();
        assert_eq!(
            range.entries,
            vec![DailyRange { day: day(26), high: Some(12.0), low: Some(4.0) }]
        );
    }

    #[test]
    fn gap_day_kept_as_none() {
        let t = table(
            &[at(24, 10, 0), at(26, 10, 0)],
            &[2.0, 4.0],
            &[1.0, 3.0],
            &[1.5, 3.5],
        );

        let avg = daily_average(&t, EmptyDayPolicy::Keep).unwrap();
        let days: Vec<NaiveDate> = avg.entries.iter().map(|e| e.day).collect();
        assert_eq!(days, [day(24), day(25), day(26)]);
        assert_eq!(avg.get(day(25)).unwrap().close, None);

        let range = daily_high_low(&t, EmptyDayPolicy::Keep).unwrap();
        assert_eq!(
            range.get(day(25)),
            Some(&DailyRange { day: day(25), high: None, low: None })
        );
    }

    #[test]
    fn gap_day_dropped_on_request() {
        let t = table(
            &[at(24, 10, 0), at(26, 10, 0)],
            &[2.0, 4.0],
            &[1.0, 3.0],
            &[1.5, 3.5],
        );

        let avg = daily_average(&t, EmptyDayPolicy::Drop).unwrap();
        assert_eq!(avg.len(), 2);
        assert!(avg.get(day(25)).is_none());

        let range = daily_high_low(&t, EmptyDayPolicy::Drop).unwrap();
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn unsorted_rows_bucket_in_day_order() {
        let t = table(
            &[at(27, 1, 0), at(25, 1, 0), at(27, 2, 0)],
            &[3.0, 1.0, 5.0],
            &[2.0, 0.5, 1.0],
            &[2.0, 1.0, 4.0],
        );
        let avg = daily_average(&t, EmptyDayPolicy::Keep).unwrap();
        assert_eq!(
            avg.entries,
            vec![
                DailyAverage { day: day(25), close: Some(1.0) },
                DailyAverage { day: day(26), close: None },
                DailyAverage { day: day(27), close: Some(3.0) },
            ]
        );
    }

    #[test]
    fn empty_table_gives_empty_outputs() {
        let t = table(&[], &[], &[], &[]);
        assert!(daily_average(&t, EmptyDayPolicy::Keep).unwrap().is_empty());
        assert!(daily_high_low(&t, EmptyDayPolicy::Keep).unwrap().is_empty());
    }

    #[test]
    fn missing_close_column_errors() {
        let df = df! {
            TIMESTAMP_COL => &[at(26, 9, 0)],
            HIGH_COL => &[1.0],
            LOW_COL => &[0.5],
        }
        .unwrap();
        let t = PriceTable::from_frame(df).unwrap();
        assert!(matches!(
            daily_average(&t, EmptyDayPolicy::Keep),
            Err(StatsError::MissingColumn(c)) if c == CLOSE_COL
        ));
        assert!(daily_high_low(&t, EmptyDayPolicy::Keep).is_ok());
    }

    #[test]
    fn integer_prices_are_accepted() {
        let df = df! {
            TIMESTAMP_COL => &[at(26, 9, 0), at(26, 10, 0)],
            HIGH_COL => &[10i64, 12],
            LOW_COL => &[5i64, 4],
            CLOSE_COL => &[1i64, 2],
        }
        .unwrap();
        let t = PriceTable::from_frame(df).unwrap();
        assert_eq!(daily_average(&t, EmptyDayPolicy::Keep).unwrap().entries[0].close, Some(1.5));
        let range = daily_high_low(&t, EmptyDayPolicy::Keep).unwrap();
        assert_eq!(range.entries[0].high, Some(12.0));
        assert_eq!(range.entries[0].low, Some(4.0));
    }
}
