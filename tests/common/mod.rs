#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

pub const HEADER: &str = "TIMESTAMP,open,high,low,close,volume";

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 2, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 2, d).unwrap()
}

/// One OHLC row as CSV text: `(timestamp, open, high, low, close, volume)`.
pub fn row(ts: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> String {
    format!("{},{open},{high},{low},{close},100", ts.format("%Y-%m-%d %H:%M:%S"))
}

pub fn write_csv(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
    let mut body = String::from(HEADER);
    body.push('\n');
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Rows on Feb 23, 26 and 27 2018, with nothing on the weekend in between.
///
/// | Day    | close values     | highs          | lows         |
/// |--------|------------------|----------------|--------------|
/// | Feb 23 | 1.0              | 1.5            | 0.5          |
/// | Feb 26 | 1.0, 2.0, 3.0    | 10, 12, 9      | 5, 6, 4      |
/// | Feb 27 | 4.0, 6.0         | 7, 8           | 3, 2         |
pub fn weekend_gap_rows() -> Vec<String> {
    vec![
        row(at(23, 16, 0), 1.0, 1.5, 0.5, 1.0),
        row(at(26, 0, 0), 1.0, 10.0, 5.0, 1.0),
        row(at(26, 12, 30), 1.0, 12.0, 6.0, 2.0),
        row(at(26, 23, 59), 2.0, 9.0, 4.0, 3.0),
        row(at(27, 8, 0), 3.0, 7.0, 3.0, 4.0),
        row(at(27, 9, 0), 4.0, 8.0, 2.0, 6.0),
    ]
}
