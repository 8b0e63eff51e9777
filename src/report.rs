use std::io::Write;

use crate::engine::types::{DailyAverageSeries, DailyRangeTable};
use crate::error::Result;

pub const AVERAGE_HEADER: &str = "Daily average prices -";
// "lowset" is part of the established output text, keep it verbatim.
pub const RANGE_HEADER: &str = "Daily highest and lowset price -";

/// Print both daily aggregates, each under its header line, as polars tables.
pub fn write_report<W: Write>(
    out: &mut W,
    average: &DailyAverageSeries,
    range: &DailyRangeTable,
) -> Result<()> {
    writeln!(out, "{AVERAGE_HEADER}")?;
    writeln!(out, "{}", average.to_frame()?)?;
    writeln!(out, "{RANGE_HEADER}")?;
    writeln!(out, "{}", range.to_frame()?)?;
    out.flush()?;
    Ok(())
}
