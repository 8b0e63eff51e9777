use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::chart::{chart_path, render_close_chart};
use crate::config::AppConfig;
use crate::data::csv::CsvStore;
use crate::data::PriceSource;
use crate::engine::types::{DailyAverageSeries, DailyRangeTable, DateSelection};
use crate::engine::{daily_average, daily_high_low, select_date};
use crate::error::Result;
use crate::report::write_report;

pub const CONTINUE_PROMPT: &str = "Press Enter to continue";

/// What one pass of the pipeline produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: usize,
    pub average: DailyAverageSeries,
    pub range: DailyRangeTable,
    pub selection: DateSelection,
    pub chart: PathBuf,
}

/// Load, aggregate, report to `out`, and render the chart.
///
/// Loading happens before anything is written, so a bad data path leaves
/// `out` untouched.
pub fn run<W: Write>(config: &AppConfig, out: &mut W) -> Result<RunOutput> {
    let store = CsvStore::new(&config.data_path);
    let table = store.load_prices()?;
    tracing::info!(path = %store.path().display(), rows = table.height(), "Loaded");

    let average = daily_average(&table, config.empty_days)?;
    let range = daily_high_low(&table, config.empty_days)?;
    tracing::info!(days = average.len(), policy = ?config.empty_days, "Aggregated");

    write_report(out, &average, &range)?;

    let selection = select_date(&table, config.chart_date)?;
    let chart = chart_path(&config.chart_dir, config.chart_date);
    render_close_chart(&selection, config.chart_size(), &chart)?;
    tracing::info!(date = %config.chart_date, "Rendered");

    Ok(RunOutput {
        rows: table.height(),
        average,
        range,
        selection,
        chart,
    })
}

/// Close out a run. Interactive mode hands the chart to `open_viewer` and then
/// waits for Enter; a viewer failure is logged and does not stop the wait.
/// Batch mode writes nothing and reads nothing.
pub fn finish<R, W, V>(
    config: &AppConfig,
    output: &RunOutput,
    input: &mut R,
    out: &mut W,
    open_viewer: V,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    V: FnOnce(&Path) -> Result<()>,
{
    if !config.is_interactive() {
        tracing::info!(path = %output.chart.display(), "Batch mode, skipping viewer");
        return Ok(());
    }

    if let Err(e) = open_viewer(&output.chart) {
        tracing::warn!(error = %e, path = %output.chart.display(), "Could not open chart viewer");
    }
    wait_for_enter(input, out)
}

/// Print the continue prompt and block until a line (or EOF) arrives.
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<()> {
    writeln!(out, "{CONTINUE_PROMPT}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}
