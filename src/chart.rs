//! Close-price line chart for a single day, drawn to SVG with `plotters`.

use chrono::{NaiveDate, NaiveDateTime};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::engine::types::DateSelection;
use crate::error::{Result, StatsError};

/// Pixel size of the rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 576,
        }
    }
}

/// `<dir>/close_<YYYY-MM-DD>.svg`
pub fn chart_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("close_{}.svg", date.format("%Y-%m-%d")))
}

/// Draw close over time for the selected day and write it to `path`.
///
/// The x axis always spans the whole day. An empty selection still produces
/// a chart with axes and no line.
pub fn render_close_chart(selection: &DateSelection, size: ChartSize, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let root = SVGBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let (start, end) = selection.day_bounds();
    let (y_min, y_max) = padded(selection.close_bounds());

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("close {}", selection.date), ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(72)
        .build_cartesian_2d(RangedDateTime::from(start..end), y_min..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|t: &NaiveDateTime| t.format("%H:%M").to_string())
        .x_desc("TIMESTAMP")
        .y_desc("close")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            selection.points.iter().map(|p| (p.timestamp, p.close)),
            &BLUE,
        ))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    tracing::info!(path = %path.display(), points = selection.points.len(), "Wrote close chart");
    Ok(())
}

/// Hand the chart to the desktop's default viewer without waiting on it.
pub fn open_in_viewer(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(path).spawn()?;
    Ok(())
}

/// Y range with a little headroom; flat or empty data still gets a
/// non-degenerate range.
fn padded(bounds: Option<(f64, f64)>) -> (f64, f64) {
    match bounds {
        None => (0.0, 1.0),
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((lo, _)) => {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.001 };
            (lo - pad, lo + pad)
        }
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> StatsError {
    StatsError::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ClosePoint;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 2, 26).unwrap()
    }

    #[test]
    fn chart_path_uses_iso_date() {
        assert_eq!(
            chart_path(Path::new("out"), date()),
            PathBuf::from("out/close_2018-02-26.svg")
        );
    }

    #[test]
    fn padding_handles_degenerate_ranges() {
        assert_eq!(padded(None), (0.0, 1.0));
        let (lo, hi) = padded(Some((1.5, 1.5)));
        assert!(lo < 1.5 && hi > 1.5);
        let (lo, hi) = padded(Some((0.0, 0.0)));
        assert_eq!((lo, hi), (-1.0, 1.0));
        let (lo, hi) = padded(Some((1.0, 2.0)));
        assert!(lo < 1.0 && hi > 2.0);
    }

    #[test]
    fn writes_svg_with_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = chart_path(dir.path(), date());
        let selection = DateSelection {
            date: date(),
            points: vec![
                ClosePoint { timestamp: date().and_hms_opt(9, 0, 0).unwrap(), close: 1.39 },
                ClosePoint { timestamp: date().and_hms_opt(9, 1, 0).unwrap(), close: 1.40 },
                ClosePoint { timestamp: date().and_hms_opt(9, 2, 0).unwrap(), close: 1.38 },
            ],
        };

        render_close_chart(&selection, ChartSize::default(), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polyline"));
    }

    #[test]
    fn empty_selection_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("empty.svg");
        let selection = DateSelection { date: date(), points: vec![] };

        render_close_chart(&selection, ChartSize::default(), &path).unwrap();
        assert!(path.exists());
    }
}
