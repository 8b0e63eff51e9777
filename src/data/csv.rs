use polars::prelude::*;
use std::path::{Path, PathBuf};

use super::{PriceSource, PriceTable};
use crate::error::{Result, StatsError};

/// Delimited-text price file. The separator is picked from the extension:
/// `.tsv`/`.tab` read tab-separated, everything else comma-separated.
pub struct CsvStore {
    path: PathBuf,
    separator: u8,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let separator = separator_for(&path);
        Self { path, separator }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&self) -> Result<DataFrame> {
        if !self.path.exists() {
            return Err(StatsError::FileNotFound(self.path.clone()));
        }

        let separator = self.separator;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_separator(separator).with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;
        Ok(df)
    }
}

impl PriceSource for CsvStore {
    fn load_prices(&self) -> Result<PriceTable> {
        let df = self.read_frame()?;
        let table = PriceTable::from_frame(df)?;
        tracing::debug!(
            path = %self.path.display(),
            rows = table.height(),
            columns = table.frame().width(),
            "Loaded price table"
        );
        Ok(table)
    }
}

fn separator_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
        _ => b',',
    }
}
