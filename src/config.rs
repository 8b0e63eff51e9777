use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chart::ChartSize;
use crate::engine::parse_chart_date;
use crate::engine::types::EmptyDayPolicy;
use crate::error::{Result, StatsError};

pub const DEFAULT_DATA_PATH: &str = "gbpusd_sample.csv";

/// Day charted when nothing else is configured.
pub const DEFAULT_CHART_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2018, 2, 26) {
    Some(date) => date,
    None => panic!("default chart date is not a calendar date"),
};

pub const ENV_CONFIG_FILE: &str = "PRICE_STATS_CONFIG";
pub const ENV_CHART_DATE: &str = "PRICE_STATS_CHART_DATE";
pub const ENV_EMPTY_DAYS: &str = "PRICE_STATS_EMPTY_DAYS";
pub const ENV_MODE: &str = "PRICE_STATS_MODE";
pub const ENV_CHART_DIR: &str = "PRICE_STATS_CHART_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Open the chart in a viewer and wait for Enter before exiting.
    #[default]
    Interactive,
    /// Write the chart and exit.
    Batch,
}

impl std::str::FromStr for RunMode {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" => Ok(Self::Interactive),
            "batch" => Ok(Self::Batch),
            other => Err(StatsError::InvalidConfig(format!(
                "mode must be 'interactive' or 'batch', got '{other}'"
            ))),
        }
    }
}

/// Run configuration.
///
/// Layering, lowest to highest precedence:
///
/// | Source | Keys |
/// |--------|------|
/// | built-in defaults | all |
/// | TOML file named by `PRICE_STATS_CONFIG` | all |
/// | `PRICE_STATS_CHART_DATE` | `chart_date` (`YYYY-MM-DD`) |
/// | `PRICE_STATS_EMPTY_DAYS` | `empty_days` (`keep` / `drop`) |
/// | `PRICE_STATS_MODE` | `mode` (`interactive` / `batch`) |
/// | `PRICE_STATS_CHART_DIR` | `chart_dir` |
/// | first positional CLI argument | `data_path` |
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    #[garde(skip)]
    pub data_path: PathBuf,
    #[garde(skip)]
    pub chart_date: NaiveDate,
    #[garde(skip)]
    pub empty_days: EmptyDayPolicy,
    #[garde(skip)]
    pub mode: RunMode,
    #[garde(skip)]
    pub chart_dir: PathBuf,
    #[garde(range(min = 200, max = 8192))]
    pub chart_width: u32,
    #[garde(range(min = 200, max = 8192))]
    pub chart_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let size = ChartSize::default();
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            chart_date: DEFAULT_CHART_DATE,
            empty_days: EmptyDayPolicy::Keep,
            mode: RunMode::Interactive,
            chart_dir: PathBuf::from("."),
            chart_width: size.width,
            chart_height: size.height,
        }
    }
}

impl AppConfig {
    /// Build from the process environment and CLI arguments (program name
    /// already skipped). A `.env` file, if present, is loaded first.
    pub fn from_env<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok(), args)
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F, I>(lookup: F, args: I) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let mut config = match lookup(ENV_CONFIG_FILE) {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(date) = lookup(ENV_CHART_DATE) {
            config.chart_date = parse_chart_date(&date)?;
        }
        if let Some(policy) = lookup(ENV_EMPTY_DAYS) {
            config.empty_days = policy.parse()?;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(dir) = lookup(ENV_CHART_DIR) {
            config.chart_dir = PathBuf::from(dir);
        }

        let mut args = args.into_iter();
        if let Some(path) = args.next() {
            config.data_path = PathBuf::from(path);
        }
        if let Some(extra) = args.next() {
            return Err(StatsError::InvalidConfig(format!(
                "expected at most one argument (data file path), got extra '{extra}'"
            )));
        }

        config.check()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StatsError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StatsError::InvalidConfig(e.to_string()))
    }

    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| StatsError::InvalidConfig(e.to_string()))
    }

    pub fn chart_size(&self) -> ChartSize {
        ChartSize {
            width: self.chart_width,
            height: self.chart_height,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.mode == RunMode::Interactive
    }
}
