use anyhow::{Context, Result};
use tracing_subscriber::{self, EnvFilter};

use daily_price_stats::app::{finish, run};
use daily_price_stats::chart::open_in_viewer;
use daily_price_stats::config::AppConfig;

fn main() -> Result<()> {
    // Print every day of the daily tables unless the user asked otherwise.
    if std::env::var_os("POLARS_FMT_MAX_ROWS").is_none() {
        std::env::set_var("POLARS_FMT_MAX_ROWS", "-1");
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env(std::env::args().skip(1)).context("Invalid configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let output = run(&config, &mut out)
        .with_context(|| format!("Failed to process {}", config.data_path.display()))?;

    let stdin = std::io::stdin();
    finish(&config, &output, &mut stdin.lock(), &mut out, open_in_viewer)
        .context("Failed waiting for input")?;

    Ok(())
}
