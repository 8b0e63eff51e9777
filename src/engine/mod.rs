pub mod resample;
pub mod select;
pub mod types;

pub use resample::{daily_average, daily_high_low};
pub use select::{parse_chart_date, select_date};
