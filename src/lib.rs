// float_cmp: only in tests where assert_eq! on f64 is intentional.
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod app;
pub mod chart;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod report;
