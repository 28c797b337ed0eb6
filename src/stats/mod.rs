//! Stats module - descriptive statistics and aggregations

mod calculator;

pub use calculator::{ColumnSummary, StatsCalculator};
