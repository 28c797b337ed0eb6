//! Data Cleaner Module
//! Reports missing and duplicate cells, then fills every missing cell with 0.

use super::loader::is_numeric;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

/// Text written into non-numeric columns in place of a missing cell.
pub const TEXT_SENTINEL: &str = "0";

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// What the cleaner observed before filling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// Null count per column, in column order.
    pub missing: Vec<(String, usize)>,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    /// Cells replaced with the sentinel.
    pub cells_filled: usize,
}

/// Handles missing-value reporting and filling.
pub struct DataCleaner;

impl DataCleaner {
    /// Report missing and duplicate counts, then fill missing cells in place.
    pub fn clean(df: &mut DataFrame) -> Result<CleaningReport, CleanerError> {
        let missing = Self::missing_counts(df);
        let duplicate_rows = Self::duplicate_count(df)?;
        let cells_filled = Self::fill_missing_with_zero(df)?;

        info!(duplicate_rows, cells_filled, "cleaned table");

        Ok(CleaningReport {
            missing,
            duplicate_rows,
            cells_filled,
        })
    }

    /// Null count per column.
    pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    /// Count rows that repeat an earlier row across every column.
    ///
    /// Nulls compare equal to nulls. No rows are removed.
    pub fn duplicate_count(df: &DataFrame) -> Result<usize, CleanerError> {
        let distinct = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        Ok(df.height() - distinct.height())
    }

    /// Replace every null cell with 0.
    ///
    /// Numeric columns keep their dtype and receive numeric zero. Any other
    /// column is converted to text and receives `"0"`.
    pub fn fill_missing_with_zero(df: &mut DataFrame) -> Result<usize, CleanerError> {
        let mut replacements: Vec<Column> = Vec::new();
        let mut filled = 0;

        for col in df.get_columns() {
            let nulls = col.null_count();
            if nulls == 0 {
                continue;
            }
            filled += nulls;

            let series = col.as_materialized_series();
            let replaced = if is_numeric(col.dtype()) {
                series.fill_null(FillNullStrategy::Zero)?
            } else {
                let text = series.cast(&DataType::String)?;
                let ca: StringChunked = text
                    .str()?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or(TEXT_SENTINEL)))
                    .collect();
                ca.with_name(col.name().clone()).into_series()
            };

            debug!(column = %col.name(), nulls, "filled missing cells");
            replacements.push(replaced.into_column());
        }

        for col in replacements {
            df.with_column(col)?;
        }

        Ok(filled)
    }
}
