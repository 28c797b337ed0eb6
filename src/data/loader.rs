//! CSV Data Loader Module
//! Reads the market price file into a Polars DataFrame.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Rows sampled when inferring the column schema.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Cell contents read as missing, on top of empty cells.
const NULL_MARKERS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Input file not found: {0}")]
    NotFound(String),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file into a DataFrame.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::NotFound(file_path.display().to_string()));
        }

        info!(path = %file_path.display(), "loading csv");

        let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|s| (*s).into()).collect());

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_null_values(Some(null_values))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        debug!(
            columns = ?Self::column_names(&df),
            numeric = ?Self::numeric_columns(&df),
            "inferred schema"
        );
        info!(rows = df.height(), columns = df.width(), "csv loaded");
        Ok(df)
    }

    /// Get list of column names.
    pub fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Check whether a column exists.
    pub fn has_column(df: &DataFrame, name: &str) -> bool {
        df.column(name).is_ok()
    }
}

/// True for the integer and float dtypes.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
