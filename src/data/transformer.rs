//! Data Transformer Module
//! Renames the source columns, parses arrival dates and derives price fields.

use super::{
    ARRIVAL_DATE, AVERAGE_PRICE, DATE_RECORDED, MAX_PRICE, MIN_PRICE, MONTH, PROFIT,
    SOURCE_MAX_PRICE, SOURCE_MIN_PRICE, YEAR,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

/// Old name → new name, applied in order.
pub const COLUMN_RENAMES: [(&str, &str); 3] = [
    (ARRIVAL_DATE, DATE_RECORDED),
    (SOURCE_MIN_PRICE, MIN_PRICE),
    (SOURCE_MAX_PRICE, MAX_PRICE),
];

/// Date layouts tried in order. Day comes before month.
const DATE_FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Expected column '{0}' not found")]
    MissingColumn(String),
}

/// Outcome of the transformation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Rows whose date could not be parsed.
    pub unparsable_dates: usize,
}

/// Parse one arrival date. Returns `None` for anything unrecognised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Days since 1970-01-01, the physical value of a polars `Date`.
fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}

/// Handles in-place column renames and derived fields.
pub struct DataTransformer;

impl DataTransformer {
    /// Run rename, date parsing and price derivation on the table.
    pub fn transform(df: &mut DataFrame) -> Result<TransformReport, TransformError> {
        Self::rename_columns(df)?;
        let unparsable_dates = Self::parse_dates(df)?;
        Self::derive_prices(df)?;

        info!(
            columns = df.width(),
            unparsable_dates, "transformed table"
        );

        Ok(TransformReport { unparsable_dates })
    }

    /// Apply the fixed source → report column renames.
    pub fn rename_columns(df: &mut DataFrame) -> Result<(), TransformError> {
        for (old, new) in COLUMN_RENAMES {
            if df.column(old).is_err() {
                return Err(TransformError::MissingColumn(old.to_string()));
            }
            df.rename(old, new.into())?;
        }
        Ok(())
    }

    /// Convert `Date Recorded` to a date column and add `Year` and `Month`.
    ///
    /// Returns the number of rows whose date could not be parsed.
    pub fn parse_dates(df: &mut DataFrame) -> Result<usize, TransformError> {
        let raw = df
            .column(DATE_RECORDED)
            .map_err(|_| TransformError::MissingColumn(DATE_RECORDED.to_string()))?
            .cast(&DataType::String)?;

        let len = raw.len();
        let mut days: Vec<Option<i32>> = Vec::with_capacity(len);
        let mut years: Vec<Option<i32>> = Vec::with_capacity(len);
        let mut months: Vec<Option<i32>> = Vec::with_capacity(len);
        let mut unparsable = 0;

        for value in raw.str()?.into_iter() {
            match value.and_then(parse_date) {
                Some(date) => {
                    days.push(days_since_epoch(date));
                    years.push(Some(date.year()));
                    months.push(Some(date.month() as i32));
                }
                None => {
                    unparsable += 1;
                    days.push(None);
                    years.push(None);
                    months.push(None);
                }
            }
        }

        if unparsable > 0 {
            warn!(rows = unparsable, "unparsable dates coerced to null");
        }

        let dates = Series::new(DATE_RECORDED.into(), days).cast(&DataType::Date)?;
        df.with_column(dates)?;
        df.with_column(Series::new(YEAR.into(), years))?;
        df.with_column(Series::new(MONTH.into(), months))?;

        Ok(unparsable)
    }

    /// Recompute `Average Price` and `Profit` from `Min Price` and `Max Price`.
    pub fn derive_prices(df: &mut DataFrame) -> Result<(), TransformError> {
        let min = Self::price_column(df, MIN_PRICE)?;
        let max = Self::price_column(df, MAX_PRICE)?;

        let (average, profit): (Vec<Option<f64>>, Vec<Option<f64>>) = min
            .f64()?
            .into_iter()
            .zip(max.f64()?.into_iter())
            .map(|(lo, hi)| match (lo, hi) {
                (Some(lo), Some(hi)) => (Some((lo + hi) / 2.0), Some(hi - lo)),
                _ => (None, None),
            })
            .unzip();

        df.with_column(Series::new(AVERAGE_PRICE.into(), average))?;
        df.with_column(Series::new(PROFIT.into(), profit))?;
        Ok(())
    }

    fn price_column(df: &DataFrame, name: &str) -> Result<Column, TransformError> {
        let col = df
            .column(name)
            .map_err(|_| TransformError::MissingColumn(name.to_string()))?;
        Ok(col.cast(&DataType::Float64)?)
    }
}
