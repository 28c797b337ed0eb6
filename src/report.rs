//! Console Report Module
//! Writes the exploratory summary of the price table to any writer.

use crate::data::{CleanerError, CleaningReport, DataCleaner, TransformReport};
use crate::stats::{ColumnSummary, StatsCalculator};
use polars::prelude::*;
use std::io::{self, Write};
use thiserror::Error;

/// Rows shown by the head preview.
pub const HEAD_ROWS: usize = 5;
/// Markets listed in the ranking.
pub const TOP_MARKETS: usize = 5;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Cleaner(#[from] CleanerError),
}

pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Full report for the cleaned and transformed table.
    pub fn write_all(
        &mut self,
        df: &DataFrame,
        cleaning: &CleaningReport,
        transform: &TransformReport,
    ) -> Result<(), ReportError> {
        self.print_cleaning(cleaning)?;
        self.print_transform(transform)?;
        self.print_overview(df)?;
        self.print_missing(df)?;
        self.print_duplicates(df)?;
        self.print_describe(df)?;
        self.print_unique_counts(df)?;
        self.print_top_markets(df)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_cleaning(&mut self, report: &CleaningReport) -> Result<(), ReportError> {
        self.heading("Missing values before cleaning")?;
        for (column, missing) in &report.missing {
            writeln!(self.out, "{:<20} {}", column, missing)?;
        }
        writeln!(self.out, "Duplicate rows: {}", report.duplicate_rows)?;
        writeln!(self.out, "Cells filled with 0: {}", report.cells_filled)?;
        Ok(())
    }

    pub fn print_transform(&mut self, report: &TransformReport) -> Result<(), ReportError> {
        self.heading("Date parsing")?;
        writeln!(self.out, "Unparsable dates: {}", report.unparsable_dates)?;
        Ok(())
    }

    /// Head preview, per-column info and shape.
    pub fn print_overview(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        self.heading("First rows")?;
        writeln!(self.out, "{}", df.head(Some(HEAD_ROWS)))?;

        self.heading("Info")?;
        writeln!(self.out, "{:<4} {:<20} {:>14} {:<10}", "#", "Column", "Non-Null Count", "Dtype")?;
        for (i, col) in df.get_columns().iter().enumerate() {
            writeln!(
                self.out,
                "{:<4} {:<20} {:>14} {:<10}",
                i,
                col.name().as_str(),
                col.len() - col.null_count(),
                col.dtype().to_string()
            )?;
        }
        writeln!(self.out, "memory usage: {}", human_bytes(df.estimated_size()))?;

        let (rows, cols) = df.shape();
        writeln!(self.out, "Shape: ({}, {})", rows, cols)?;
        Ok(())
    }

    pub fn print_missing(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        self.heading("Missing values")?;
        for (column, missing) in DataCleaner::missing_counts(df) {
            writeln!(self.out, "{:<20} {}", column, missing)?;
        }
        Ok(())
    }

    pub fn print_duplicates(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        let duplicates = DataCleaner::duplicate_count(df)?;
        writeln!(self.out, "\nDuplicate rows: {}", duplicates)?;
        Ok(())
    }

    /// Descriptive statistics, one row per column, values to 1 decimal place.
    pub fn print_describe(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        self.heading("Descriptive statistics")?;
        writeln!(
            self.out,
            "{:<16} {:>8} {:>8} {:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for summary in StatsCalculator::describe(df)? {
            writeln!(self.out, "{}", describe_row(&summary))?;
        }
        Ok(())
    }

    pub fn print_unique_counts(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        self.heading("Unique values")?;
        for (column, unique) in StatsCalculator::unique_counts(df)? {
            writeln!(self.out, "{:<20} {}", column, unique)?;
        }
        Ok(())
    }

    pub fn print_top_markets(&mut self, df: &DataFrame) -> Result<(), ReportError> {
        self.heading("Top markets by average price")?;
        for (market, mean) in StatsCalculator::top_markets(df, TOP_MARKETS)? {
            writeln!(self.out, "{:<30} {:.1}", market, mean)?;
        }
        Ok(())
    }

    fn heading(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{}", title)?;
        writeln!(self.out, "{}", "-".repeat(title.len()))
    }
}

fn describe_row(s: &ColumnSummary) -> String {
    let num = |v: f64| {
        if v.is_nan() {
            "NaN".to_string()
        } else {
            format!("{:.1}", v)
        }
    };
    let opt = |v: Option<usize>| v.map_or_else(|| "NaN".to_string(), |n| n.to_string());

    format!(
        "{:<16} {:>8} {:>8} {:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        truncate(&s.column, 16),
        format!("{:.1}", s.count as f64),
        opt(s.unique),
        truncate(s.top.as_deref().unwrap_or("NaN"), 14),
        opt(s.freq),
        num(s.mean),
        num(s.std),
        num(s.min),
        num(s.p25),
        num(s.median),
        num(s.p75),
        num(s.max),
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1}+ {}", size, UNITS[unit])
    }
}
