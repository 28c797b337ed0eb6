//! Statistics Calculator Module
//! Handles descriptive statistics, grouped aggregates, correlation and density estimates.

use crate::data::{is_numeric, AVERAGE_PRICE, MARKET};
use polars::prelude::*;
use statrs::distribution::{Continuous, Normal};
use std::collections::HashMap;

/// Summary of a single column, shaped like a `describe()` table column.
///
/// Numeric fields are NaN for text columns; the text fields are `None` for
/// numeric columns.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for ColumnSummary {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            unique: None,
            top: None,
            freq: None,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Kernel density estimate evaluated on an evenly spaced grid.
#[derive(Debug, Clone)]
pub struct KdeCurve {
    pub bandwidth: f64,
    /// `(x, density)` pairs; densities integrate to 1.
    pub points: Vec<(f64, f64)>,
}

/// Handles statistical calculations over the record table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;

        // Sample standard deviation, undefined for a single value.
        let std = if n > 1 {
            (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        ColumnSummary {
            count: n,
            mean,
            std,
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
            ..Default::default()
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Non-null values of a column as `f64`. Cells that do not convert are skipped.
    pub fn numeric_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<f64>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect())
    }

    /// Column values as `f64`, keeping row alignment.
    fn aligned_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Column values rendered as text, keeping row alignment.
    pub fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
        let values = df.column(column)?.cast(&DataType::String)?;
        Ok(values
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Describe one column.
    pub fn describe_column(df: &DataFrame, column: &str) -> PolarsResult<ColumnSummary> {
        let col = df.column(column)?;

        let mut summary = if is_numeric(col.dtype()) {
            Self::compute_descriptive_stats(&Self::numeric_values(df, column)?)
        } else {
            let texts = Self::text_values(df, column)?;
            let counts = Self::frequencies(texts.iter().flatten().map(String::as_str));
            let top = counts.first().cloned();
            ColumnSummary {
                count: col.len() - col.null_count(),
                unique: Some(counts.len()),
                freq: top.as_ref().map(|(_, n)| *n),
                top: top.map(|(value, _)| value),
                ..Default::default()
            }
        };

        summary.column = column.to_string();
        Ok(summary)
    }

    /// Describe every column of the table, in column order.
    pub fn describe(df: &DataFrame) -> PolarsResult<Vec<ColumnSummary>> {
        df.get_column_names()
            .iter()
            .map(|name| Self::describe_column(df, name.as_str()))
            .collect()
    }

    /// Distinct non-null values per column.
    pub fn unique_counts(df: &DataFrame) -> PolarsResult<Vec<(String, usize)>> {
        df.get_columns()
            .iter()
            .map(|col| {
                let distinct = col.n_unique()?;
                let distinct = if col.null_count() > 0 {
                    distinct - 1
                } else {
                    distinct
                };
                Ok((col.name().to_string(), distinct))
            })
            .collect()
    }

    /// Occurrences of each value, most frequent first, ties in first-seen order.
    fn frequencies<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for value in values {
            match index.get(value) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(value, counts.len());
                    counts.push((value.to_string(), 1));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Row count per value of `key`, most frequent first, ties by name.
    pub fn value_counts(df: &DataFrame, key: &str) -> PolarsResult<Vec<(String, usize)>> {
        let texts = Self::text_values(df, key)?;
        let mut counts = Self::frequencies(texts.iter().flatten().map(String::as_str));
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    /// Mean of `value` per distinct `key`, ordered by key.
    pub fn group_mean(df: &DataFrame, key: &str, value: &str) -> PolarsResult<Vec<(String, f64)>> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([col(value).cast(DataType::Float64).mean()])
            .collect()?;

        let keys = grouped.column(key)?.cast(&DataType::String)?;
        let means = grouped.column(value)?.cast(&DataType::Float64)?;

        let mut pairs: Vec<(String, f64)> = keys
            .str()?
            .into_iter()
            .zip(means.f64()?.into_iter())
            .filter_map(|(k, m)| match (k, m) {
                (Some(k), Some(m)) if !m.is_nan() => Some((k.to_string(), m)),
                _ => None,
            })
            .collect();

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }

    /// Sort descending by value (ties by name) and keep the first `n`.
    pub fn rank_descending(mut pairs: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
        pairs.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        pairs.truncate(n);
        pairs
    }

    /// Markets with the highest mean Average Price.
    pub fn top_markets(df: &DataFrame, n: usize) -> PolarsResult<Vec<(String, f64)>> {
        let means = Self::group_mean(df, MARKET, AVERAGE_PRICE)?;
        Ok(Self::rank_descending(means, n))
    }

    /// Pearson correlation over paired values. NaN when either side is constant.
    pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
        let n = pairs.len();
        if n < 2 {
            return f64::NAN;
        }

        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for &(x, y) in pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return f64::NAN;
        }
        cov / (var_x.sqrt() * var_y.sqrt())
    }

    /// Pairwise Pearson correlation matrix, using rows where both cells are present.
    pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> PolarsResult<Vec<Vec<f64>>> {
        let values: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|c| Self::aligned_values(df, c))
            .collect::<PolarsResult<_>>()?;

        let k = columns.len();
        let mut matrix = vec![vec![f64::NAN; k]; k];
        for i in 0..k {
            for j in i..k {
                let pairs: Vec<(f64, f64)> = values[i]
                    .iter()
                    .zip(values[j].iter())
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .collect();
                let r = Self::pearson(&pairs);
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }
        Ok(matrix)
    }

    /// Gaussian kernel density estimate with Scott's bandwidth.
    ///
    /// Returns `None` when there are fewer than two values or no spread.
    pub fn kde(values: &[f64], grid_points: usize) -> Option<KdeCurve> {
        let n = values.len();
        if n < 2 || grid_points < 2 {
            return None;
        }

        let summary = Self::compute_descriptive_stats(values);
        if summary.std.is_nan() || summary.std <= 0.0 {
            return None;
        }

        let bandwidth = summary.std * (n as f64).powf(-0.2);
        let kernel = Normal::new(0.0, 1.0).ok()?;

        let step = (summary.max - summary.min) / (grid_points - 1) as f64;
        let points = (0..grid_points)
            .map(|i| {
                let x = summary.min + step * i as f64;
                let density = values
                    .iter()
                    .map(|v| kernel.pdf((x - v) / bandwidth))
                    .sum::<f64>()
                    / (n as f64 * bandwidth);
                (x, density)
            })
            .collect();

        Some(KdeCurve { bandwidth, points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markets() -> DataFrame {
        df!(
            "Market" => ["A", "B", "C", "D", "E", "F", "A", "B"],
            "State" => ["Kerala", "Kerala", "Goa", "Goa", "Goa", "Bihar", "Kerala", "Kerala"],
            "Average Price" => [100.0, 300.0, 250.0, 50.0, 400.0, 10.0, 200.0, 100.0]
        )
        .unwrap()
    }

    #[test]
    fn descriptive_stats_use_sample_std() {
        let s = StatsCalculator::compute_descriptive_stats(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.p25, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.p75, 3.25);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn single_value_has_no_spread() {
        let s = StatsCalculator::compute_descriptive_stats(&[7.0]);
        assert_eq!(s.mean, 7.0);
        assert!(s.std.is_nan());
    }

    #[test]
    fn describe_text_column() {
        let df = markets();
        let s = StatsCalculator::describe_column(&df, "State").unwrap();
        assert!(s.unique.is_some());
        assert_eq!(s.count, 8);
        assert_eq!(s.unique, Some(3));
        assert_eq!(s.top.as_deref(), Some("Kerala"));
        assert_eq!(s.freq, Some(4));
        assert!(s.mean.is_nan());
    }

    #[test]
    fn describe_covers_every_column() {
        let df = markets();
        let all = StatsCalculator::describe(&df).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[2].unique.is_none());
        assert_eq!(all[2].max, 400.0);
    }

    #[test]
    fn unique_counts_ignore_nulls() {
        let df = df!(
            "Grade" => [Some("FAQ"), None, Some("FAQ"), Some("Local")],
            "Price" => [1i64, 2, 3, 3]
        )
        .unwrap();
        assert_eq!(
            StatsCalculator::unique_counts(&df).unwrap(),
            vec![("Grade".to_string(), 2), ("Price".to_string(), 3)]
        );
    }

    #[test]
    fn group_mean_per_key() {
        let df = markets();
        let means = StatsCalculator::group_mean(&df, "State", "Average Price").unwrap();
        assert_eq!(
            means,
            vec![
                ("Bihar".to_string(), 10.0),
                ("Goa".to_string(), 700.0 / 3.0),
                ("Kerala".to_string(), 175.0),
            ]
        );
    }

    #[test]
    fn top_markets_are_non_increasing_and_capped() {
        let df = markets();
        let top = StatsCalculator::top_markets(&df, 5).unwrap();
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(top[0], ("E".to_string(), 400.0));
        assert_eq!(top[1], ("C".to_string(), 250.0));
        assert_eq!(top[2], ("B".to_string(), 200.0));
        assert_eq!(top[3], ("A".to_string(), 150.0));
        assert!(!top.iter().any(|(m, _)| m == "F"));
    }

    #[test]
    fn top_markets_with_few_markets() {
        let df = df!(
            "Market" => ["A", "B"],
            "Average Price" => [1.0, 2.0]
        )
        .unwrap();
        let top = StatsCalculator::top_markets(&df, 5).unwrap();
        assert_eq!(top, vec![("B".to_string(), 2.0), ("A".to_string(), 1.0)]);
    }

    #[test]
    fn rank_descending_breaks_ties_by_name() {
        let ranked = StatsCalculator::rank_descending(
            vec![("b".to_string(), 1.0), ("a".to_string(), 1.0), ("c".to_string(), 2.0)],
            5,
        );
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn value_counts_most_frequent_first() {
        let df = markets();
        assert_eq!(
            StatsCalculator::value_counts(&df, "State").unwrap(),
            vec![
                ("Kerala".to_string(), 4),
                ("Goa".to_string(), 3),
                ("Bihar".to_string(), 1),
            ]
        );
    }

    #[test]
    fn correlation_of_linear_columns() {
        let df = df!(
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [2.0, 4.0, 6.0, 8.0],
            "z" => [4.0, 3.0, 2.0, 1.0],
            "c" => [5.0, 5.0, 5.0, 5.0]
        )
        .unwrap();
        let m = StatsCalculator::correlation_matrix(&df, &["x", "y", "z", "c"]).unwrap();
        assert!((m[0][1] - 1.0).abs() < 1e-12);
        assert!((m[0][2] + 1.0).abs() < 1e-12);
        assert!((m[1][1] - 1.0).abs() < 1e-12);
        assert!(m[0][3].is_nan());
        assert_eq!(m[1][2], m[2][1]);
    }

    #[test]
    fn correlation_skips_incomplete_rows() {
        let df = df!(
            "x" => [Some(1.0), Some(2.0), None, Some(3.0)],
            "y" => [Some(1.0), Some(2.0), Some(100.0), Some(3.0)]
        )
        .unwrap();
        let m = StatsCalculator::correlation_matrix(&df, &["x", "y"]).unwrap();
        assert!((m[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let curve = StatsCalculator::kde(&values, 400).unwrap();
        assert!(curve.bandwidth > 0.0);

        let width = curve.points[1].0 - curve.points[0].0;
        let area: f64 = curve.points.iter().map(|(_, d)| d * width).sum();
        // the grid stops at the data range, so a little mass is cut off
        assert!(area > 0.8 && area < 1.05, "area = {area}");
    }

    #[test]
    fn kde_needs_spread() {
        assert!(StatsCalculator::kde(&[3.0, 3.0, 3.0], 50).is_none());
        assert!(StatsCalculator::kde(&[3.0], 50).is_none());
    }
}
