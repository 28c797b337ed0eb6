//! Chart Plotter Module
//! Turns the record table into the data behind each chart.

use crate::data::{
    DataLoader, AVERAGE_PRICE, GRADE, MAX_PRICE, MIN_PRICE, PRICE_COLUMNS, PROFIT, STATE,
};
use crate::stats::StatsCalculator;
use polars::prelude::*;
use tracing::{debug, info};

/// Number of histogram buckets for the Profit distribution.
pub const HISTOGRAM_BINS: usize = 20;

/// Points on which the density overlay is evaluated.
const KDE_GRID_POINTS: usize = 200;

/// Group name used by the box plot when the table has no Grade column.
pub const ALL_GROUP: &str = "All";

/// Mean value per category.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

/// Row count per category, drawn as shares of the whole.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChartData {
    pub title: String,
    pub slices: Vec<(String, usize)>,
    /// Degrees, counter-clockwise from the positive x axis.
    pub start_angle: f64,
}

impl PieChartData {
    /// Percentage share of each slice.
    pub fn percentages(&self) -> Vec<f64> {
        let total: usize = self.slices.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return vec![0.0; self.slices.len()];
        }
        self.slices
            .iter()
            .map(|(_, n)| *n as f64 * 100.0 / total as f64)
            .collect()
    }
}

/// Point clouds, one per hue group.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<(String, Vec<(f64, f64)>)>,
}

/// Square matrix of values with shared row/column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapData {
    pub title: String,
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

/// Five-number summary of one box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub group: String,
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Every group in order; groups without values have no box.
    pub groups: Vec<String>,
    pub boxes: Vec<BoxStats>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bins: Vec<HistogramBin>,
    /// Density overlay scaled to bin counts.
    pub density: Vec<(f64, f64)>,
}

/// Data for one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar(BarChartData),
    Pie(PieChartData),
    Scatter(ScatterChartData),
    Heatmap(HeatmapData),
    BoxPlot(BoxPlotData),
    Histogram(HistogramData),
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            ChartData::Bar(d) => &d.title,
            ChartData::Pie(d) => &d.title,
            ChartData::Scatter(d) => &d.title,
            ChartData::Heatmap(d) => &d.title,
            ChartData::BoxPlot(d) => &d.title,
            ChartData::Histogram(d) => &d.title,
        }
    }
}

/// Builds chart data from the transformed table.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Build every chart in display order. The scatter plot is only
    /// included when the table has a Grade column.
    pub fn build_all(df: &DataFrame) -> PolarsResult<Vec<ChartData>> {
        let mut charts = vec![
            ChartData::Bar(Self::average_price_by_state(df)?),
            ChartData::Pie(Self::state_distribution(df)?),
        ];

        match Self::min_max_by_grade(df)? {
            Some(scatter) => charts.push(ChartData::Scatter(scatter)),
            None => info!("no Grade column, skipping scatter plot"),
        }

        charts.push(ChartData::Heatmap(Self::price_correlation(df)?));
        charts.push(ChartData::BoxPlot(Self::state_by_grade(df)?));
        charts.push(ChartData::Histogram(Self::profit_distribution(df)?));

        debug!(count = charts.len(), "built chart data");
        Ok(charts)
    }

    /// (a) Mean Average Price per State.
    pub fn average_price_by_state(df: &DataFrame) -> PolarsResult<BarChartData> {
        Ok(BarChartData {
            title: "Average Price by State".to_string(),
            x_label: STATE.to_string(),
            y_label: AVERAGE_PRICE.to_string(),
            bars: StatsCalculator::group_mean(df, STATE, AVERAGE_PRICE)?,
        })
    }

    /// (b) Share of rows per State.
    pub fn state_distribution(df: &DataFrame) -> PolarsResult<PieChartData> {
        Ok(PieChartData {
            title: "Distribution of Entries by State".to_string(),
            slices: StatsCalculator::value_counts(df, STATE)?,
            start_angle: 140.0,
        })
    }

    /// (c) Min vs Max Price coloured by Grade, `None` without a Grade column.
    pub fn min_max_by_grade(df: &DataFrame) -> PolarsResult<Option<ScatterChartData>> {
        if !DataLoader::has_column(df, GRADE) {
            return Ok(None);
        }

        let grades = StatsCalculator::text_values(df, GRADE)?;
        let mins = df.column(MIN_PRICE)?.cast(&DataType::Float64)?;
        let maxs = df.column(MAX_PRICE)?.cast(&DataType::Float64)?;

        let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
        for ((grade, lo), hi) in grades
            .into_iter()
            .zip(mins.f64()?.into_iter())
            .zip(maxs.f64()?.into_iter())
        {
            let (Some(grade), Some(lo), Some(hi)) = (grade, lo, hi) else {
                continue;
            };
            match series.iter_mut().find(|(g, _)| *g == grade) {
                Some((_, points)) => points.push((lo, hi)),
                None => series.push((grade, vec![(lo, hi)])),
            }
        }

        Ok(Some(ScatterChartData {
            title: "Min vs Max Price by Grade".to_string(),
            x_label: MIN_PRICE.to_string(),
            y_label: MAX_PRICE.to_string(),
            series,
        }))
    }

    /// (d) Correlation between the four price columns.
    pub fn price_correlation(df: &DataFrame) -> PolarsResult<HeatmapData> {
        Ok(HeatmapData {
            title: "Correlation Heatmap".to_string(),
            labels: PRICE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            matrix: StatsCalculator::correlation_matrix(df, &PRICE_COLUMNS)?,
        })
    }

    /// (e) State values grouped by Grade.
    ///
    /// State cells that are not numbers are dropped, so text-only groups
    /// keep their slot but get no box.
    pub fn state_by_grade(df: &DataFrame) -> PolarsResult<BoxPlotData> {
        let states = df.column(STATE)?.cast(&DataType::Float64)?;
        let states: Vec<Option<f64>> = states.f64()?.into_iter().collect();

        let grades: Vec<Option<String>> = if DataLoader::has_column(df, GRADE) {
            StatsCalculator::text_values(df, GRADE)?
        } else {
            vec![Some(ALL_GROUP.to_string()); df.height()]
        };

        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        for (grade, state) in grades.into_iter().zip(states) {
            let Some(grade) = grade else { continue };
            let slot = match groups.iter().position(|(g, _)| *g == grade) {
                Some(i) => i,
                None => {
                    groups.push((grade, Vec::new()));
                    groups.len() - 1
                }
            };
            if let Some(v) = state.filter(|v| !v.is_nan()) {
                groups[slot].1.push(v);
            }
        }

        let boxes = groups
            .iter()
            .filter_map(|(group, values)| Self::box_stats(group, values))
            .collect();

        Ok(BoxPlotData {
            title: "State Distribution by Grade".to_string(),
            x_label: GRADE.to_string(),
            y_label: STATE.to_string(),
            groups: groups.into_iter().map(|(g, _)| g).collect(),
            boxes,
        })
    }

    /// Quartiles with whiskers at the furthest values inside 1.5 IQR.
    pub fn box_stats(group: &str, values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = StatsCalculator::percentile(&sorted, 25.0);
        let median = StatsCalculator::percentile(&sorted, 50.0);
        let q3 = StatsCalculator::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxStats {
            group: group.to_string(),
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
            outliers,
        })
    }

    /// (f) Profit histogram with density overlay.
    pub fn profit_distribution(df: &DataFrame) -> PolarsResult<HistogramData> {
        let values = StatsCalculator::numeric_values(df, PROFIT)?;
        let bins = Self::histogram(&values, HISTOGRAM_BINS);

        let density = match (StatsCalculator::kde(&values, KDE_GRID_POINTS), bins.first()) {
            (Some(curve), Some(first)) => {
                debug!(bandwidth = curve.bandwidth, "profit density estimate");
                let scale = values.len() as f64 * (first.upper - first.lower);
                curve.points.iter().map(|&(x, d)| (x, d * scale)).collect()
            }
            _ => Vec::new(),
        };

        Ok(HistogramData {
            title: "Profit Distribution (Max - Min Price)".to_string(),
            x_label: PROFIT.to_string(),
            y_label: "Frequency".to_string(),
            bins,
            density,
        })
    }

    /// Equal-width buckets over the value range; the last bucket includes
    /// its upper edge.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }

        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: lo + width * i as f64,
                upper: lo + width * (i + 1) as f64,
                count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(with_grade: bool) -> DataFrame {
        let mut df = df!(
            "State" => ["Kerala", "Kerala", "Goa", "Punjab"],
            "Market" => ["Aluva", "Kochi", "Panaji", "Amritsar"],
            "Min Price" => [100.0, 200.0, 50.0, 80.0],
            "Max Price" => [200.0, 300.0, 150.0, 80.0],
            "Average Price" => [150.0, 250.0, 100.0, 80.0],
            "Profit" => [100.0, 100.0, 100.0, 0.0]
        )
        .unwrap();
        if with_grade {
            df.with_column(Series::new("Grade".into(), ["FAQ", "Local", "FAQ", "FAQ"]))
                .unwrap();
        }
        df
    }

    #[test]
    fn builds_six_charts_with_grade() {
        let charts = ChartPlotter::build_all(&table(true)).unwrap();
        assert_eq!(charts.len(), 6);
        assert!(matches!(charts[2], ChartData::Scatter(_)));
    }

    #[test]
    fn skips_scatter_without_grade() {
        let charts = ChartPlotter::build_all(&table(false)).unwrap();
        assert_eq!(charts.len(), 5);
        assert!(!charts.iter().any(|c| matches!(c, ChartData::Scatter(_))));
        assert!(ChartPlotter::min_max_by_grade(&table(false)).unwrap().is_none());

        let boxes = ChartPlotter::state_by_grade(&table(false)).unwrap();
        assert_eq!(boxes.groups, vec![ALL_GROUP.to_string()]);
    }

    #[test]
    fn bar_chart_averages_by_state() {
        let bar = ChartPlotter::average_price_by_state(&table(true)).unwrap();
        assert_eq!(
            bar.bars,
            vec![
                ("Goa".to_string(), 100.0),
                ("Kerala".to_string(), 200.0),
                ("Punjab".to_string(), 80.0),
            ]
        );
    }

    #[test]
    fn pie_shares_sum_to_hundred() {
        let pie = ChartPlotter::state_distribution(&table(true)).unwrap();
        assert_eq!(pie.slices[0], ("Kerala".to_string(), 2));
        let shares = pie.percentages();
        assert_eq!(shares[0], 50.0);
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn scatter_groups_points_by_grade() {
        let scatter = ChartPlotter::min_max_by_grade(&table(true)).unwrap().unwrap();
        assert_eq!(scatter.series.len(), 2);
        assert_eq!(scatter.series[0].0, "FAQ");
        assert_eq!(
            scatter.series[0].1,
            vec![(100.0, 200.0), (50.0, 150.0), (80.0, 80.0)]
        );
        assert_eq!(scatter.series[1].1, vec![(200.0, 300.0)]);
    }

    #[test]
    fn heatmap_covers_price_columns() {
        let heat = ChartPlotter::price_correlation(&table(true)).unwrap();
        assert_eq!(heat.labels, vec!["Min Price", "Max Price", "Average Price", "Profit"]);
        assert_eq!(heat.matrix.len(), 4);
        assert!((heat.matrix[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn text_states_give_empty_boxes() {
        let boxes = ChartPlotter::state_by_grade(&table(true)).unwrap();
        assert_eq!(boxes.groups, vec!["FAQ".to_string(), "Local".to_string()]);
        assert!(boxes.boxes.is_empty());
    }

    #[test]
    fn box_stats_whiskers_and_outliers() {
        let b = ChartPlotter::box_stats("g", &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 4.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert!(ChartPlotter::box_stats("g", &[]).is_none());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = ChartPlotter::histogram(&values, HISTOGRAM_BINS);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[19].upper, 100.0);
        // the maximum lands in the last bucket
        assert_eq!(bins[19].count, 6);
    }

    #[test]
    fn histogram_of_constant_values() {
        let bins = ChartPlotter::histogram(&[5.0, 5.0], 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].lower, 4.5);
    }

    #[test]
    fn profit_histogram_has_overlay() {
        let hist = ChartPlotter::profit_distribution(&table(true)).unwrap();
        assert_eq!(hist.bins.len(), HISTOGRAM_BINS);
        assert_eq!(hist.density.len(), 200);
        assert!(hist.density.iter().all(|(_, d)| *d >= 0.0));
    }
}
