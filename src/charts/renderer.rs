//! Static Chart Renderer
//! Draws chart data into an in-memory RGB bitmap with plotters.
//!
//! Every chart shares the same frame: white background, title on top,
//! axis labels where the chart has axes. Group colours follow `PALETTE`.

use crate::charts::plotter::{
    BarChartData, BoxPlotData, HeatmapData, HistogramData, PieChartData, ScatterChartData,
};
use crate::charts::ChartData;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use thiserror::Error;
use tracing::debug;

type DrawResult = Result<(), Box<dyn Error>>;

const FONT: &str = "sans-serif";

/// Group colours.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

const BAR_COLOR: RGBColor = RGBColor(91, 155, 213);
const HIST_COLOR: RGBColor = RGBColor(46, 139, 87);
const COOL: RGBColor = RGBColor(59, 76, 192);
const NEUTRAL: RGBColor = RGBColor(221, 221, 221);
const WARM: RGBColor = RGBColor(180, 4, 38);

/// Largest canvas side, in pixels, the renderer accepts.
pub const MAX_CANVAS_SIDE: u32 = 8192;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart '{title}' failed to draw: {message}")]
    Draw { title: String, message: String },
    #[error("Chart '{title}' has unusable canvas size {width}x{height}")]
    CanvasSize {
        title: String,
        width: u32,
        height: u32,
    },
}

/// A chart drawn into an RGB buffer, three bytes per pixel, row-major.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Renders chart data into bitmaps.
pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Draw one chart.
    pub fn render(&self, chart: &ChartData) -> Result<RenderedChart, RenderError> {
        let (width, height) = match chart {
            // Square canvas so the pie stays round.
            ChartData::Pie(_) => (self.height, self.height),
            ChartData::Heatmap(_) => ((self.height as f64 * 1.2) as u32, self.height),
            _ => (self.width, self.height),
        };

        let len = Self::buffer_len(width, height).ok_or_else(|| RenderError::CanvasSize {
            title: chart.title().to_string(),
            width,
            height,
        })?;
        let mut rgb = vec![255u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            let drawn = match chart {
                ChartData::Bar(data) => Self::draw_bar(&root, data),
                ChartData::Pie(data) => Self::draw_pie(&root, data),
                ChartData::Scatter(data) => Self::draw_scatter(&root, data),
                ChartData::Heatmap(data) => Self::draw_heatmap(&root, data),
                ChartData::BoxPlot(data) => Self::draw_boxplot(&root, data),
                ChartData::Histogram(data) => Self::draw_histogram(&root, data),
            };
            drawn
                .and_then(|_| root.present().map_err(|e| e.into()))
                .map_err(|e| RenderError::Draw {
                    title: chart.title().to_string(),
                    message: e.to_string(),
                })?;
        }

        debug!(title = chart.title(), width, height, "rendered chart");
        Ok(RenderedChart {
            title: chart.title().to_string(),
            width,
            height,
            rgb,
        })
    }

    fn draw_bar<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &BarChartData) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = data.bars.len().max(1);
        let y_max = Self::padded_max(data.bars.iter().map(|(_, v)| *v));

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(110)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_max)?;

        let names: Vec<String> = data.bars.iter().map(|(name, _)| name.clone()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90))
            .x_label_formatter(&|x| Self::category_label(&names, *x))
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .draw()?;

        chart.draw_series(data.bars.iter().enumerate().map(|(i, (_, v))| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], BAR_COLOR.filled())
        }))?;

        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &PieChartData) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let area = root.titled(&data.title, (FONT, 24))?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = (w.min(h) as f64) * 0.33;

        let shares = data.percentages();
        let mut angle = data.start_angle.to_radians();

        for (i, ((label, _), share)) in data.slices.iter().zip(shares.iter()).enumerate() {
            let sweep = share / 100.0 * std::f64::consts::TAU;
            let color = PALETTE[i % PALETTE.len()];

            // Screen y grows downwards, so angles are negated.
            let steps = ((sweep.to_degrees()).ceil() as usize).max(2);
            let mut points = vec![center];
            for s in 0..=steps {
                let a = angle + sweep * s as f64 / steps as f64;
                points.push((
                    center.0 + (radius * a.cos()) as i32,
                    center.1 - (radius * a.sin()) as i32,
                ));
            }
            area.draw(&Polygon::new(points, color.filled()))?;

            let mid = angle + sweep / 2.0;
            let pct_pos = (
                center.0 + (radius * 0.6 * mid.cos()) as i32,
                center.1 - (radius * 0.6 * mid.sin()) as i32,
            );
            let label_pos = (
                center.0 + (radius * 1.12 * mid.cos()) as i32,
                center.1 - (radius * 1.12 * mid.sin()) as i32,
            );
            let anchor = if mid.cos() >= 0.0 {
                HPos::Left
            } else {
                HPos::Right
            };

            area.draw(&Text::new(
                format!("{:.1}%", share),
                pct_pos,
                (FONT, 13)
                    .into_font()
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))?;
            area.draw(&Text::new(
                label.clone(),
                label_pos,
                TextStyle::from((FONT, 14).into_font()).pos(Pos::new(anchor, VPos::Center)),
            ))?;

            angle += sweep;
        }

        Ok(())
    }

    fn draw_scatter<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &ScatterChartData,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let all = data.series.iter().flat_map(|(_, pts)| pts.iter());
        let (x_range, y_range) = Self::bounds(all);

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .draw()?;

        for (i, (grade, points)) in data.series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(
                    points
                        .iter()
                        .map(move |&(x, y)| Circle::new((x, y), 3, color.mix(0.8).filled())),
                )?
                .label(grade.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    }

    fn draw_heatmap<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &HeatmapData,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let k = data.labels.len().max(1);
        let span = -0.5..(k as f64 - 0.5);
        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(110)
            .build_cartesian_2d(span.clone(), span)?;

        // Rows are drawn top-down.
        let labels = &data.labels;
        let rows: Vec<String> = labels.iter().rev().cloned().collect();
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(k + 1)
            .y_labels(k + 1)
            .x_label_formatter(&|x| Self::category_label(labels, *x))
            .y_label_formatter(&|y| Self::category_label(&rows, *y))
            .draw()?;

        for (row, values) in data.matrix.iter().enumerate() {
            let y = (k - 1 - row) as f64;
            for (col, &r) in values.iter().enumerate() {
                let x = col as f64;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    Self::coolwarm(r).filled(),
                )))?;

                let text = if r.is_nan() {
                    "NaN".to_string()
                } else {
                    format!("{:.2}", r)
                };
                chart.draw_series(std::iter::once(Text::new(
                    text,
                    (x, y),
                    TextStyle::from((FONT, 16).into_font())
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                )))?;
            }
        }

        Ok(())
    }

    fn draw_boxplot<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &BoxPlotData,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = data.groups.len().max(1);
        let values = data.boxes.iter().flat_map(|b| {
            [b.whisker_low, b.whisker_high]
                .into_iter()
                .chain(b.outliers.iter().copied())
        });
        let (lo, hi) = Self::value_range(values);

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(80)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), lo..hi)?;

        let groups = &data.groups;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&|x| Self::category_label(groups, *x))
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .draw()?;

        for (i, group) in data.groups.iter().enumerate() {
            let Some(b) = data.boxes.iter().find(|b| &b.group == group) else {
                continue;
            };
            let x = i as f64;
            let color = PALETTE[i % PALETTE.len()];

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, b.q1), (x + 0.3, b.q3)],
                color.mix(0.35).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, b.q1), (x + 0.3, b.q3)],
                color.stroke_width(2),
            )))?;
            chart.draw_series(
                [
                    vec![(x - 0.3, b.median), (x + 0.3, b.median)],
                    vec![(x, b.q3), (x, b.whisker_high)],
                    vec![(x, b.q1), (x, b.whisker_low)],
                    vec![(x - 0.15, b.whisker_high), (x + 0.15, b.whisker_high)],
                    vec![(x - 0.15, b.whisker_low), (x + 0.15, b.whisker_low)],
                ]
                .into_iter()
                .map(|line| PathElement::new(line, BLACK.stroke_width(2))),
            )?;
            chart.draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
            )?;
        }

        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &HistogramData,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let x_lo = data.bins.first().map(|b| b.lower).unwrap_or(0.0);
        let x_hi = data.bins.last().map(|b| b.upper).unwrap_or(1.0);
        let y_max = Self::padded_max(
            data.bins
                .iter()
                .map(|b| b.count as f64)
                .chain(data.density.iter().map(|(_, d)| *d)),
        );

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .draw()?;

        chart.draw_series(data.bins.iter().map(|b| {
            Rectangle::new(
                [(b.lower, 0.0), (b.upper, b.count as f64)],
                HIST_COLOR.mix(0.6).filled(),
            )
        }))?;
        chart.draw_series(data.bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], WHITE.stroke_width(1))
        }))?;

        if !data.density.is_empty() {
            chart.draw_series(LineSeries::new(
                data.density.iter().copied(),
                HIST_COLOR.stroke_width(2),
            ))?;
        }

        Ok(())
    }

    /// RGB byte count for a canvas, `None` when a side is zero or too large.
    fn buffer_len(width: u32, height: u32) -> Option<usize> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return None;
        }
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)
    }

    /// Name of the category whose slot sits at `x`, empty between slots.
    fn category_label(names: &[String], x: f64) -> String {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 {
            names.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Upper axis bound with headroom; at least 1.
    fn padded_max(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    /// Padded `(min, max)` of finite values, `(0, 1)` when empty.
    fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_infinite() {
            return (0.0, 1.0);
        }
        let pad = if max > min { (max - min) * 0.1 } else { 1.0 };
        (min - pad, max + pad)
    }

    fn bounds<'a>(
        points: impl Iterator<Item = &'a (f64, f64)> + Clone,
    ) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let (x_lo, x_hi) = Self::value_range(points.clone().map(|p| p.0));
        let (y_lo, y_hi) = Self::value_range(points.map(|p| p.1));
        (x_lo..x_hi, y_lo..y_hi)
    }

    /// Blue → grey → red for correlations in [-1, 1]. NaN is grey.
    fn coolwarm(r: f64) -> RGBColor {
        if r.is_nan() {
            return NEUTRAL;
        }
        let t = r.clamp(-1.0, 1.0);
        let (from, to, f) = if t < 0.0 {
            (COOL, NEUTRAL, t + 1.0)
        } else {
            (NEUTRAL, WARM, t)
        };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_chart() -> ChartData {
        ChartData::Bar(BarChartData {
            title: "Average Price by State".to_string(),
            x_label: "State".to_string(),
            y_label: "Average Price".to_string(),
            bars: vec![("Goa".to_string(), 100.0)],
        })
    }

    #[test]
    fn buffer_len_rejects_degenerate_canvases() {
        assert_eq!(StaticChartRenderer::buffer_len(4, 2), Some(24));
        assert_eq!(StaticChartRenderer::buffer_len(0, 700), None);
        assert_eq!(StaticChartRenderer::buffer_len(1200, 0), None);
        assert_eq!(StaticChartRenderer::buffer_len(40_000, 40_000), None);
        assert_eq!(
            StaticChartRenderer::buffer_len(MAX_CANVAS_SIDE, MAX_CANVAS_SIDE),
            Some(MAX_CANVAS_SIDE as usize * MAX_CANVAS_SIDE as usize * 3)
        );
    }

    #[test]
    fn oversized_canvas_is_an_error() {
        let err = StaticChartRenderer::new(40_000, 40_000)
            .render(&bar_chart())
            .unwrap_err();
        assert!(matches!(err, RenderError::CanvasSize { width: 40_000, .. }));

        let err = StaticChartRenderer::new(0, 0).render(&bar_chart()).unwrap_err();
        assert!(matches!(err, RenderError::CanvasSize { height: 0, .. }));
    }

    #[test]
    fn coolwarm_endpoints() {
        assert_eq!(StaticChartRenderer::coolwarm(-1.0), COOL);
        assert_eq!(StaticChartRenderer::coolwarm(0.0), NEUTRAL);
        assert_eq!(StaticChartRenderer::coolwarm(1.0), WARM);
        assert_eq!(StaticChartRenderer::coolwarm(f64::NAN), NEUTRAL);
        assert_eq!(StaticChartRenderer::coolwarm(7.0), WARM);
    }

    #[test]
    fn value_range_pads_and_defaults() {
        assert_eq!(
            StaticChartRenderer::value_range([0.0, 10.0].into_iter()),
            (-1.0, 11.0)
        );
        assert_eq!(
            StaticChartRenderer::value_range([5.0].into_iter()),
            (4.0, 6.0)
        );
        assert_eq!(
            StaticChartRenderer::value_range(std::iter::empty()),
            (0.0, 1.0)
        );
    }

    #[test]
    fn category_labels_sit_on_integer_slots() {
        let names = vec!["Goa".to_string(), "Kerala".to_string()];
        assert_eq!(StaticChartRenderer::category_label(&names, 0.0), "Goa");
        assert_eq!(StaticChartRenderer::category_label(&names, 1.0), "Kerala");
        assert_eq!(StaticChartRenderer::category_label(&names, 0.5), "");
        assert_eq!(StaticChartRenderer::category_label(&names, 2.0), "");
        assert_eq!(StaticChartRenderer::category_label(&names, -1.0), "");
    }

    #[test]
    fn padded_max_has_floor() {
        assert!((StaticChartRenderer::padded_max([10.0].into_iter()) - 11.0).abs() < 1e-9);
        assert_eq!(StaticChartRenderer::padded_max(std::iter::empty()), 1.0);
    }
}
