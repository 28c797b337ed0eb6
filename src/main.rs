//! Agricultural Price EDA
//!
//! Loads a CSV of market price records, cleans and enriches it, prints a
//! console summary and shows one chart at a time.

mod charts;
mod config;
mod data;
mod gui;
mod report;
mod stats;

use anyhow::{Context, Result};
use charts::{ChartPlotter, StaticChartRenderer};
use config::Settings;
use data::{DataCleaner, DataLoader, DataTransformer};
use gui::ChartDisplay;
use report::Reporter;
use tracing::info;

/// Log lines go to stderr; `RUST_LOG` overrides the configured level.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_logging(&settings.log_level);
    info!(input = %settings.input_path.display(), display = %settings.display, "starting");

    let mut df = DataLoader::load_csv(&settings.input_path)
        .with_context(|| format!("Failed to load {}", settings.input_path.display()))?;

    let cleaning = DataCleaner::clean(&mut df).context("Cleaning failed")?;
    let transform = DataTransformer::transform(&mut df).context("Transformation failed")?;

    let stdout = std::io::stdout();
    let mut reporter = Reporter::new(stdout.lock());
    reporter
        .write_all(&df, &cleaning, &transform)
        .context("Failed to print report")?;
    drop(reporter);

    let charts = ChartPlotter::build_all(&df).context("Failed to prepare chart data")?;
    let renderer = StaticChartRenderer::new(settings.chart_width, settings.chart_height);
    let mut chart_display = ChartDisplay::new(settings.display, &settings.output_dir);

    for chart in &charts {
        let rendered = renderer
            .render(chart)
            .with_context(|| format!("Failed to render '{}'", chart.title()))?;
        chart_display
            .show(&rendered)
            .with_context(|| format!("Failed to display '{}'", chart.title()))?;
    }

    let shown = chart_display.shown();
    info!(charts = shown, "done");
    Ok(())
}
