//! Chart Display
//! Sends rendered charts to a window, a PNG file, or nowhere.

use crate::charts::RenderedChart;
use crate::config::DisplayMode;
use crate::gui::ChartWindow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Chart window failed: {0}")]
    Window(String),
    #[error("Failed to write {path}: {message}")]
    Png { path: String, message: String },
    #[error("Chart buffer for '{0}' does not match its size")]
    Buffer(String),
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },
}

/// Delivers charts according to the configured display mode.
pub struct ChartDisplay {
    mode: DisplayMode,
    output_dir: PathBuf,
    shown: usize,
}

impl ChartDisplay {
    pub fn new(mode: DisplayMode, output_dir: &Path) -> Self {
        Self {
            mode,
            output_dir: output_dir.to_path_buf(),
            shown: 0,
        }
    }

    /// Number of charts delivered so far.
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Deliver one chart. In window mode this blocks until the window closes.
    pub fn show(&mut self, chart: &RenderedChart) -> Result<Option<PathBuf>, DisplayError> {
        self.shown += 1;
        match self.mode {
            DisplayMode::Window => {
                info!(title = %chart.title, "showing chart, close the window to continue");
                ChartWindow::show_blocking(chart)
                    .map_err(|e| DisplayError::Window(e.to_string()))?;
                Ok(None)
            }
            DisplayMode::Png => {
                let path = self.write_png(chart)?;
                info!(title = %chart.title, path = %path.display(), "saved chart");
                Ok(Some(path))
            }
            DisplayMode::Headless => {
                info!(title = %chart.title, "rendered chart (headless)");
                Ok(None)
            }
        }
    }

    fn write_png(&self, chart: &RenderedChart) -> Result<PathBuf, DisplayError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| DisplayError::OutputDir {
            path: self.output_dir.display().to_string(),
            source,
        })?;

        let path = self
            .output_dir
            .join(format!("{:02}_{}.png", self.shown, file_stem(&chart.title)));

        let image = image::RgbImage::from_raw(chart.width, chart.height, chart.rgb.clone())
            .ok_or_else(|| DisplayError::Buffer(chart.title.clone()))?;
        image.save(&path).map_err(|e| DisplayError::Png {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(path)
    }
}

/// Lowercase file-name-safe version of a chart title.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    stem.split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
