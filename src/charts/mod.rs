//! Charts module - Chart data preparation and rendering

mod plotter;
mod renderer;

pub use plotter::{ChartData, ChartPlotter};
pub use renderer::{RenderedChart, StaticChartRenderer};
