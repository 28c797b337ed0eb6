//! GUI module - Chart windows and other chart outputs

mod chart_window;
mod display;

pub use chart_window::ChartWindow;
pub use display::ChartDisplay;
