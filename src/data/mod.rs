//! Data module - CSV loading, cleaning and transformation

mod cleaner;
mod loader;
mod transformer;

pub use cleaner::{CleanerError, CleaningReport, DataCleaner};
pub use loader::DataLoader;
pub(crate) use loader::is_numeric;
pub use transformer::{DataTransformer, TransformReport};

/// Source column holding the arrival date.
pub const ARRIVAL_DATE: &str = "Arrival_Date";
/// Source column holding the minimum price.
pub const SOURCE_MIN_PRICE: &str = "Min_x0020_Price";
/// Source column holding the maximum price.
pub const SOURCE_MAX_PRICE: &str = "Max_x0020_Price";

pub const DATE_RECORDED: &str = "Date Recorded";
pub const MIN_PRICE: &str = "Min Price";
pub const MAX_PRICE: &str = "Max Price";
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const AVERAGE_PRICE: &str = "Average Price";
pub const PROFIT: &str = "Profit";

pub const MARKET: &str = "Market";
pub const STATE: &str = "State";
pub const GRADE: &str = "Grade";

/// Columns the correlation heatmap is computed over.
pub const PRICE_COLUMNS: [&str; 4] = [MIN_PRICE, MAX_PRICE, AVERAGE_PRICE, PROFIT];
