//! Run settings.
//!
//! Defaults reproduce the fixed behaviour: read `eswar.csv` from the working
//! directory and show every chart in its own window. A JSON file named by
//! `AGRI_EDA_CONFIG` and individual environment variables can override them.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_ENV: &str = "AGRI_EDA_CONFIG";
pub const INPUT_ENV: &str = "AGRI_EDA_INPUT";
pub const DISPLAY_ENV: &str = "AGRI_EDA_DISPLAY";
pub const OUTPUT_DIR_ENV: &str = "AGRI_EDA_OUTPUT_DIR";
pub const LOG_ENV: &str = "AGRI_EDA_LOG";

/// Accepted range for `chart_width` and `chart_height`, in pixels.
pub const CHART_SIDE_RANGE: std::ops::RangeInclusive<u32> = 100..=4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Unknown display mode '{0}' (expected window, png or headless)")]
    DisplayMode(String),
    #[error("Chart size {width}x{height} is outside {min}..={max} pixels")]
    ChartSize {
        width: u32,
        height: u32,
        min: u32,
        max: u32,
    },
}

/// Where rendered charts go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One blocking native window per chart.
    #[default]
    Window,
    /// One PNG file per chart in the output directory.
    Png,
    /// Render only.
    Headless,
}

impl FromStr for DisplayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "window" => Ok(DisplayMode::Window),
            "png" => Ok(DisplayMode::Png),
            "headless" | "none" => Ok(DisplayMode::Headless),
            other => Err(ConfigError::DisplayMode(other.to_string())),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Window => "window",
            DisplayMode::Png => "png",
            DisplayMode::Headless => "headless",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_path: PathBuf,
    pub display: DisplayMode,
    pub output_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("eswar.csv"),
            display: DisplayMode::Window,
            output_dir: PathBuf::from("charts"),
            chart_width: 1200,
            chart_height: 700,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the config file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an injectable variable lookup.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_overrides(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reject chart sizes the renderer cannot allocate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if CHART_SIDE_RANGE.contains(&self.chart_width)
            && CHART_SIDE_RANGE.contains(&self.chart_height)
        {
            return Ok(());
        }
        Err(ConfigError::ChartSize {
            width: self.chart_width,
            height: self.chart_height,
            min: *CHART_SIDE_RANGE.start(),
            max: *CHART_SIDE_RANGE.end(),
        })
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(input) = lookup(INPUT_ENV) {
            self.input_path = PathBuf::from(input);
        }
        if let Some(display) = lookup(DISPLAY_ENV) {
            self.display = display.parse()?;
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_ENV) {
            self.log_level = level;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::load_with(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.input_path, PathBuf::from("eswar.csv"));
        assert_eq!(settings.display, DisplayMode::Window);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load_with(lookup(&[
            (INPUT_ENV, "data/prices.csv"),
            (DISPLAY_ENV, "PNG"),
            (OUTPUT_DIR_ENV, "out"),
            (LOG_ENV, "debug"),
        ]))
        .unwrap();
        assert_eq!(settings.input_path, PathBuf::from("data/prices.csv"));
        assert_eq!(settings.display, DisplayMode::Png);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn bad_display_mode_is_rejected() {
        let err = Settings::load_with(lookup(&[(DISPLAY_ENV, "hologram")])).unwrap_err();
        assert!(matches!(err, ConfigError::DisplayMode(m) if m == "hologram"));
    }

    #[test]
    fn file_then_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"input_path": "from_file.csv", "display": "headless", "chart_width": 800}}"#
        )
        .unwrap();
        let path = file.path().display().to_string();

        let settings =
            Settings::load_with(lookup(&[(CONFIG_ENV, path.as_str()), (INPUT_ENV, "from_env.csv")]))
                .unwrap();
        assert_eq!(settings.input_path, PathBuf::from("from_env.csv"));
        assert_eq!(settings.display, DisplayMode::Headless);
        assert_eq!(settings.chart_width, 800);
        assert_eq!(settings.chart_height, 700);
    }

    #[test]
    fn chart_size_must_be_drawable() {
        for body in [
            r#"{"chart_width": 40000, "chart_height": 40000}"#,
            r#"{"chart_width": 0}"#,
            r#"{"chart_height": 50}"#,
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{}", body).unwrap();
            let path = file.path().display().to_string();

            let err = Settings::load_with(lookup(&[(CONFIG_ENV, path.as_str())])).unwrap_err();
            assert!(matches!(err, ConfigError::ChartSize { .. }), "{body} accepted");
        }
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn unreadable_config_file() {
        let err = Settings::load_with(lookup(&[(CONFIG_ENV, "/no/such/settings.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn display_mode_round_trips_through_text() {
        for mode in [DisplayMode::Window, DisplayMode::Png, DisplayMode::Headless] {
            assert_eq!(mode.to_string().parse::<DisplayMode>().unwrap(), mode);
        }
    }
}
