//! Operator settings persisted as a flat JSON object.
//!
//! The file is created with defaults when it is missing or unreadable. Values
//! typed at the prompt are validated per key; a value that does not parse
//! falls back to that key's default instead of being rejected.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CommandError;
use crate::forecast::{DEFAULT_GROWTH_RATE, MAX_FORECASTED_DAYS};

pub const DEFAULT_ROWS: usize = 2;
pub const DEFAULT_COLS: usize = 4;
pub const DEFAULT_GRAPH_SIZE: (u32, u32) = (300, 150);
pub const DEFAULT_DISPLAY_DAYS: usize = 30;
pub const DEFAULT_THEME: &str = "Material 1";
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "Worldwide",
    "US",
    "China",
    "Italy",
    "Iran",
    "France",
    "Spain",
    "United Kingdom",
];

pub const CONFIRMED_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";
pub const DEATHS_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv";

/// Which published series is charted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Confirmed,
    Deaths,
}

impl DataSource {
    pub fn url(self) -> &'static str {
        match self {
            DataSource::Confirmed => CONFIRMED_URL,
            DataSource::Deaths => DEATHS_URL,
        }
    }

    /// Heading shown above the chart grid.
    pub fn heading(self) -> &'static str {
        match self {
            DataSource::Confirmed => "COVID-19 Cases By Region",
            DataSource::Deaths => "COVID-19 Deaths By Region",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Confirmed => f.write_str("confirmed"),
            DataSource::Deaths => f.write_str("deaths"),
        }
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(DataSource::Confirmed),
            "deaths" => Ok(DataSource::Deaths),
            other => Err(format!("unknown data source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rows: usize,
    pub cols: usize,
    pub theme: String,
    pub forecasting: bool,
    pub graph_x_size: u32,
    pub graph_y_size: u32,
    #[serde(rename = "display days")]
    pub display_days: usize,
    #[serde(rename = "data source")]
    pub data_source: DataSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    pub autoscale: bool,
    /// Fixed chart maximum used when `autoscale` is off.
    #[serde(rename = "graphmax", skip_serializing_if = "Option::is_none")]
    pub graph_max: Option<f64>,
    #[serde(rename = "forecast days")]
    pub forecast_days: usize,
    #[serde(rename = "growth rate")]
    pub growth_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            theme: "Dark Blue 17".to_string(),
            forecasting: false,
            graph_x_size: DEFAULT_GRAPH_SIZE.0,
            graph_y_size: DEFAULT_GRAPH_SIZE.1,
            display_days: DEFAULT_DISPLAY_DAYS,
            data_source: DataSource::Confirmed,
            locations: Vec::new(),
            autoscale: true,
            graph_max: None,
            forecast_days: 1,
            growth_rate: DEFAULT_GROWTH_RATE,
        }
    }
}

/// What changed after [`Settings::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    /// Only presentation changed.
    View,
    /// The charted series changed; data must be downloaded again.
    DataSource,
}

impl Settings {
    /// Reads the settings file, replacing it with defaults when it is missing
    /// or malformed.
    ///
    /// # Errors
    ///
    /// Only fails when the regenerated defaults cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(settings) => {
                debug!(path = %path.display(), "Settings loaded");
                Ok(settings)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No usable settings file, creating one with defaults");
                let settings = Settings::default();
                settings.save(path)?;
                Ok(settings)
            }
        }
    }

    /// Reads the settings file and brings out-of-range values back into range.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("malformed settings in '{}'", path.display()))?;
        Ok(settings.normalize())
    }

    /// Applies the same limits to file values that [`Settings::apply`] applies
    /// to typed ones.
    pub fn normalize(mut self) -> Self {
        if self.forecast_days > MAX_FORECASTED_DAYS {
            warn!(
                forecast_days = self.forecast_days,
                max = MAX_FORECASTED_DAYS,
                "Forecast days out of range, capping"
            );
            self.forecast_days = MAX_FORECASTED_DAYS;
        }
        if self.rows == 0 {
            self.rows = DEFAULT_ROWS;
        }
        if self.cols == 0 {
            self.cols = DEFAULT_COLS;
        }
        if self.graph_x_size == 0 {
            self.graph_x_size = DEFAULT_GRAPH_SIZE.0;
        }
        if self.graph_y_size == 0 {
            self.graph_y_size = DEFAULT_GRAPH_SIZE.1;
        }
        self.graph_max = self.graph_max.filter(|v| *v > 0.0);
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings to '{}'", path.display()))?;
        Ok(())
    }

    /// Number of chart slots in the grid.
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Sets one key from operator input.
    ///
    /// Keys accept the names used in the settings file; spaces and
    /// underscores are interchangeable. Values that do not parse are replaced
    /// by the key's default.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<SettingChange, CommandError> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', " ");
        let value = value.trim();

        match normalized.as_str() {
            "rows" => self.rows = positive_or(value, DEFAULT_ROWS),
            "cols" => self.cols = positive_or(value, DEFAULT_COLS),
            "theme" => {
                self.theme = if value.is_empty() {
                    DEFAULT_THEME.to_string()
                } else {
                    value.to_string()
                }
            }
            "graph x size" => self.graph_x_size = positive_or(value, DEFAULT_GRAPH_SIZE.0),
            "graph y size" => self.graph_y_size = positive_or(value, DEFAULT_GRAPH_SIZE.1),
            "display days" => self.display_days = parse_or(value, 0),
            "autoscale" => self.autoscale = parse_flag(value).unwrap_or(true),
            "graphmax" | "graph max" => {
                self.graph_max = value.parse().ok().filter(|v: &f64| *v > 0.0)
            }
            "forecasting" => self.forecasting = parse_flag(value).unwrap_or(false),
            "forecast days" => self.set_forecast_days(value),
            "growth rate" => self.set_growth_rate(value),
            "data source" | "source" => {
                let source = if value.eq_ignore_ascii_case("deaths") {
                    DataSource::Deaths
                } else {
                    DataSource::Confirmed
                };
                let changed = source != self.data_source;
                self.data_source = source;
                return Ok(if changed {
                    SettingChange::DataSource
                } else {
                    SettingChange::View
                });
            }
            _ => return Err(CommandError::UnknownSetting(key.trim().to_string())),
        }

        Ok(SettingChange::View)
    }

    /// Sets the forecast horizon and, when given, the growth rate. Forecasting
    /// is switched on for a positive horizon and off for zero.
    pub fn set_forecast(&mut self, days: &str, rate: Option<&str>) {
        self.set_forecast_days(days);
        if let Some(rate) = rate {
            self.set_growth_rate(rate);
        }
        self.forecasting = self.forecast_days > 0;
    }

    fn set_forecast_days(&mut self, value: &str) {
        self.forecast_days = parse_or(value.trim(), 1).min(MAX_FORECASTED_DAYS);
    }

    fn set_growth_rate(&mut self, value: &str) {
        self.growth_rate = parse_or(value.trim(), 1.0);
    }
}

fn parse_or<T: FromStr>(value: &str, fallback: T) -> T {
    value.parse().unwrap_or_else(|_| {
        debug!(value, "Invalid setting value, using fallback");
        fallback
    })
}

fn positive_or<T: FromStr + PartialOrd + Default + Copy>(value: &str, fallback: T) -> T {
    let parsed = parse_or(value, fallback);
    if parsed > T::default() { parsed } else { fallback }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
