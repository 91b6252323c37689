//! Builds the grid of charts shown for one refresh.

use tracing::warn;

use crate::forecast::estimate_future;
use crate::locations::{LocationKey, LocationTable};
use crate::settings::{DataSource, Settings};
use crate::stats::ChartStats;
use crate::window::visible;

/// One chart of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub stats: ChartStats,
    /// Visible points, forecast points last.
    pub values: Vec<f64>,
    /// Fixed maximum for the vertical axis; `None` scales to `values`.
    pub scale_max: Option<f64>,
}

impl Chart {
    /// Number of trailing points that are forecasts.
    pub fn forecast_points(&self) -> usize {
        self.stats.forecast_days.min(self.values.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub heading: &'static str,
    /// First and last date label of the visible window.
    pub date_range: Option<(String, String)>,
    pub last_datapoint: Option<String>,
    pub charts: Vec<Chart>,
    /// Chosen locations that did not fit into the grid.
    pub hidden: Vec<String>,
    /// Chosen locations that are not in the data.
    pub missing: Vec<String>,
    pub rewind: usize,
    pub max_rewind: usize,
}

impl Dashboard {
    /// Lays out the chosen locations, then forecast charts in the slots left over.
    ///
    /// `source` is the series `table` was downloaded from and names the heading.
    pub fn build(
        table: &LocationTable,
        source: DataSource,
        settings: &Settings,
        rewind: usize,
    ) -> Self {
        let capacity = settings.capacity();
        let days = settings.display_days;
        let header = table.header();
        let scale_max = if settings.autoscale {
            None
        } else {
            settings.graph_max
        };

        let mut charts = Vec::new();
        let mut hidden = Vec::new();
        let mut missing = Vec::new();
        let mut shown: Vec<(&str, &[i64])> = Vec::new();

        for name in &settings.locations {
            let Some(series) = table.series(&LocationKey::from_choice(name)) else {
                warn!(location = %name, "Chosen location is not in the data");
                missing.push(name.clone());
                continue;
            };
            if charts.len() >= capacity {
                hidden.push(name.clone());
                continue;
            }

            let values: Vec<f64> = visible(series, rewind, days)
                .iter()
                .map(|v| *v as f64)
                .collect();
            let last_date = visible(header, rewind, days).last().map(String::as_str);
            charts.push(Chart {
                stats: ChartStats::from_visible(name, &values).with_last_date(last_date),
                values,
                scale_max,
            });
            shown.push((name.as_str(), series));
        }

        if !hidden.is_empty() {
            warn!(
                capacity,
                hidden = hidden.len(),
                "More locations chosen than the grid can show"
            );
        }

        if settings.forecasting && settings.forecast_days > 0 {
            let free = capacity.saturating_sub(charts.len());
            for (name, series) in shown.into_iter().take(free) {
                let observed: Vec<f64> = series.iter().map(|v| *v as f64).collect();
                let forecast =
                    match estimate_future(&observed, settings.forecast_days, settings.growth_rate) {
                        Ok(forecast) => forecast,
                        Err(e) => {
                            warn!(location = name, error = %e, "Skipping forecast chart");
                            continue;
                        }
                    };
                let values = visible(&forecast, 0, days).to_vec();
                charts.push(Chart {
                    stats: ChartStats::from_visible(name, &values)
                        .with_forecast(settings.forecast_days)
                        .with_last_date(header.last().map(String::as_str)),
                    values,
                    scale_max,
                });
            }
        }

        let window = visible(header, rewind, days);
        let date_range = match (window.first(), window.last()) {
            (Some(first), Some(last)) => Some((first.clone(), last.clone())),
            _ => None,
        };

        Dashboard {
            heading: source.heading(),
            date_range,
            last_datapoint: header.last().cloned(),
            charts,
            hidden,
            missing,
            rewind,
            max_rewind: table.days().saturating_sub(1),
        }
    }
}
