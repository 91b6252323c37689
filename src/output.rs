//! Output of chart data outside the terminal view.
//!
//! Supports JSON dumps of a raw series and CSV append of chart statistics.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::stats::ChartStats;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// A full series as printed by the `raw` command.
#[derive(Debug, Serialize)]
pub struct RawSeries<'a> {
    pub location: String,
    pub dates: &'a [String],
    pub values: &'a [i64],
}

/// Serializes a raw series as pretty-printed JSON.
pub fn series_json(series: &RawSeries<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(series)?)
}

/// One exported CSV row.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    timestamp: DateTime<Utc>,
    location: &'a str,
    forecast_days: usize,
    last_date: Option<&'a str>,
    points: usize,
    max: f64,
    up: f64,
    delta_pct: f64,
}

impl<'a> ExportRecord<'a> {
    fn new(timestamp: DateTime<Utc>, stats: &'a ChartStats) -> Self {
        Self {
            timestamp,
            location: &stats.location,
            forecast_days: stats.forecast_days,
            last_date: stats.last_date.as_deref(),
            points: stats.points,
            max: stats.max,
            up: stats.up,
            delta_pct: stats.delta_pct,
        }
    }
}

/// Appends one row per chart to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &Path, stats: &[ChartStats]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = stats.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let now = Utc::now();
    for s in stats {
        writer.serialize(ExportRecord::new(now, s))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample() -> ChartStats {
        ChartStats::from_visible("US", &[100.0, 150.0]).with_last_date(Some("1/23/20"))
    }

    #[test]
    fn test_series_json() {
        let dates = vec!["1/22/20".to_string(), "1/23/20".to_string()];
        let json = series_json(&RawSeries {
            location: "Worldwide".into(),
            dates: &dates,
            values: &[105, 160],
        })
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["location"], "Worldwide");
        assert_eq!(parsed["values"][1], 160);
        assert_eq!(parsed["dates"][0], "1/22/20");
    }

    #[test]
    fn test_append_records_creates_file() {
        let path = temp_path("covid_sparklines_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_records(&path, &[sample()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("1/23/20"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("covid_sparklines_test_header.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &[sample()]).unwrap();
        append_records(&path, &[sample(), sample()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 3 data rows
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }
}
