use serde::Serialize;

/// Summary line shown above one chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartStats {
    pub location: String,
    /// Forecast points included at the end of the chart; 0 for observed data.
    pub forecast_days: usize,
    /// Date label of the last observed point on the chart.
    pub last_date: Option<String>,
    pub points: usize,
    pub max: f64,
    /// Change between the last two visible points.
    pub up: f64,
    /// `up` as a percentage of the second-to-last visible point.
    pub delta_pct: f64,
}

impl ChartStats {
    /// Computes the statistics over the visible points of a chart.
    ///
    /// `up` and `delta_pct` are zero when fewer than two points are visible or
    /// the second-to-last point is zero.
    pub fn from_visible(location: &str, values: &[f64]) -> Self {
        let max = values.iter().copied().fold(0.0_f64, f64::max);

        let (up, delta_pct) = match values {
            [.., prev, last] if *prev != 0.0 => {
                let up = last - prev;
                (up, Self::pct(up, *prev))
            }
            _ => (0.0, 0.0),
        };

        ChartStats {
            location: location.to_string(),
            forecast_days: 0,
            last_date: None,
            points: values.len(),
            max,
            up,
            delta_pct,
        }
    }

    pub fn pct(part: f64, total: f64) -> f64 {
        if total == 0.0 {
            0.0
        } else {
            part / total * 100.0
        }
    }

    pub fn with_forecast(mut self, days: usize) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn with_last_date(mut self, date: Option<&str>) -> Self {
        self.last_date = date.map(str::to_string);
        self
    }

    /// Chart title, e.g. `"US    1,234 ↑ 56 Δ   5%"`.
    pub fn title(&self) -> String {
        let figures = format!(
            "{:>8} ↑ {} Δ {:3.0}%",
            thousands(self.max as i64),
            thousands(self.up as i64),
            self.delta_pct
        );
        if self.forecast_days > 0 {
            format!(
                "{} EST in {} days\n{figures}",
                self.location, self.forecast_days
            )
        } else {
            format!("{} {figures}", self.location)
        }
    }
}

/// Formats an integer with comma thousands separators.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
