//! Terminal presentation of a [`Dashboard`].
//!
//! The screen is a heading, a grid of bordered cells and a footer. Each cell
//! holds the chart title above a ratatui [`BarChart`] with one single-width
//! bar per point; points are merged when they do not fit the chart width.
//! Forecast bars are red.

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget},
};

use crate::dashboard::{Chart, Dashboard};
use crate::settings::Settings;

pub const SOURCE_LINK: &str = "https://github.com/CSSEGISandData/COVID-19/tree/master/csse_covid_19_data/csse_covid_19_time_series";

const TITLE_WIDTH: u16 = 30;
const TITLE_LINES: u16 = 2;
const BORDERS: u16 = 2;
const MIN_SCREEN_WIDTH: u16 = 80;
const PIXELS_PER_COLUMN: u32 = 10;
const PIXELS_PER_ROW: u32 = 25;

/// Chart size in text cells for the configured pixel size.
pub fn chart_size(settings: &Settings) -> (u16, u16) {
    let width = (settings.graph_x_size / PIXELS_PER_COLUMN).clamp(8, u16::MAX as u32) as u16;
    let height = (settings.graph_y_size / PIXELS_PER_ROW).clamp(1, u16::MAX as u32) as u16;
    (width, height)
}

/// Size of one grid cell, borders included.
fn cell_size(settings: &Settings) -> (u16, u16) {
    let (width, height) = chart_size(settings);
    (
        width.max(TITLE_WIDTH).saturating_add(BORDERS),
        height.saturating_add(TITLE_LINES + BORDERS),
    )
}

/// Bar heights for a chart `width` cells wide, each flagged when it is a
/// forecast. Values above a fixed scale are clamped to it.
pub fn bar_values(chart: &Chart, width: usize) -> Vec<(u64, bool)> {
    let n = chart.values.len();
    let first_forecast = n - chart.forecast_points();
    let chunk = n.div_ceil(width.max(1)).max(1);
    let ceiling = chart.scale_max.unwrap_or(f64::MAX);

    (0..n)
        .step_by(chunk)
        .map(|start| {
            let last = (start + chunk).min(n) - 1;
            let value = chart.values[last].clamp(0.0, ceiling).round() as u64;
            (value, last >= first_forecast)
        })
        .collect()
}

fn render_chart(chart: &Chart, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    block.render(area, buf);

    let [title_area, bars_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TITLE_LINES), Constraint::Min(0)])
        .areas(inner);

    Paragraph::new(chart.stats.title()).render(title_area, buf);

    let bars: Vec<Bar> = bar_values(chart, bars_area.width as usize)
        .into_iter()
        .map(|(value, forecast)| {
            let bar = Bar::default().value(value).text_value(String::new());
            if forecast {
                bar.style(Style::default().fg(Color::Red))
            } else {
                bar
            }
        })
        .collect();

    let mut barchart = BarChart::default()
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    if let Some(max) = chart.scale_max {
        barchart = barchart.max(max.round().max(1.0) as u64);
    }
    barchart.render(bars_area, buf);
}

/// The full dashboard screen.
pub struct DashboardView<'a> {
    dash: &'a Dashboard,
    settings: &'a Settings,
    updated: Option<DateTime<Local>>,
}

impl<'a> DashboardView<'a> {
    pub fn new(
        dash: &'a Dashboard,
        settings: &'a Settings,
        updated: Option<DateTime<Local>>,
    ) -> Self {
        Self {
            dash,
            settings,
            updated,
        }
    }

    fn cols(&self) -> usize {
        self.settings.cols.max(1)
    }

    fn grid_rows(&self) -> u16 {
        self.dash.charts.len().div_ceil(self.cols()) as u16
    }

    fn footer(&self) -> Vec<Line<'static>> {
        let dash = self.dash;
        let mut lines = Vec::new();
        if dash.charts.is_empty() {
            lines.push(Line::from(
                "No locations to show. Use `locations` to choose some.",
            ));
        }
        lines.push(Line::from(format!(
            "Rewind {} of up to {} days",
            dash.rewind, dash.max_rewind
        )));
        if !dash.hidden.is_empty() {
            lines.push(Line::from(format!(
                "Not shown, grid holds {}: {}",
                self.settings.capacity(),
                dash.hidden.join(", ")
            )));
        }
        if !dash.missing.is_empty() {
            lines.push(Line::from(format!(
                "Not in data: {}",
                dash.missing.join(", ")
            )));
        }
        if let Some(updated) = self.updated {
            lines.push(Line::from(format!(
                "Updated {}",
                updated.format("%B %d %I:%M:%S %p")
            )));
        }
        if let Some(last) = &dash.last_datapoint {
            lines.push(Line::from(format!("Date of last datapoint {last}")));
        }
        lines.push(Line::from(
            "Data source: Johns Hopkins - https://github.com/CSSEGISandData/COVID-19",
        ));
        lines
    }

    /// Width and height that show the whole grid and footer.
    pub fn size(&self) -> (u16, u16) {
        let (cell_width, cell_height) = cell_size(self.settings);
        let shown_cols = self.dash.charts.len().min(self.cols()) as u16;
        let width = shown_cols
            .saturating_mul(cell_width)
            .max(MIN_SCREEN_WIDTH);
        let height = self
            .grid_rows()
            .saturating_mul(cell_height)
            .saturating_add(2 + self.footer().len() as u16);
        (width, height)
    }

    /// Renders off-screen at [`DashboardView::size`] and returns the text.
    pub fn to_text(self) -> String {
        let (width, height) = self.size();
        render_to_string(self, width, height)
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cell_width, cell_height) = cell_size(self.settings);
        let footer = self.footer();

        let [heading_area, _, grid_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(self.grid_rows().saturating_mul(cell_height)),
                Constraint::Min(0),
            ])
            .areas(area);

        let mut heading = vec![Span::styled(
            self.dash.heading,
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if let Some((start, end)) = &self.dash.date_range {
            heading.push(Span::raw(format!("      {start} - {end}")));
        }
        Paragraph::new(Line::from(heading)).render(heading_area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(cell_height); self.grid_rows() as usize])
            .split(grid_area);
        let mut column_constraints = vec![Constraint::Length(cell_width); self.cols()];
        column_constraints.push(Constraint::Min(0));

        for (row_area, charts) in rows.iter().zip(self.dash.charts.chunks(self.cols())) {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(column_constraints.clone())
                .split(*row_area);
            for (cell, chart) in cells.iter().zip(charts) {
                render_chart(chart, *cell, buf);
            }
        }

        Paragraph::new(footer).render(footer_area, buf);
    }
}

/// Screen shown before the first successful download.
pub struct WaitingView<'a> {
    settings: &'a Settings,
}

impl<'a> WaitingView<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn to_text(self) -> String {
        render_to_string(self, MIN_SCREEN_WIDTH, 3)
    }
}

impl Widget for WaitingView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(vec![
            Line::from(Span::styled(
                self.settings.data_source.heading(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from("No data loaded yet. Type `refresh` to retry."),
        ])
        .render(area, buf);
    }
}

/// Renders `widget` into an off-screen buffer and returns its text, one line
/// per row with trailing blanks removed.
pub fn render_to_string<W: Widget>(widget: W, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);
    buffer_text(&buf)
}

pub fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ChartStats;

    fn chart(values: &[f64], forecast_days: usize) -> Chart {
        Chart {
            stats: ChartStats::from_visible("US", values).with_forecast(forecast_days),
            values: values.to_vec(),
            scale_max: None,
        }
    }

    fn dashboard(charts: Vec<Chart>) -> Dashboard {
        Dashboard {
            heading: "COVID-19 Cases By Region",
            date_range: Some(("1/22/20".into(), "1/23/20".into())),
            last_datapoint: Some("1/23/20".into()),
            charts,
            hidden: vec![],
            missing: vec![],
            rewind: 0,
            max_rewind: 1,
        }
    }

    fn red_cells(buf: &Buffer) -> usize {
        buf.content
            .iter()
            .filter(|cell| cell.fg == Color::Red && cell.symbol() != " ")
            .count()
    }

    fn render_buffer(dash: &Dashboard, settings: &Settings) -> Buffer {
        let view = DashboardView::new(dash, settings, None);
        let (width, height) = view.size();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buf
    }

    #[test]
    fn test_chart_size_from_pixels() {
        assert_eq!(chart_size(&Settings::default()), (30, 6));
        let tiny = Settings {
            graph_x_size: 1,
            graph_y_size: 1,
            ..Settings::default()
        };
        assert_eq!(chart_size(&tiny), (8, 1));
    }

    #[test]
    fn test_bar_values_one_per_point() {
        assert_eq!(
            bar_values(&chart(&[0.0, 4.4, 8.6], 0), 30),
            vec![(0, false), (4, false), (9, false)]
        );
    }

    #[test]
    fn test_points_merge_when_wider_than_chart() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let bars = bar_values(&chart(&values, 0), 5);
        assert_eq!(bars.len(), 5);
        assert_eq!(bars.last(), Some(&(10, false)));
    }

    #[test]
    fn test_fixed_scale_clamps() {
        let mut c = chart(&[50.0, 500.0], 0);
        c.scale_max = Some(100.0);
        assert_eq!(bar_values(&c, 2), vec![(50, false), (100, false)]);
    }

    #[test]
    fn test_forecast_points_are_flagged() {
        let bars = bar_values(&chart(&[1.0, 2.0, 3.0], 1), 3);
        assert_eq!(bars, vec![(1, false), (2, false), (3, true)]);
    }

    #[test]
    fn test_forecast_bars_are_red() {
        let settings = Settings::default();
        let forecast = render_buffer(&dashboard(vec![chart(&[1.0, 2.0, 3.0], 1)]), &settings);
        assert!(red_cells(&forecast) > 0);

        let plain = render_buffer(&dashboard(vec![chart(&[1.0, 2.0, 3.0], 0)]), &settings);
        assert_eq!(red_cells(&plain), 0);
    }

    #[test]
    fn test_dashboard_text() {
        let mut dash = dashboard(vec![chart(&[100.0, 150.0], 0)]);
        dash.hidden = vec!["Peru".into()];
        let text = DashboardView::new(&dash, &Settings::default(), None).to_text();

        assert!(text.starts_with("COVID-19 Cases By Region      1/22/20 - 1/23/20\n"));
        assert!(text.contains("US      150 ↑ 50 Δ  50%"));
        assert!(text.contains("Rewind 0 of up to 1 days"));
        assert!(text.contains("Not shown, grid holds 8: Peru"));
        assert!(text.contains("Date of last datapoint 1/23/20"));
        assert!(!text.contains("Not in data"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_grid_wraps_after_configured_columns() {
        let settings = Settings {
            cols: 2,
            ..Settings::default()
        };
        let dash = dashboard(vec![chart(&[1.0, 2.0], 0); 3]);
        let view = DashboardView::new(&dash, &settings, None);
        let (width, height) = view.size();
        let (cell_width, cell_height) = cell_size(&settings);

        assert_eq!(width, (2 * cell_width).max(MIN_SCREEN_WIDTH));
        assert_eq!(height, 2 + 2 * cell_height + 3);
        let text = view.to_text();
        assert_eq!(text.matches("US ").count(), 3);
    }

    #[test]
    fn test_empty_grid_hint() {
        let text = DashboardView::new(&dashboard(vec![]), &Settings::default(), None).to_text();
        assert!(text.contains("No locations to show"));
    }

    #[test]
    fn test_waiting_screen() {
        let text = WaitingView::new(&Settings::default()).to_text();
        assert!(text.starts_with("COVID-19 Cases By Region\n\n"));
        assert!(text.contains("No data loaded yet"));
    }
}
