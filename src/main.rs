//! CLI entry point for the COVID-19 sparkline dashboard.
//!
//! Downloads the Johns Hopkins time series, draws the chosen locations as a
//! grid of bar charts and refreshes on a fixed interval. Commands are read
//! from stdin, one per line.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io::{IsTerminal, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use covid_sparklines::{
    app::{App, Command, Effect, Event, HELP},
    fetch::{BasicClient, HttpClient},
    locations::load_table,
    output::{RawSeries, append_records, series_json},
    render::{DashboardView, SOURCE_LINK, WaitingView},
    settings::{DataSource, Settings},
    stats::ChartStats,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// One week.
const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;

#[derive(Parser)]
#[command(name = "covid_sparklines")]
#[command(about = "Terminal dashboard of COVID-19 cases and deaths by region", long_about = None)]
struct Cli {
    /// Minutes between automatic refreshes
    #[arg(
        short,
        long,
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_MINUTES)
    )]
    refresh_minutes: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/covid_sparklines.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_sparklines.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings_path = PathBuf::from(
        std::env::var("COVID_SPARKLINES_SETTINGS").unwrap_or_else(|_| "app.cfg".to_string()),
    );
    let settings = Settings::load_or_create(&settings_path)?;
    let period = Duration::from_secs(cli.refresh_minutes * 60);

    info!(
        refresh_minutes = cli.refresh_minutes,
        settings = %settings_path.display(),
        source = %settings.data_source,
        "Starting dashboard"
    );

    let client = BasicClient::new();
    run(App::new(settings), &client, &settings_path, period).await
}

/// Source location for a data series, overridable per series from the environment.
fn source_url(source: DataSource) -> String {
    let var = match source {
        DataSource::Confirmed => "COVID_SPARKLINES_CONFIRMED_URL",
        DataSource::Deaths => "COVID_SPARKLINES_DEATHS_URL",
    };
    std::env::var(var).unwrap_or_else(|_| source.url().to_string())
}

/// The read-loop: waits for either the refresh timer or an operator command,
/// feeds the event to [`App`] and carries out the resulting effects.
async fn run<C: HttpClient>(
    mut app: App,
    client: &C,
    settings_path: &Path,
    period: Duration,
) -> Result<()> {
    // The first tick completes immediately and triggers the initial download.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut screen = Screen::new()?;

    loop {
        let event = tokio::select! {
            _ = ticker.tick() => Event::TimerElapsed,
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match Command::parse(&line) {
                    Ok(command) => Event::User(command),
                    Err(e) => {
                        println!("{e}. Type `help` for commands.");
                        continue;
                    }
                },
                None => {
                    info!("stdin closed, refreshing on the timer only");
                    stdin_open = false;
                    continue;
                }
            },
        };

        let mut pending = VecDeque::from(app.handle(event));
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Fetch(source) => {
                    println!("Updating data");
                    let result = load_table(client, &source_url(source)).await;
                    ticker.reset();
                    pending.extend(app.handle(Event::FetchComplete(result)));
                }
                Effect::Render => {
                    if let Err(e) = screen.draw(&app) {
                        error!(error = %e, "Failed to draw dashboard");
                    }
                    app.render_complete();
                }
                Effect::SaveSettings => {
                    if let Err(e) = app.settings().save(settings_path) {
                        error!(error = %e, "Failed to save settings");
                    }
                }
                Effect::ListLocations => match app.table() {
                    Some(table) => {
                        for row in table.location_names().chunks(7) {
                            println!("{}", row.join(", "));
                        }
                    }
                    None => println!("No data loaded yet"),
                },
                Effect::PrintRaw(key) => match app.table() {
                    Some(table) => match table.series(&key) {
                        Some(values) => {
                            let raw = RawSeries {
                                location: key.to_string(),
                                dates: table.header(),
                                values,
                            };
                            println!("{}", series_json(&raw)?);
                        }
                        None => println!("Unknown location: {key}"),
                    },
                    None => println!("No data loaded yet"),
                },
                Effect::Export(path) => {
                    let stats: Vec<ChartStats> = app
                        .dashboard()
                        .map(|dash| dash.charts.into_iter().map(|c| c.stats).collect())
                        .unwrap_or_default();
                    match append_records(&path, &stats) {
                        Ok(()) => println!("Exported {} charts to {}", stats.len(), path.display()),
                        Err(e) => {
                            error!(path = %path.display(), error = %e, "Export failed");
                            println!("Export failed: {e}");
                        }
                    }
                }
                Effect::OpenLink => {
                    if let Err(e) = open_in_browser(SOURCE_LINK) {
                        warn!(error = %e, "Could not open browser");
                        println!("{SOURCE_LINK}");
                    }
                }
                Effect::Notify(message) => println!("{message}"),
                Effect::Help => println!("{HELP}"),
                Effect::Quit => {
                    info!("Exiting");
                    return Ok(());
                }
            }
        }
    }
}

/// Where frames go: the terminal through crossterm, or plain text when stdout
/// is redirected.
enum Screen {
    Terminal(Terminal<CrosstermBackend<Stdout>>),
    Plain,
}

impl Screen {
    fn new() -> Result<Self> {
        if std::io::stdout().is_terminal() {
            let terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
            Ok(Screen::Terminal(terminal))
        } else {
            Ok(Screen::Plain)
        }
    }

    fn draw(&mut self, app: &App) -> Result<()> {
        let dash = app.dashboard();
        match self {
            Screen::Terminal(terminal) => {
                terminal.clear()?;
                terminal.draw(|frame| {
                    let area = frame.area();
                    match &dash {
                        Some(dash) => frame.render_widget(
                            DashboardView::new(dash, app.settings(), app.updated()),
                            area,
                        ),
                        None => frame.render_widget(WaitingView::new(app.settings()), area),
                    }
                    // Typed commands echo on the last line.
                    frame.set_cursor_position((0, area.bottom().saturating_sub(1)));
                })?;
            }
            Screen::Plain => {
                let text = match &dash {
                    Some(dash) => DashboardView::new(dash, app.settings(), app.updated()).to_text(),
                    None => WaitingView::new(app.settings()).to_text(),
                };
                print!("{text}");
            }
        }
        Ok(())
    }
}

fn open_in_browser(url: &str) -> Result<()> {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    std::process::Command::new(program)
        .arg(url)
        .spawn()
        .with_context(|| format!("failed to launch {program}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_minutes_default() {
        let cli = Cli::try_parse_from(["covid_sparklines"]).unwrap();
        assert_eq!(cli.refresh_minutes, 20);
    }

    #[test]
    fn test_refresh_minutes_range() {
        let cli = Cli::try_parse_from(["covid_sparklines", "-r", "5"]).unwrap();
        assert_eq!(cli.refresh_minutes, 5);

        assert!(Cli::try_parse_from(["covid_sparklines", "--refresh-minutes", "0"]).is_err());
        let above_max = (MAX_REFRESH_MINUTES + 1).to_string();
        assert!(Cli::try_parse_from(["covid_sparklines", "-r", above_max.as_str()]).is_err());
        assert!(Cli::try_parse_from(["covid_sparklines", "-r", "18446744073709551615"]).is_err());
    }
}
