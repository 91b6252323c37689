//! The read-loop state machine.
//!
//! [`App::handle`] consumes one [`Event`] and returns the [`Effect`]s the
//! driver must carry out. It performs no IO itself, so every transition can be
//! exercised without a network or a terminal.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::error::CommandError;
use crate::locations::{LocationKey, LocationTable};
use crate::settings::{DEFAULT_LOCATIONS, DataSource, SettingChange, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Fetching,
    Rendering,
}

/// Operator input, one per line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Draw the current data again.
    Redraw,
    Refresh,
    Rewind(usize),
    Set { key: String, value: String },
    Locations(Vec<String>),
    Forecast { days: String, rate: Option<String> },
    List,
    Raw(Option<String>),
    Export(PathBuf),
    Link,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  refresh                    download the data again
  rewind <days>              hide the most recent days
  days <n>                   number of days to display (0 for all)
  source confirmed|deaths    choose the charted series
  locations <a>, <b>, ...    choose the charted locations
  list                       list every location in the data
  forecast <days> [rate]     add forecast charts (forecast off to hide them)
  set <key>=<value>          change a setting (rows, cols, autoscale, graphmax, ...)
  raw [location]             print a location's full series as JSON
  export <path>              append the charts' statistics to a CSV file
  link                       open the data-source page in a browser
  help                       show this help
  quit                       exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => Command::Redraw,
            "refresh" | "r" => Command::Refresh,
            "rewind" => Command::Rewind(rest.parse().map_err(|_| {
                CommandError::MissingArgument {
                    command: "rewind",
                    expected: "a number of days",
                }
            })?),
            "days" => Command::Set {
                key: "display days".into(),
                value: rest.into(),
            },
            "source" => Command::Set {
                key: "data source".into(),
                value: rest.into(),
            },
            "set" => {
                let (key, value) = rest.split_once('=').ok_or(CommandError::MissingArgument {
                    command: "set",
                    expected: "<key>=<value>",
                })?;
                Command::Set {
                    key: key.trim().into(),
                    value: value.trim().into(),
                }
            }
            "locations" => {
                let names: Vec<String> = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect();
                if names.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "locations",
                        expected: "a comma-separated list of locations",
                    });
                }
                Command::Locations(names)
            }
            "forecast" => {
                let mut args = rest.split_whitespace();
                let days = match args.next() {
                    Some(d) if d.eq_ignore_ascii_case("off") => "0".to_string(),
                    Some(d) => d.to_string(),
                    None => {
                        return Err(CommandError::MissingArgument {
                            command: "forecast",
                            expected: "a number of days or `off`",
                        });
                    }
                };
                Command::Forecast {
                    days,
                    rate: args.next().map(String::from),
                }
            }
            "list" => Command::List,
            "raw" => Command::Raw((!rest.is_empty()).then(|| rest.to_string())),
            "export" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "export",
                        expected: "a file path",
                    });
                }
                Command::Export(PathBuf::from(rest))
            }
            "link" => Command::Link,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[derive(Debug)]
pub enum Event {
    TimerElapsed,
    User(Command),
    FetchComplete(Result<LocationTable>),
}

/// Work the driver performs on behalf of [`App`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(DataSource),
    Render,
    SaveSettings,
    ListLocations,
    PrintRaw(LocationKey),
    Export(PathBuf),
    OpenLink,
    Notify(String),
    Help,
    Quit,
}

pub struct App {
    settings: Settings,
    state: State,
    table: Option<LocationTable>,
    /// Series the current table was downloaded from.
    loaded_source: DataSource,
    /// Series of the download in flight.
    fetching: Option<DataSource>,
    rewind: usize,
    updated: Option<DateTime<Local>>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            loaded_source: settings.data_source,
            settings,
            state: State::Idle,
            table: None,
            fetching: None,
            rewind: 0,
            updated: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Last successfully downloaded table, if any.
    pub fn table(&self) -> Option<&LocationTable> {
        self.table.as_ref()
    }

    /// Series the current table was downloaded from. It can differ from the
    /// configured source while a download after a source change is pending or
    /// has failed.
    pub fn loaded_source(&self) -> DataSource {
        self.loaded_source
    }

    pub fn rewind(&self) -> usize {
        self.rewind
    }

    pub fn updated(&self) -> Option<DateTime<Local>> {
        self.updated
    }

    /// The grid for the current table, or `None` before the first download.
    pub fn dashboard(&self) -> Option<Dashboard> {
        self.table
            .as_ref()
            .map(|table| {
                Dashboard::build(table, self.loaded_source, &self.settings, self.rewind)
            })
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if let Event::User(Command::Quit) = event {
            return vec![Effect::Quit];
        }

        match (self.state, event) {
            (State::Idle, Event::TimerElapsed) => self.begin_fetch(),
            (State::Idle, Event::User(command)) => self.apply(command),
            (State::Fetching, Event::FetchComplete(Ok(table))) => self.install(table),
            (State::Fetching, Event::FetchComplete(Err(e))) => {
                warn!(error = %e, source = ?self.fetching, "Refresh failed, keeping previous data");
                self.fetching = None;
                self.state = State::Idle;
                vec![Effect::Notify(format!("Refresh failed: {e:#}"))]
            }
            (state, _) => {
                debug!(?state, "Event not accepted in this state, ignoring");
                Vec::new()
            }
        }
    }

    /// Called by the driver once a frame has been drawn.
    pub fn render_complete(&mut self) {
        if self.state == State::Rendering {
            self.state = State::Idle;
        }
    }

    fn begin_fetch(&mut self) -> Vec<Effect> {
        self.state = State::Fetching;
        self.fetching = Some(self.settings.data_source);
        vec![Effect::Fetch(self.settings.data_source)]
    }

    fn render(&mut self) -> Vec<Effect> {
        self.state = State::Rendering;
        vec![Effect::Render]
    }

    fn max_rewind(&self) -> usize {
        self.table
            .as_ref()
            .map_or(0, |t| t.days().saturating_sub(1))
    }

    fn install(&mut self, table: LocationTable) -> Vec<Effect> {
        info!(
            days = table.days(),
            countries = table.countries().count(),
            "Data refreshed"
        );

        let mut effects = Vec::new();
        if self.settings.locations.is_empty() {
            let names = table.location_names();
            self.settings.locations = DEFAULT_LOCATIONS
                .iter()
                .filter(|d| names.contains(*d))
                .map(|d| d.to_string())
                .collect();
            info!(locations = ?self.settings.locations, "No locations chosen, using defaults");
            effects.push(Effect::SaveSettings);
        }

        self.table = Some(table);
        self.loaded_source = self.fetching.take().unwrap_or(self.settings.data_source);
        self.updated = Some(Local::now());
        self.rewind = self.rewind.min(self.max_rewind());

        effects.extend(self.render());
        effects
    }

    fn apply(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Redraw => self.render(),
            Command::Refresh => self.begin_fetch(),
            Command::Rewind(days) => {
                self.rewind = days.min(self.max_rewind());
                self.render()
            }
            Command::Set { key, value } => match self.settings.apply(&key, &value) {
                Ok(change) => self.settings_changed(change),
                Err(e) => vec![Effect::Notify(e.to_string())],
            },
            Command::Forecast { days, rate } => {
                self.settings.set_forecast(&days, rate.as_deref());
                self.settings_changed(SettingChange::View)
            }
            Command::Locations(names) => {
                let capacity = self.settings.capacity();
                if names.len() > capacity {
                    warn!(
                        chosen = names.len(),
                        capacity, "More locations chosen than the grid can show"
                    );
                }
                self.settings.locations = names;
                self.settings_changed(SettingChange::View)
            }
            Command::List => vec![Effect::ListLocations],
            Command::Raw(name) => {
                let key = name.as_deref().map_or(LocationKey::WorldwideTotal, LocationKey::from_choice);
                vec![Effect::PrintRaw(key)]
            }
            Command::Export(path) => vec![Effect::Export(path)],
            Command::Link => vec![Effect::OpenLink],
            Command::Help => vec![Effect::Help],
            Command::Quit => vec![Effect::Quit],
        }
    }

    fn settings_changed(&mut self, change: SettingChange) -> Vec<Effect> {
        let mut effects = vec![Effect::SaveSettings];
        match change {
            SettingChange::DataSource => effects.extend(self.begin_fetch()),
            SettingChange::View => effects.extend(self.render()),
        }
        effects
    }
}
