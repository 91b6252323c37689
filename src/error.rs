//! Typed errors for data ingestion and command handling.

use thiserror::Error;

/// Failures while turning a downloaded time-series file into numbers.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("data has no header row")]
    MissingHeader,

    #[error("header has {found} columns; expected at least 4")]
    ShortHeader { found: usize },

    #[error("row {row} has {found} columns; expected {expected}")]
    ColumnCount {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row}, column {column}: invalid count {value:?}")]
    InvalidCount {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("row {row}, column {column}: total exceeds the supported range")]
    Overflow { row: usize, column: usize },

    #[error("forecasting needs at least two observations, got {0}")]
    SeriesTooShort(usize),
}

/// Failures while interpreting a line typed by the operator.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("unknown setting: {0}")]
    UnknownSetting(String),
}
