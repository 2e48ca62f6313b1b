//! Error types for dataset loading and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors raised while loading or slicing the dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The CSV file could not be opened.
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A data row has more fields than the header.
    #[error("row {row} has {found} fields, header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Columns handed to the constructor differ in length.
    #[error("column '{name}' has {found} cells, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    /// No column with this name.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// The column holds text where numbers are required.
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
}

/// Errors raised while loading service configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to bring an HTTP server up.
#[derive(Error, Debug)]
pub enum StartError {
    #[error("invalid bind address {addr}: {reason}")]
    Address { addr: String, reason: String },

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("failed to spawn server thread: {0}")]
    Spawn(#[from] std::io::Error),
}
