use std::path::PathBuf;
use thiserror::Error;

/// Why a single year's file contributed no rows. Never fatal to the
/// other years.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("{year}: file not found ({})", .path.display())]
    FileNotFound { year: i32, path: PathBuf },

    #[error("{year}: parse error in {}: {reason}", .path.display())]
    ParseFailure {
        year: i32,
        path: PathBuf,
        reason: String,
    },
}

/// A decoded table that cannot be reshaped at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("table has {0} column(s); need at least a sequence id and a manufacturer column")]
    TooFewColumns(usize),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("no data loaded: every configured year failed or was empty")]
    EmptyResult,
}

pub type Result<T> = std::result::Result<T, ReportError>;
