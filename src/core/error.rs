//! Error type shared by the library.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Library-level error. Only structural problems (bad config, missing input,
/// unreachable control-plane services) surface through this type; oracle
/// failures during a search are folded into the result data instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Missing required columns in '{}': {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Domain extraction failed: {0}")]
    DomainExtraction(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: {message}")]
    Api { service: &'static str, message: String },

    #[error("{label} did not finish within {waited:?} (last status: {last_status})")]
    PollTimeout {
        label: String,
        waited: Duration,
        last_status: String,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
