// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Per-job faults never surface here; they end up in the job's terminal
/// state (see `DownloadError`).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
