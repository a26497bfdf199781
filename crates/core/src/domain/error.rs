// Domain Error Types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Fault raised by the media downloader while a transfer is running.
///
/// `category` is a short tag for the kind of fault (e.g. `IOError`),
/// `description` the human readable detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{category}: {description}")]
pub struct TransferFault {
    pub category: String,
    pub description: String,
}

impl TransferFault {
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
        }
    }

    /// Wrap an I/O error under the `IOError` category
    pub fn io(err: &std::io::Error) -> Self {
        Self::new("IOError", err.to_string())
    }
}

/// Per-job failure taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Timeout reached after {0:?}")]
    Timeout(Duration),

    #[error("Transfer fault: {0}")]
    Transfer(TransferFault),

    #[error("Cancellation requested")]
    CancellationRequested,

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl DownloadError {
    /// Text of the separate error notification sent to the originating
    /// conversation, if this failure produces one.
    pub fn notification(&self) -> Option<String> {
        match self {
            DownloadError::Timeout(_) => {
                Some("ERROR: Timeout reached downloading this file".to_string())
            }
            DownloadError::Transfer(fault) => Some(format!(
                "ERROR: Exception {} raised downloading this file: {}",
                fault.category, fault.description
            )),
            DownloadError::CancellationRequested | DownloadError::MalformedEvent(_) => None,
        }
    }
}
