// Domain Layer - Pure business logic and entities

pub mod error;
pub mod filename;
pub mod job;
pub mod progress;

// Re-exports
pub use error::{DomainError, DownloadError, TransferFault};
pub use job::{
    InboundEvent, Job, JobId, JobSource, JobState, MediaInfo, MediaKind, MessageRef,
};
pub use progress::{quantize, ProgressState};
