// Port Layer - Interfaces for external collaborators

pub mod conversation;
pub mod downloader;
pub mod id_provider; // For deterministic testing
pub mod time_provider;

// Re-exports
pub use conversation::{Conversation, ConversationError, ReplyHandle, StatusSink};
pub use downloader::{MediaDownloader, ProgressFn};
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;
