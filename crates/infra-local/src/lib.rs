// mediaq Infrastructure - Local Adapters
// Implements: MediaDownloader, Conversation, plus a JSON-lines event source

pub mod console_conversation;
pub mod event_source;
pub mod local_downloader;

pub use console_conversation::ConsoleConversation;
pub use event_source::{AuthorizedSenders, JsonLinesEventSource};
pub use local_downloader::LocalFileDownloader;
