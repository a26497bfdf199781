// Shared fixtures for application-layer unit tests

use crate::domain::{Job, JobSource, MediaInfo, MediaKind, MessageRef};
use crate::port::conversation::mocks::RecordingConversation;
use crate::port::{ReplyHandle, StatusSink};
use std::sync::Arc;

pub fn message(id: i64) -> MessageRef {
    MessageRef {
        chat_id: 1,
        message_id: id,
        sender_id: Some(42),
    }
}

pub fn source(id: i64) -> JobSource {
    JobSource {
        message: message(id),
        media: MediaInfo {
            kind: MediaKind::Document,
            location: format!("loc-{}", id),
            file_name: Some(format!("file-{}.bin", id)),
            size: Some(100),
        },
        file_name: format!("file-{}.bin", id),
    }
}

/// Job whose status sink writes into a throwaway conversation
pub fn make_job(id: i64) -> Job {
    let sink = StatusSink::new(
        Arc::new(RecordingConversation::new()),
        ReplyHandle {
            chat_id: 1,
            message_id: 1000 + id,
        },
    );
    Job::new(format!("job-{}", id), 0, source(id), sink)
}
