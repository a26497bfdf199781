// Conversation Port
// Abstraction over the chat client: send replies, edit them in place

use crate::domain::MessageRef;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Handle to a reply message created by `Conversation::send_reply`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Conversation errors
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Edit failed: {0}")]
    EditFailed(String),
}

/// Conversation reply collaborator
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Create a new visible message quoting `to`
    async fn send_reply(&self, to: &MessageRef, text: &str)
        -> Result<ReplyHandle, ConversationError>;

    /// Replace the text of a previously sent reply
    async fn edit_reply(&self, reply: &ReplyHandle, text: &str) -> Result<(), ConversationError>;
}

/// Edit-in-place status message owned by one job
#[derive(Clone)]
pub struct StatusSink {
    conversation: Arc<dyn Conversation>,
    reply: ReplyHandle,
}

impl StatusSink {
    pub fn new(conversation: Arc<dyn Conversation>, reply: ReplyHandle) -> Self {
        Self {
            conversation,
            reply,
        }
    }

    pub fn reply(&self) -> ReplyHandle {
        self.reply
    }

    /// Replace the shown status text.
    ///
    /// Failures are logged and swallowed; a lost status edit never fails the job.
    pub async fn push(&self, text: &str) -> bool {
        match self.conversation.edit_reply(&self.reply, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    chat_id = self.reply.chat_id,
                    message_id = self.reply.message_id,
                    status = text,
                    error = %e,
                    "Failed to update status message"
                );
                false
            }
        }
    }

    /// Send a separate reply to `to` through the same conversation.
    ///
    /// Failures are logged and swallowed like status edits.
    pub async fn notify(&self, to: &MessageRef, text: &str) -> bool {
        match self.conversation.send_reply(to, text).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    chat_id = to.chat_id,
                    message_id = to.message_id,
                    error = %e,
                    "Failed to send notification"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for StatusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSink")
            .field("reply", &self.reply)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A reply recorded by `RecordingConversation`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentReply {
        pub to: MessageRef,
        pub handle: ReplyHandle,
        pub text: String,
    }

    #[derive(Default)]
    struct Recorded {
        next_id: i64,
        replies: Vec<SentReply>,
        edits: HashMap<ReplyHandle, Vec<String>>,
        timeline: Vec<(ReplyHandle, String)>,
        fail_sends: bool,
        fail_edits: bool,
    }

    /// In-memory conversation keeping every reply and edit in order
    #[derive(Default)]
    pub struct RecordingConversation {
        inner: Mutex<Recorded>,
    }

    impl RecordingConversation {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every `send_reply` fail
        pub fn fail_sends(&self, fail: bool) {
            self.inner.lock().unwrap().fail_sends = fail;
        }

        /// Make every `edit_reply` fail
        pub fn fail_edits(&self, fail: bool) {
            self.inner.lock().unwrap().fail_edits = fail;
        }

        pub fn replies(&self) -> Vec<SentReply> {
            self.inner.lock().unwrap().replies.clone()
        }

        /// Replies sent in response to `message`, in order
        pub fn replies_to(&self, message: &MessageRef) -> Vec<SentReply> {
            self.replies()
                .into_iter()
                .filter(|r| &r.to == message)
                .collect()
        }

        /// Every text ever shown by `handle`: initial text, then each edit
        pub fn history(&self, handle: &ReplyHandle) -> Vec<String> {
            let inner = self.inner.lock().unwrap();
            let mut out: Vec<String> = inner
                .replies
                .iter()
                .filter(|r| &r.handle == handle)
                .map(|r| r.text.clone())
                .collect();
            if let Some(edits) = inner.edits.get(handle) {
                out.extend(edits.iter().cloned());
            }
            out
        }

        /// Status history of the first reply to `message` (the job's status message)
        pub fn status_history(&self, message: &MessageRef) -> Vec<String> {
            match self.replies_to(message).first() {
                Some(first) => self.history(&first.handle),
                None => Vec::new(),
            }
        }

        /// Replies to `message` after the status message (error notifications)
        pub fn notifications(&self, message: &MessageRef) -> Vec<String> {
            self.replies_to(message)
                .into_iter()
                .skip(1)
                .map(|r| r.text)
                .collect()
        }

        /// All sends and edits across every reply, in call order
        pub fn timeline(&self) -> Vec<(ReplyHandle, String)> {
            self.inner.lock().unwrap().timeline.clone()
        }
    }

    #[async_trait]
    impl Conversation for RecordingConversation {
        async fn send_reply(
            &self,
            to: &MessageRef,
            text: &str,
        ) -> Result<ReplyHandle, ConversationError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_sends {
                return Err(ConversationError::SendFailed("mock send failure".to_string()));
            }
            inner.next_id += 1;
            let handle = ReplyHandle {
                chat_id: to.chat_id,
                message_id: 100_000 + inner.next_id,
            };
            inner.replies.push(SentReply {
                to: to.clone(),
                handle,
                text: text.to_string(),
            });
            inner.timeline.push((handle, text.to_string()));
            Ok(handle)
        }

        async fn edit_reply(
            &self,
            reply: &ReplyHandle,
            text: &str,
        ) -> Result<(), ConversationError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_edits {
                return Err(ConversationError::EditFailed("mock edit failure".to_string()));
            }
            inner
                .edits
                .entry(*reply)
                .or_default()
                .push(text.to_string());
            inner.timeline.push((*reply, text.to_string()));
            Ok(())
        }
    }
}
