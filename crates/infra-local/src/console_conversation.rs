// JSON-lines console conversation
// Every reply/edit becomes one line on the writer (stdout in the daemon)
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use mediaq_core::domain::MessageRef;
use mediaq_core::port::{Conversation, ConversationError, ReplyHandle};

/// One output line
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ConsoleLine<'a> {
    Reply {
        chat_id: i64,
        message_id: i64,
        reply_to: i64,
        text: &'a str,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: &'a str,
    },
}

/// Conversation that prints to a writer instead of talking to a chat server
pub struct ConsoleConversation<W> {
    out: Mutex<W>,
    next_id: AtomicI64,
}

impl ConsoleConversation<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleConversation<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_line(&self, line: &ConsoleLine<'_>) -> std::io::Result<()> {
        let mut bytes = serde_json::to_vec(line)?;
        bytes.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&bytes).await?;
        out.flush().await
    }
}

#[async_trait]
impl<W> Conversation for ConsoleConversation<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_reply(
        &self,
        to: &MessageRef,
        text: &str,
    ) -> Result<ReplyHandle, ConversationError> {
        let handle = ReplyHandle {
            chat_id: to.chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        self.write_line(&ConsoleLine::Reply {
            chat_id: handle.chat_id,
            message_id: handle.message_id,
            reply_to: to.message_id,
            text,
        })
        .await
        .map_err(|e| ConversationError::SendFailed(e.to_string()))?;
        Ok(handle)
    }

    async fn edit_reply(&self, reply: &ReplyHandle, text: &str) -> Result<(), ConversationError> {
        self.write_line(&ConsoleLine::Edit {
            chat_id: reply.chat_id,
            message_id: reply.message_id,
            text,
        })
        .await
        .map_err(|e| ConversationError::EditFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_reply_then_edit_lines() {
        let console = ConsoleConversation::new(Vec::new());
        let to = MessageRef {
            chat_id: 9,
            message_id: 77,
            sender_id: Some(1),
        };

        let handle = console.send_reply(&to, "In queue").await.unwrap();
        console.edit_reply(&handle, "Downloading...").await.unwrap();
        let second = console.send_reply(&to, "ERROR: x").await.unwrap();
        assert_ne!(handle, second);

        let out = String::from_utf8(console.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "reply");
        assert_eq!(lines[0]["reply_to"], 77);
        assert_eq!(lines[0]["text"], "In queue");
        assert_eq!(lines[1]["kind"], "edit");
        assert_eq!(lines[1]["message_id"], lines[0]["message_id"]);
        assert_eq!(lines[1]["text"], "Downloading...");
        assert_eq!(lines[2]["chat_id"], 9);
    }
}
