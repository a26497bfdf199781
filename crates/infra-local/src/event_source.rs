// JSON-lines event source with sender authorization
// Filtering happens here, upstream of the core ingest handler
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use mediaq_core::domain::{InboundEvent, MessageRef};

/// Senders allowed to talk to the bot; empty means anyone
#[derive(Debug, Clone, Default)]
pub struct AuthorizedSenders {
    ids: HashSet<i64>,
}

impl AuthorizedSenders {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn anyone() -> Self {
        Self::default()
    }

    pub fn allows(&self, message: &MessageRef) -> bool {
        if self.ids.is_empty() {
            return true;
        }
        message
            .sender_id
            .map(|id| self.ids.contains(&id))
            .unwrap_or(false)
    }
}

/// Reads one `InboundEvent` JSON object per line
pub struct JsonLinesEventSource<R> {
    reader: R,
    buf: Vec<u8>,
    authorized: AuthorizedSenders,
}

impl<R> JsonLinesEventSource<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R, authorized: AuthorizedSenders) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            authorized,
        }
    }

    /// Next authorized event, or `None` at end of input.
    ///
    /// Blank lines, lines that are not UTF-8 or not a valid event, and
    /// unauthorized senders are skipped. Only I/O failures of the
    /// underlying reader are returned as errors. Dropping the future
    /// mid-line loses that line.
    pub async fn next_event(&mut self) -> std::io::Result<Option<InboundEvent>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(error = %e, "Skipping event line that is not UTF-8");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            let event: InboundEvent = match serde_json::from_str(line) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable event line");
                    continue;
                }
            };
            if !self.authorized.allows(&event.message) {
                debug!(
                    sender_id = ?event.message.sender_id,
                    chat_id = event.message.chat_id,
                    "Dropping event from unauthorized sender"
                );
                continue;
            }
            return Ok(Some(event));
        }
    }
}
