// Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::filename::sanitize_file_name;
use crate::port::conversation::StatusSink;
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4 in production)
pub type JobId = String;

/// Job State
///
/// `Queued -> Downloading -> {Succeeded | TimedOut | Failed | Cancelled}`.
/// Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Downloading,
    Succeeded,
    TimedOut,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::TimedOut | JobState::Failed | JobState::Cancelled
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::Downloading => write!(f, "DOWNLOADING"),
            JobState::Succeeded => write!(f, "SUCCEEDED"),
            JobState::TimedOut => write!(f, "TIMED_OUT"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Reference to one inbound chat message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
    #[serde(default)]
    pub sender_id: Option<i64>,
}

/// Kind of media attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Document,
    Video,
    Audio,
    Photo,
    Other,
}

impl MediaKind {
    /// Only documents and videos are queued for download
    pub fn is_downloadable(&self) -> bool {
        matches!(self, MediaKind::Document | MediaKind::Video)
    }
}

/// Media payload metadata as delivered by the event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub kind: MediaKind,
    /// Opaque handle the downloader uses to fetch the bytes
    pub location: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Inbound event: a new message with optional media, or a text command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub message: MessageRef,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<MediaInfo>,
}

impl InboundEvent {
    pub fn has_downloadable_media(&self) -> bool {
        self.media
            .as_ref()
            .map(|m| m.kind.is_downloadable())
            .unwrap_or(false)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.media.as_ref()?.file_name.as_deref()
    }

    /// Trimmed command text, if the event carries one
    pub fn command(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim)
    }
}

/// What a job downloads: the originating message plus its media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSource {
    pub message: MessageRef,
    pub media: MediaInfo,
    /// Sanitized destination file name
    pub file_name: String,
}

impl JobSource {
    /// Extract a job source from an event carrying downloadable media
    pub fn from_event(event: &InboundEvent) -> Result<Self> {
        let media = match &event.media {
            Some(m) if m.kind.is_downloadable() => m.clone(),
            Some(m) => {
                return Err(DomainError::MalformedEvent(format!(
                    "media kind {:?} is not downloadable",
                    m.kind
                )))
            }
            None => return Err(DomainError::MalformedEvent("no media".to_string())),
        };
        let raw = media
            .file_name
            .as_deref()
            .ok_or_else(|| DomainError::MalformedEvent("media has no file name".to_string()))?;
        let file_name = sanitize_file_name(raw).ok_or_else(|| {
            DomainError::MalformedEvent(format!("unusable file name: {raw:?}"))
        })?;

        Ok(Self {
            message: event.message.clone(),
            media,
            file_name,
        })
    }
}

/// One queued-to-completion download request
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub source: JobSource,
    /// In-place editable status message for this job
    pub status: StatusSink,
    pub state: JobState,

    pub enqueued_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl Job {
    /// Create a new queued job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `enqueued_at` - Timestamp in epoch ms (injected, not system time)
    /// * `source` - Message and media to download
    /// * `status` - Status sink already showing the initial status
    pub fn new(
        id: impl Into<String>,
        enqueued_at: i64,
        source: JobSource,
        status: StatusSink,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            status,
            state: JobState::Queued,
            enqueued_at,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.source.file_name
    }

    /// Transition to Downloading with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.state != JobState::Queued {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Downloading.to_string(),
            });
        }
        self.state = JobState::Downloading;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to a terminal state with explicit timestamp
    pub fn finish(&mut self, terminal: JobState, now_millis: i64) -> Result<()> {
        if self.state != JobState::Downloading || !terminal.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: terminal.to_string(),
            });
        }
        self.state = terminal;
        self.finished_at = Some(now_millis);
        Ok(())
    }
}
