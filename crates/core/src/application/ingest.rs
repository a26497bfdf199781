// Ingest Handler - turns inbound events into queued jobs or pool-wide aborts

use crate::application::queue::JobQueue;
use crate::application::worker::constants::{ABORTED_NOTICE, CANCEL_COMMAND, STATUS_IN_QUEUE};
use crate::application::worker::WorkerPool;
use crate::domain::{InboundEvent, Job, JobId, JobSource};
use crate::port::{Conversation, IdProvider, StatusSink, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the handler did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A job was created and enqueued
    Queued(JobId),
    /// Cancel command handled; number of executions signalled
    CancelledAll(usize),
    /// Not a job and not a command (or a malformed one)
    Ignored,
}

pub struct IngestHandler {
    queue: Arc<JobQueue>,
    pool: Arc<WorkerPool>,
    conversation: Arc<dyn Conversation>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl IngestHandler {
    pub fn new(
        pool: Arc<WorkerPool>,
        conversation: Arc<dyn Conversation>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue: Arc::clone(pool.queue()),
            pool,
            conversation,
            id_provider,
            time_provider,
        }
    }

    /// Handle one inbound event. Never fails: anything that cannot become
    /// a job is dropped without a user-visible trace.
    pub async fn handle(&self, event: InboundEvent) -> IngestOutcome {
        if event.media.is_some() {
            return self.handle_media(&event).await;
        }
        if event.command() == Some(CANCEL_COMMAND) {
            return self.handle_cancel(&event).await;
        }
        IngestOutcome::Ignored
    }

    async fn handle_media(&self, event: &InboundEvent) -> IngestOutcome {
        let source = match JobSource::from_event(event) {
            Ok(source) => source,
            Err(e) => {
                debug!(
                    chat_id = event.message.chat_id,
                    message_id = event.message.message_id,
                    error = %e,
                    "Ignoring event"
                );
                return IngestOutcome::Ignored;
            }
        };

        let reply = match self
            .conversation
            .send_reply(&source.message, STATUS_IN_QUEUE)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    file_name = %source.file_name,
                    error = %e,
                    "Could not create status message, dropping request"
                );
                return IngestOutcome::Ignored;
            }
        };

        let job = Job::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            source,
            StatusSink::new(Arc::clone(&self.conversation), reply),
        );
        let job_id = job.id.clone();
        info!(
            job_id = %job_id,
            file_name = %job.file_name(),
            kind = ?job.source.media.kind,
            size = ?job.source.media.size,
            "Download queued"
        );
        self.queue.enqueue(job);
        IngestOutcome::Queued(job_id)
    }

    async fn handle_cancel(&self, event: &InboundEvent) -> IngestOutcome {
        let cancelled = self.pool.cancel_all();
        if let Err(e) = self
            .conversation
            .send_reply(&event.message, ABORTED_NOTICE)
            .await
        {
            warn!(error = %e, "Failed to confirm abort");
        }
        IngestOutcome::CancelledAll(cancelled)
    }
}
