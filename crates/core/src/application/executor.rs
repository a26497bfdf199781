// Job Executor - runs one job's transfer against a deadline
//
// Exactly one terminal status push per job, plus at most one separate error
// notification (timeouts and transfer faults only).

use crate::application::worker::cancel::CancelToken;
use crate::application::worker::constants::*;
use crate::application::worker::{execute_guarded_async, PanicGuardResult};
use crate::config::PoolConfig;
use crate::domain::{DownloadError, Job, JobState, MessageRef, ProgressState, TransferFault};
use crate::port::{Conversation, MediaDownloader, ProgressFn, StatusSink, TimeProvider};
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct JobExecutor {
    downloader: Arc<dyn MediaDownloader>,
    conversation: Arc<dyn Conversation>,
    time_provider: Arc<dyn TimeProvider>,
    download_dir: PathBuf,
    timeout: Duration,
}

impl JobExecutor {
    pub fn new(
        config: &PoolConfig,
        downloader: Arc<dyn MediaDownloader>,
        conversation: Arc<dyn Conversation>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            downloader,
            conversation,
            time_provider,
            download_dir: config.download_dir.clone(),
            timeout: config.job_timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `job` to a terminal state and return that state.
    ///
    /// Never fails: every per-job fault ends up in the returned state and the
    /// job's status message.
    pub async fn execute(&self, job: &mut Job, mut cancel: CancelToken) -> JobState {
        if let Err(e) = job.start(self.time_provider.now_millis()) {
            error!(job_id = %job.id, error = %e, "Refusing to execute job");
            return job.state;
        }

        job.status.push(STATUS_DOWNLOADING).await;
        info!(
            job_id = %job.id,
            file_name = %job.file_name(),
            "Download started"
        );

        let started = Instant::now();
        let outcome = self.run_transfer(job, &mut cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let terminal = match &outcome {
            Ok(()) => JobState::Succeeded,
            Err(DownloadError::Timeout(_)) => JobState::TimedOut,
            Err(DownloadError::CancellationRequested) => JobState::Cancelled,
            Err(DownloadError::Transfer(_)) | Err(DownloadError::MalformedEvent(_)) => {
                JobState::Failed
            }
        };

        let now = self.time_provider.now();
        if let Err(e) = job.finish(terminal, now.timestamp_millis()) {
            error!(job_id = %job.id, error = %e, "Job already finished");
            return job.state;
        }

        match outcome {
            Ok(()) => {
                info!(
                    job_id = %job.id,
                    file_name = %job.file_name(),
                    elapsed_ms,
                    "Successfully downloaded"
                );
                let text = now.format(FINISHED_AT_FORMAT).to_string();
                job.status.push(&text).await;
            }
            Err(DownloadError::CancellationRequested) => {
                warn!(job_id = %job.id, file_name = %job.file_name(), elapsed_ms, "Download cancelled");
                job.status.push(STATUS_CANCELLED).await;
            }
            Err(err) => {
                match &err {
                    DownloadError::Timeout(limit) => warn!(
                        job_id = %job.id,
                        file_name = %job.file_name(),
                        timeout_secs = limit.as_secs(),
                        "Timeout reached"
                    ),
                    other => error!(
                        job_id = %job.id,
                        file_name = %job.file_name(),
                        error = %other,
                        "Download failed"
                    ),
                }
                job.status.push(STATUS_ERROR).await;
                if let Some(text) = err.notification() {
                    self.notify(&job.source.message, &text).await;
                }
            }
        }

        terminal
    }

    /// Race the transfer against the deadline and the cancel token,
    /// forwarding throttled progress to the status message meanwhile.
    async fn run_transfer(&self, job: &Job, cancel: &mut CancelToken) -> Result<(), DownloadError> {
        let destination = self.download_dir.join(job.file_name());

        let state = Arc::new(ProgressState::new());
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u32>();
        let progress: ProgressFn = Arc::new(move |current, total| {
            if let Some(pct) = state.accept(current, total) {
                let _ = progress_tx.send(pct);
            }
        });

        let transfer = execute_guarded_async(self.downloader.download(
            &job.source.media,
            &destination,
            progress,
        ));
        tokio::pin!(transfer);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        // Dropping `transfer` on any early return aborts it. A progress edit
        // still in flight is abandoned the same way, so the terminal push
        // that follows is always the last edit.
        let mut edit: Option<BoxFuture<'_, bool>> = None;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DownloadError::CancellationRequested),
                _ = &mut deadline => return Err(DownloadError::Timeout(self.timeout)),
                result = &mut transfer => {
                    return match result {
                        PanicGuardResult::Success(Ok(())) => Ok(()),
                        PanicGuardResult::Success(Err(fault)) => Err(DownloadError::Transfer(fault)),
                        PanicGuardResult::Panicked(msg) => Err(DownloadError::Transfer(
                            TransferFault::new(PANIC_FAULT_CATEGORY, msg),
                        )),
                    };
                }
                _ = async {
                    match edit.as_mut() {
                        Some(pending) => pending.await,
                        None => std::future::pending().await,
                    }
                }, if edit.is_some() => {
                    edit = None;
                }
                Some(pct) = progress_rx.recv(), if edit.is_none() => {
                    edit = Some(Self::push_progress(&job.status, pct));
                }
            }
        }
    }

    /// One progress edit, polled alongside the race instead of blocking it
    fn push_progress(status: &StatusSink, pct: u32) -> BoxFuture<'_, bool> {
        let text = format!("{}%", pct);
        Box::pin(async move { status.push(&text).await })
    }

    async fn notify(&self, to: &MessageRef, text: &str) {
        if let Err(e) = self.conversation.send_reply(to, text).await {
            warn!(
                chat_id = to.chat_id,
                message_id = to.message_id,
                error = %e,
                "Failed to send error notification"
            );
        }
    }
}
