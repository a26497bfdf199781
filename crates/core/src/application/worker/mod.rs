// Worker Pool - N long-lived loops: dequeue -> execute -> report

pub mod cancel;
pub mod constants;
mod panic_guard;
mod registry;
mod stats;

use constants::*;
pub use cancel::{cancel_channel, CancelHandle, CancelToken};
pub use panic_guard::{execute_guarded_async, panic_message, PanicGuardResult};
pub use registry::ExecutionRegistry;
pub use stats::{PoolSnapshot, PoolStats};

use crate::application::executor::JobExecutor;
use crate::application::queue::JobQueue;
use crate::domain::{DownloadError, Job, JobState, MessageRef, TransferFault};
use crate::port::StatusSink;
use crate::error::{AppError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Stable worker identity ("worker-0".."worker-(N-1)")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// One worker loop
struct Worker {
    id: WorkerId,
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    registry: Arc<ExecutionRegistry>,
    stats: Arc<PoolStats>,
}

impl Worker {
    /// Run worker loop until shutdown
    async fn run(self, mut shutdown: CancelToken) {
        info!(worker = %self.id, "Worker started");
        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(worker = %self.id, "Worker interrupted while idle");
                    break;
                }
                job = self.queue.dequeue() => job,
            };
            self.process(job, &shutdown).await;
        }
        info!(worker = %self.id, "Worker stopped");
    }

    /// Execute one job inside its own task so a panic cannot take the loop down
    async fn process(&self, mut job: Job, shutdown: &CancelToken) -> JobState {
        let job_id = job.id.clone();
        let (handle, token) = cancel_channel();
        self.registry.register(self.id, handle);
        if shutdown.is_cancelled() {
            // Claimed after shutdown began; unwind right away
            self.registry.cancel(self.id);
        }

        info!(worker = %self.id, job_id = %job_id, "Processing job");
        let status = job.status.clone();
        let message = job.source.message.clone();
        let executor = Arc::clone(&self.executor);
        let execution = tokio::spawn(async move { executor.execute(&mut job, token).await });
        let result = execution.await;

        self.registry.release(self.id);

        let state = match result {
            Ok(state) => state,
            Err(join_err) if join_err.is_panic() => {
                let panic_msg = panic_message(join_err.into_panic().as_ref());
                error!(worker = %self.id, job_id = %job_id, panic_msg = %panic_msg, "Job panicked");
                self.report_panic(&status, &message, panic_msg).await;
                JobState::Failed
            }
            Err(join_err) => {
                error!(worker = %self.id, job_id = %job_id, error = ?join_err, "Job task aborted");
                JobState::Failed
            }
        };
        self.stats.record(state);
        self.queue.mark_done();
        info!(worker = %self.id, job_id = %job_id, state = %state, "Job finished");
        state
    }

    /// Terminal status for a job whose execution task died mid-flight
    async fn report_panic(&self, status: &StatusSink, message: &MessageRef, panic_msg: String) {
        let notice =
            DownloadError::Transfer(TransferFault::new(PANIC_FAULT_CATEGORY, panic_msg)).notification();
        let report = async {
            status.push(STATUS_ERROR).await;
            if let Some(text) = notice {
                status.notify(message, &text).await;
            }
        };
        if let PanicGuardResult::Panicked(msg) = execute_guarded_async(report).await {
            error!(worker = %self.id, panic_msg = %msg, "Could not report panicked job");
        }
    }
}

/// Fixed-size pool of worker loops sharing one `JobQueue`
pub struct WorkerPool {
    size: usize,
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    registry: Arc<ExecutionRegistry>,
    stats: Arc<PoolStats>,
    shutdown_tx: CancelHandle,
    shutdown_rx: CancelToken,
    started: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool of `size` workers (not yet running)
    pub fn new(size: usize, queue: Arc<JobQueue>, executor: Arc<JobExecutor>) -> Self {
        let (shutdown_tx, shutdown_rx) = cancel_channel();
        Self {
            size,
            queue,
            executor,
            registry: Arc::new(ExecutionRegistry::new()),
            stats: Arc::new(PoolStats::default()),
            shutdown_tx,
            shutdown_rx,
            started: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Spawn the N worker loops. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self.size == 0 {
            return Err(AppError::Config("worker count must be at least 1".to_string()));
        }
        if self.shutdown_rx.is_cancelled() {
            return Err(AppError::InvalidState("worker pool is shut down".to_string()));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::InvalidState("worker pool already started".to_string()));
        }

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        for i in 0..self.size {
            let worker = Worker {
                id: WorkerId(i),
                queue: Arc::clone(&self.queue),
                executor: Arc::clone(&self.executor),
                registry: Arc::clone(&self.registry),
                stats: Arc::clone(&self.stats),
            };
            handles.push(tokio::spawn(worker.run(self.shutdown_rx.clone())));
        }
        info!(
            workers = self.size,
            timeout_secs = self.executor.timeout().as_secs(),
            "Worker pool started"
        );
        Ok(())
    }

    /// Cancel every execution in flight right now.
    ///
    /// Worker loops survive and pick up the next queued job; queued jobs are
    /// left untouched. Returns the number of executions signalled.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.registry.cancel_all();
        info!(
            cancelled,
            pending = self.queue.pending(),
            "Aborted all active downloads"
        );
        cancelled
    }

    /// Cancel active executions and stop all worker loops.
    ///
    /// Loops that do not stop within the grace period are aborted.
    pub async fn shutdown(&self) {
        info!("Worker pool shutting down");
        self.shutdown_tx.cancel();
        self.registry.cancel_all();

        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));
        for mut handle in handles {
            if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, &mut handle)
                .await
                .is_err()
            {
                warn!("Worker did not stop within grace period, aborting");
                handle.abort();
            }
        }
        info!(snapshot = ?self.snapshot(), "Worker pool stopped");
    }

    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::new(
            self.size,
            self.registry.active_count(),
            self.queue.pending(),
            &self.stats,
        )
    }
}
