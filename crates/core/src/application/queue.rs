// Job Queue - unbounded FIFO shared by ingest (producers) and workers (consumers)
//
// No capacity limit: ingest never waits on workers. Backpressure is out of
// scope; the worker count is the only throttle.

use crate::domain::Job;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error};

/// Unbounded, ordered, multi-consumer job queue
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
    /// Enqueued, not yet claimed by a worker
    pending: AtomicUsize,
    /// Enqueued and not yet marked done
    unfinished: watch::Sender<usize>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (unfinished, _) = watch::channel(0);
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
            unfinished,
        }
    }

    /// Append a job. Never blocks.
    pub fn enqueue(&self, job: Job) {
        let job_id = job.id.clone();
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.unfinished.send_modify(|n| *n += 1);

        // The receiver lives as long as the queue, so this cannot fail in practice
        if let Err(e) = self.tx.send(job) {
            error!(job_id = %e.0.id, "Queue receiver closed, dropping job");
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.unfinished.send_modify(|n| *n = n.saturating_sub(1));
            return;
        }
        debug!(job_id = %job_id, pending = self.pending(), "Job enqueued");
    }

    /// Wait for the next job in insertion order.
    ///
    /// Each job is handed to exactly one caller. Cancel-safe: dropping the
    /// future while waiting loses nothing.
    pub async fn dequeue(&self) -> Job {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(job) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                job
            }
            // Sender is owned by self; the channel never closes while we exist
            None => std::future::pending().await,
        }
    }

    /// Signal that a dequeued job reached a terminal state
    pub fn mark_done(&self) {
        self.unfinished.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Jobs waiting for a worker
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Jobs queued or executing
    pub fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Resolve once every enqueued job has been marked done
    pub async fn wait_drained(&self) {
        let mut rx = self.unfinished.subscribe();
        // Sender is owned by self, so the channel stays open while we wait
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::make_job;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = JobQueue::new();
        for i in 0..10 {
            queue.enqueue(make_job(i));
        }
        assert_eq!(queue.pending(), 10);

        for i in 0..10 {
            let job = queue.dequeue().await;
            assert_eq!(job.id, format!("job-{}", i));
        }
        assert!(queue.is_empty());
        assert_eq!(queue.unfinished(), 10);
    }

    #[tokio::test]
    async fn test_dequeue_blocks_until_enqueue() {
        let queue = Arc::new(JobQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await.id })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.enqueue(make_job(7));
        let id = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, "job-7");
    }

    #[test]
    fn test_dropped_dequeue_loses_nothing() {
        let queue = JobQueue::new();
        {
            let mut waiting = tokio_test::task::spawn(queue.dequeue());
            tokio_test::assert_pending!(waiting.poll());
        }

        queue.enqueue(make_job(3));
        let mut next = tokio_test::task::spawn(queue.dequeue());
        let job = tokio_test::assert_ready!(next.poll());
        assert_eq!(job.id, "job-3");
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dequeue_delivers_exactly_once() {
        let queue = Arc::new(JobQueue::new());
        for i in 0..200 {
            queue.enqueue(make_job(i));
        }

        let mut consumers = JoinSet::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            consumers.spawn(async move {
                let mut seen = Vec::new();
                while !queue.is_empty() {
                    let dequeue = tokio::time::timeout(Duration::from_millis(50), queue.dequeue());
                    match dequeue.await {
                        Ok(job) => seen.push(job.id),
                        Err(_) => break,
                    }
                }
                seen
            });
        }

        let mut all = Vec::new();
        while let Some(result) = consumers.join_next().await {
            all.extend(result.unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 200, "every job delivered");
        assert_eq!(unique.len(), 200, "no job delivered twice");
    }

    #[tokio::test]
    async fn test_duplicate_sources_are_independent_jobs() {
        let queue = JobQueue::new();
        queue.enqueue(make_job(1));
        queue.enqueue(make_job(1));
        assert_eq!(queue.pending(), 2);
    }

    #[tokio::test]
    async fn test_wait_drained() {
        let queue = Arc::new(JobQueue::new());
        queue.wait_drained().await; // empty queue is drained

        queue.enqueue(make_job(1));
        queue.enqueue(make_job(2));

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.wait_drained().await })
        };

        let _ = queue.dequeue().await;
        queue.mark_done();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let _ = queue.dequeue().await;
        queue.mark_done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(queue.unfinished(), 0);
    }
}
