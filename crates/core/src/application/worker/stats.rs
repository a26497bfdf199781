// Terminal-state counters for the pool

use crate::domain::JobState;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct PoolStats {
    succeeded: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl PoolStats {
    pub fn record(&self, state: JobState) {
        let counter = match state {
            JobState::Succeeded => &self.succeeded,
            JobState::TimedOut => &self.timed_out,
            JobState::Failed => &self.failed,
            JobState::Cancelled => &self.cancelled,
            JobState::Queued | JobState::Downloading => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub workers: usize,
    pub active: usize,
    pub pending: usize,
    pub succeeded: u64,
    pub timed_out: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl PoolSnapshot {
    pub(crate) fn new(workers: usize, active: usize, pending: usize, stats: &PoolStats) -> Self {
        Self {
            workers,
            active,
            pending,
            succeeded: stats.succeeded.load(Ordering::Relaxed),
            timed_out: stats.timed_out.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            cancelled: stats.cancelled.load(Ordering::Relaxed),
        }
    }

    /// Jobs that reached any terminal state
    pub fn finished(&self) -> u64 {
        self.succeeded + self.timed_out + self.failed + self.cancelled
    }
}
