// Worker pool configuration

use crate::application::worker::constants::{DEFAULT_JOB_TIMEOUT, DEFAULT_WORKERS};
use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Settings passed into `WorkerPool` and `JobExecutor` construction
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers (N >= 1)
    pub workers: usize,
    /// Deadline for a single job's transfer
    pub job_timeout: Duration,
    /// Directory downloaded files are written to
    pub download_dir: PathBuf,
}

impl PoolConfig {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            download_dir: download_dir.into(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_job_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(AppError::Config("worker count must be at least 1".to_string()));
        }
        if self.job_timeout.is_zero() {
            return Err(AppError::Config("job timeout must be positive".to_string()));
        }
        if self.download_dir.as_os_str().is_empty() {
            return Err(AppError::Config("download directory is empty".to_string()));
        }
        Ok(())
    }
}
