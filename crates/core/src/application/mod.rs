// Application Layer - queue, execution, worker pool, ingest

pub mod executor;
pub mod ingest;
pub mod queue;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use executor::JobExecutor;
pub use ingest::{IngestHandler, IngestOutcome};
pub use queue::JobQueue;
pub use worker::{PoolSnapshot, WorkerId, WorkerPool};
