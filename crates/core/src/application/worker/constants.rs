// Worker constants (no magic values)
use std::time::Duration;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 4;

/// Default per-job transfer deadline (90 minutes)
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(5400);

/// How long shutdown waits for worker loops before aborting them
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Status shown right after a job is accepted
pub const STATUS_IN_QUEUE: &str = "In queue";

/// Status shown when a worker claims the job
pub const STATUS_DOWNLOADING: &str = "Downloading...";

/// Status shown on timeout or transfer fault
pub const STATUS_ERROR: &str = "Error!";

/// Status shown when an operator aborts the job
pub const STATUS_CANCELLED: &str = "Cancelled";

/// strftime pattern of the completion status ("Finished at 14:05")
pub const FINISHED_AT_FORMAT: &str = "Finished at %H:%M";

/// Command that aborts every active download
pub const CANCEL_COMMAND: &str = "/cancel";

/// Reply to the cancel command
pub const ABORTED_NOTICE: &str = "All active downloads were aborted";

/// Fault category for a panic raised inside a transfer
pub const PANIC_FAULT_CATEGORY: &str = "Panic";
