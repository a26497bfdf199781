// Registry of in-flight executions, keyed by worker

use super::cancel::CancelHandle;
use super::WorkerId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Active, individually cancellable executions
#[derive(Default)]
pub struct ExecutionRegistry {
    active: Mutex<HashMap<WorkerId, CancelHandle>>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WorkerId, CancelHandle>> {
        // A poisoned map is still consistent: entries are inserted/removed whole
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind an execution's cancel handle to `worker`
    pub fn register(&self, worker: WorkerId, handle: CancelHandle) {
        self.lock().insert(worker, handle);
    }

    /// Forget `worker`'s execution once it has unwound
    pub fn release(&self, worker: WorkerId) {
        self.lock().remove(&worker);
    }

    /// Cancel the execution bound to `worker`, if any
    pub fn cancel(&self, worker: WorkerId) -> bool {
        match self.lock().get(&worker) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered execution; returns how many were signalled
    pub fn cancel_all(&self) -> usize {
        let active = self.lock();
        for (worker, handle) in active.iter() {
            debug!(worker = %worker, "Cancelling execution");
            handle.cancel();
        }
        active.len()
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::super::cancel::cancel_channel;
    use super::*;

    #[test]
    fn test_cancel_all_signals_only_registered() {
        let registry = ExecutionRegistry::new();
        let (h0, t0) = cancel_channel();
        let (h1, t1) = cancel_channel();
        let (_h2, t2) = cancel_channel();
        registry.register(WorkerId(0), h0);
        registry.register(WorkerId(1), h1);

        assert_eq!(registry.active_count(), 2);
        assert_eq!(registry.cancel_all(), 2);
        assert!(t0.is_cancelled());
        assert!(t1.is_cancelled());
        assert!(!t2.is_cancelled());
    }

    #[test]
    fn test_release_removes_entry() {
        let registry = ExecutionRegistry::new();
        let (h0, t0) = cancel_channel();
        registry.register(WorkerId(0), h0);
        registry.release(WorkerId(0));

        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.cancel_all(), 0);
        assert!(!t0.is_cancelled());
    }

    #[test]
    fn test_cancel_single_worker() {
        let registry = ExecutionRegistry::new();
        let (h0, t0) = cancel_channel();
        let (h1, t1) = cancel_channel();
        registry.register(WorkerId(0), h0);
        registry.register(WorkerId(1), h1);

        assert!(registry.cancel(WorkerId(1)));
        assert!(!registry.cancel(WorkerId(2)));
        assert!(!t0.is_cancelled());
        assert!(t1.is_cancelled());
    }
}
