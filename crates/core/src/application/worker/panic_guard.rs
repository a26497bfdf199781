// Panic isolation for worker safety
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Best-effort panic payload rendering
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Drive a future with panic isolation.
///
/// A panic raised while polling is caught and returned as
/// `PanicGuardResult::Panicked`; the caller keeps running. Dropping the
/// returned future drops the inner one, so cancellation still works.
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: std::future::Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Async worker task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guarded_async_success() {
        let result = execute_guarded_async(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            7
        })
        .await;
        assert!(matches!(result, PanicGuardResult::Success(7)));
    }

    #[tokio::test]
    async fn test_guarded_async_panic_after_await() {
        let result: PanicGuardResult<()> = execute_guarded_async(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            panic!("late {}", "panic");
        })
        .await;
        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "late panic"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
