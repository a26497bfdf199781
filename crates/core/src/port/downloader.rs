// Media Downloader Port
// Abstraction over the chat client's media transfer primitive

use crate::domain::{MediaInfo, TransferFault};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Raw progress callback: `(current_bytes, total_bytes)`
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Media downloader collaborator
///
/// The returned future is the cancellable execution handle: dropping it
/// aborts the transfer.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `media` to `destination`, reporting progress through `progress`
    ///
    /// # Errors
    /// - `TransferFault` for any fault raised by the transfer
    async fn download(
        &self,
        media: &MediaInfo,
        destination: &Path,
        progress: ProgressFn,
    ) -> Result<(), TransferFault>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted downloader behavior
    #[derive(Debug, Clone)]
    pub enum TransferBehavior {
        /// Report each progress pair, then succeed after `after`
        Complete {
            after: Duration,
            progress: Vec<(u64, u64)>,
        },
        /// Never settle
        Hang,
        /// Fail with a fault after `after`
        Fail {
            after: Duration,
            category: String,
            description: String,
        },
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    impl TransferBehavior {
        pub fn complete_after(after: Duration) -> Self {
            TransferBehavior::Complete {
                after,
                progress: Vec::new(),
            }
        }

        pub fn fail(category: impl Into<String>, description: impl Into<String>) -> Self {
            TransferBehavior::Fail {
                after: Duration::ZERO,
                category: category.into(),
                description: description.into(),
            }
        }
    }

    /// Decrements the active counter even when the transfer future is dropped
    struct ActiveGuard<'a>(&'a AtomicUsize);

    impl Drop for ActiveGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Mock downloader with per-location behaviors and concurrency accounting
    pub struct MockDownloader {
        default: TransferBehavior,
        by_location: Mutex<HashMap<String, TransferBehavior>>,
        started: Mutex<Vec<PathBuf>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        dropped: AtomicUsize,
    }

    impl MockDownloader {
        pub fn new(default: TransferBehavior) -> Self {
            Self {
                default,
                by_location: Mutex::new(HashMap::new()),
                started: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
            }
        }

        /// Override the behavior for one media location
        pub fn with_behavior(self, location: impl Into<String>, behavior: TransferBehavior) -> Self {
            self.by_location
                .lock()
                .unwrap()
                .insert(location.into(), behavior);
            self
        }

        /// Destinations in the order their transfers started
        pub fn started(&self) -> Vec<PathBuf> {
            self.started.lock().unwrap().clone()
        }

        pub fn active(&self) -> usize {
            self.active.load(Ordering::SeqCst)
        }

        /// Highest number of transfers ever running at once
        pub fn max_active(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }

        /// Transfers dropped before settling (timed out or cancelled)
        pub fn dropped(&self) -> usize {
            self.dropped.load(Ordering::SeqCst)
        }
    }

    /// Counts a transfer as dropped unless disarmed on settle
    struct DropTracker<'a> {
        counter: &'a AtomicUsize,
        armed: bool,
    }

    impl Drop for DropTracker<'_> {
        fn drop(&mut self) {
            if self.armed {
                self.counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl MediaDownloader for MockDownloader {
        async fn download(
            &self,
            media: &MediaInfo,
            destination: &Path,
            progress: ProgressFn,
        ) -> Result<(), TransferFault> {
            let behavior = self
                .by_location
                .lock()
                .unwrap()
                .get(&media.location)
                .cloned()
                .unwrap_or_else(|| self.default.clone());

            self.started.lock().unwrap().push(destination.to_path_buf());
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            let _active = ActiveGuard(&self.active);
            let mut tracker = DropTracker {
                counter: &self.dropped,
                armed: true,
            };

            let result = match behavior {
                TransferBehavior::Complete { after, progress: steps } => {
                    for (current, total) in steps {
                        progress(current, total);
                        tokio::task::yield_now().await;
                    }
                    tokio::time::sleep(after).await;
                    Ok(())
                }
                TransferBehavior::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
                TransferBehavior::Fail {
                    after,
                    category,
                    description,
                } => {
                    tokio::time::sleep(after).await;
                    Err(TransferFault::new(category, description))
                }
                TransferBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            };
            tracker.armed = false;
            result
        }
    }
}
