// Filesystem-backed media downloader
// Implements: MediaDownloader over local file paths
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use mediaq_core::domain::{MediaInfo, TransferFault};
use mediaq_core::port::{MediaDownloader, ProgressFn};

/// Copy buffer size (64 KiB)
const CHUNK_SIZE: usize = 64 * 1024;

/// Treats `MediaInfo::location` as a local file path and copies it to the
/// destination, reporting `(copied, total)` after every chunk.
///
/// Bytes land in `<destination>.part` and are renamed into place once the
/// copy completes. A cancelled or failed transfer leaves neither the final
/// file nor the part file behind.
#[derive(Debug, Default)]
pub struct LocalFileDownloader;

impl LocalFileDownloader {
    pub fn new() -> Self {
        Self
    }

    fn part_path(destination: &Path) -> PathBuf {
        let mut name = destination.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }
}

/// Removes an unfinished `.part` file on failure, timeout or cancellation
struct PartFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed unfinished part file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not remove part file"),
        }
    }
}

#[async_trait]
impl MediaDownloader for LocalFileDownloader {
    async fn download(
        &self,
        media: &MediaInfo,
        destination: &Path,
        progress: ProgressFn,
    ) -> Result<(), TransferFault> {
        let io = |e: std::io::Error| TransferFault::io(&e);

        let mut source = File::open(&media.location).await.map_err(io)?;
        let total = source.metadata().await.map_err(io)?.len();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(io)?;
        }
        let part = Self::part_path(destination);
        let mut out = File::create(&part).await.map_err(io)?;
        let mut part_guard = PartFileGuard::new(part.clone());

        debug!(
            source = %media.location,
            destination = %destination.display(),
            total,
            "Copying local media"
        );

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut copied: u64 = 0;
        progress(copied, total);
        loop {
            let n = source.read(&mut buf).await.map_err(io)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).await.map_err(io)?;
            copied += n as u64;
            progress(copied, total);
        }
        out.flush().await.map_err(io)?;
        out.sync_all().await.map_err(io)?;
        drop(out);

        fs::rename(&part, destination).await.map_err(io)?;
        part_guard.disarm();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaq_core::domain::MediaKind;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    fn media(location: &Path) -> MediaInfo {
        MediaInfo {
            kind: MediaKind::Document,
            location: location.to_string_lossy().into_owned(),
            file_name: Some("out.bin".to_string()),
            size: None,
        }
    }

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<(u64, u64)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let progress: ProgressFn = Arc::new(move |c, t| sink.lock().unwrap().push((c, t)));
        (progress, calls)
    }

    #[tokio::test]
    async fn test_copies_file_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        std::fs::write(&src, &data).unwrap();
        let dest = dir.path().join("downloads").join("out.bin");

        let (progress, calls) = recorder();
        LocalFileDownloader::new()
            .download(&media(&src), &dest, progress)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), data);
        assert!(!LocalFileDownloader::part_path(&dest).exists());

        let calls = calls.lock().unwrap();
        let total = data.len() as u64;
        assert_eq!(calls.first(), Some(&(0, total)));
        assert_eq!(calls.last(), Some(&(total, total)));
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[tokio::test]
    async fn test_missing_source_is_io_fault() {
        let dir = tempfile::tempdir().unwrap();
        let (progress, _) = recorder();
        let err = LocalFileDownloader::new()
            .download(
                &media(&dir.path().join("nope.bin")),
                &dir.path().join("out.bin"),
                progress,
            )
            .await
            .unwrap_err();

        assert_eq!(err.category, "IOError");
        assert!(!dir.path().join("out.bin").exists());
    }

    #[tokio::test]
    async fn test_read_failure_after_create_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        // Opening a directory succeeds on unix; reading it fails
        let src = dir.path().join("not-a-file");
        std::fs::create_dir(&src).unwrap();
        let dest = dir.path().join("out.bin");

        let (progress, _) = recorder();
        let err = LocalFileDownloader::new()
            .download(&media(&src), &dest, progress)
            .await
            .unwrap_err();

        assert_eq!(err.category, "IOError");
        assert!(!dest.exists());
        assert!(!LocalFileDownloader::part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_dropped_transfer_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("big.bin");
        std::fs::write(&src, vec![1u8; CHUNK_SIZE * 16]).unwrap();
        let dest = dir.path().join("out.bin");

        let first_chunk = Arc::new(Notify::new());
        let signal = Arc::clone(&first_chunk);
        let progress: ProgressFn = Arc::new(move |copied, _| {
            if copied > 0 {
                signal.notify_one();
            }
        });

        let downloader = LocalFileDownloader::new();
        let item = media(&src);
        tokio::select! {
            biased;
            _ = first_chunk.notified() => {}
            result = downloader.download(&item, &dest, progress) => {
                panic!("copy finished before it could be dropped: {:?}", result);
            }
        }

        assert!(!dest.exists());
        assert!(!LocalFileDownloader::part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty.bin");
        std::fs::write(&src, b"").unwrap();
        let dest = dir.path().join("out.bin");

        let (progress, calls) = recorder();
        LocalFileDownloader::new()
            .download(&media(&src), &dest, progress)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap().len(), 0);
        assert_eq!(*calls.lock().unwrap(), vec![(0, 0)]);
    }
}
