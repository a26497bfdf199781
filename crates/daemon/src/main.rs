//! mediaq - Main Entry Point
//! Reads chat events as JSON lines on stdin, writes replies as JSON lines on stdout

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};

use mediaq_core::application::{IngestHandler, JobExecutor, JobQueue, WorkerPool};
use mediaq_core::port::id_provider::UuidProvider;
use mediaq_core::port::time_provider::SystemTimeProvider;
use mediaq_core::port::{Conversation, MediaDownloader, TimeProvider};
use mediaq_core::VERSION;
use mediaq_infra_local::{ConsoleConversation, JsonLinesEventSource, LocalFileDownloader};

use config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = Settings::parse();

    // 2. Initialize logging
    let _log_guard = logging::init(settings.log_format, settings.log_dir.as_deref())?;
    info!("mediaq v{} starting...", VERSION);

    let config = settings.pool_config()?;
    let authorized = settings.authorized_senders()?;
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("Cannot create {}", config.download_dir.display()))?;
    info!(
        download_dir = %config.download_dir.display(),
        workers = config.workers,
        timeout_secs = config.job_timeout.as_secs(),
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let conversation: Arc<dyn Conversation> = Arc::new(ConsoleConversation::stdout());
    let downloader: Arc<dyn MediaDownloader> = Arc::new(LocalFileDownloader::new());

    let executor = Arc::new(JobExecutor::new(
        &config,
        downloader,
        conversation.clone(),
        time_provider.clone(),
    ));
    let queue = Arc::new(JobQueue::new());
    let pool = Arc::new(WorkerPool::new(config.workers, queue.clone(), executor));

    // 4. Start workers
    pool.start()?;

    let ingest = IngestHandler::new(
        pool.clone(),
        conversation,
        Arc::new(UuidProvider),
        time_provider,
    );
    let mut events = JsonLinesEventSource::new(BufReader::new(tokio::io::stdin()), authorized);

    info!("System ready. Waiting for events on stdin");
    info!("Press Ctrl+C to shutdown");

    // 5. Event loop
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully...");
                break;
            }
            next = events.next_event() => match next {
                Ok(Some(event)) => {
                    ingest.handle(event).await;
                }
                Ok(None) => {
                    info!(unfinished = queue.unfinished(), "Event stream closed, finishing queued downloads");
                    tokio::select! {
                        _ = queue.wait_drained() => {}
                        _ = tokio::signal::ctrl_c() => {
                            info!("Shutdown signal received while draining");
                        }
                    }
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Event stream failed");
                    break;
                }
            }
        }
    }

    // 6. Graceful shutdown
    pool.shutdown().await;
    info!("Shutdown complete.");

    Ok(())
}
