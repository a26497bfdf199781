//! Daemon configuration: CLI flags with environment fallbacks

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mediaq_core::application::worker::constants::{DEFAULT_JOB_TIMEOUT, DEFAULT_WORKERS};
use mediaq_core::PoolConfig;
use mediaq_infra_local::AuthorizedSenders;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "mediaq")]
#[command(about = "Queue media downloads from chat messages", long_about = None)]
#[command(version)]
pub struct Settings {
    /// Directory downloaded files are written to (`~` is expanded)
    #[arg(long, env = "TG_DOWNLOAD_PATH")]
    pub download_path: String,

    /// Number of parallel downloads
    #[arg(long, env = "TG_MAX_PARALLEL", default_value_t = DEFAULT_WORKERS)]
    pub max_parallel: usize,

    /// Per-download timeout in seconds
    #[arg(long, env = "TG_DL_TIMEOUT", default_value_t = DEFAULT_JOB_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Comma-separated sender ids allowed to use the bot (empty = anyone)
    #[arg(long, env = "TG_AUTHORIZED_USER_ID")]
    pub authorized_users: Option<String>,

    /// Log output format on stderr
    #[arg(long, env = "MEDIAQ_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Also write daily-rotated JSON logs into this directory
    #[arg(long, env = "MEDIAQ_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn pool_config(&self) -> Result<PoolConfig> {
        let download_dir = PathBuf::from(shellexpand::tilde(&self.download_path).into_owned());
        let config = PoolConfig::new(download_dir)
            .with_workers(self.max_parallel)
            .with_job_timeout(Duration::from_secs(self.timeout_secs));
        config.validate().context("Invalid worker pool configuration")?;
        Ok(config)
    }

    pub fn authorized_senders(&self) -> Result<AuthorizedSenders> {
        let raw = self.authorized_users.as_deref().unwrap_or_default();
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .with_context(|| format!("Invalid authorized user id: {:?}", s))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AuthorizedSenders::new(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaq_core::domain::MessageRef;

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["mediaq"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv).unwrap()
    }

    fn from(sender: i64) -> MessageRef {
        MessageRef {
            chat_id: 1,
            message_id: 1,
            sender_id: Some(sender),
        }
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&["--download-path", "/srv/downloads"]);
        let config = settings.pool_config().unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.job_timeout, Duration::from_secs(5400));
        assert_eq!(config.download_dir, PathBuf::from("/srv/downloads"));
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert!(settings.log_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = parse(&[
            "--download-path",
            "/d",
            "--max-parallel",
            "2",
            "--timeout-secs",
            "30",
            "--log-format",
            "json",
        ]);
        let config = settings.pool_config().unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.job_timeout, Duration::from_secs(30));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let settings = parse(&["--download-path", "/d", "--max-parallel", "0"]);
        assert!(settings.pool_config().is_err());
    }

    #[test]
    fn test_tilde_expanded() {
        let settings = parse(&["--download-path", "~/dl"]);
        let config = settings.pool_config().unwrap();
        assert!(!config.download_dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_authorized_users() {
        let settings = parse(&["--download-path", "/d", "--authorized-users", "1, 2,,3"]);
        let senders = settings.authorized_senders().unwrap();
        assert!(senders.allows(&from(2)));
        assert!(!senders.allows(&from(4)));

        let anyone = parse(&["--download-path", "/d", "--authorized-users", ""]);
        assert!(anyone.authorized_senders().unwrap().allows(&from(4)));

        let bad = parse(&["--download-path", "/d", "--authorized-users", "1,abc"]);
        assert!(bad.authorized_senders().is_err());
    }
}
