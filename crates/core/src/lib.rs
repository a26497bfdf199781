// mediaq Core - Job queue, worker pool & ports
// NO infrastructure dependencies (hexagonal architecture)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::PoolConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
