//! Service-level error taxonomy.

use thiserror::Error;

/// Errors that end the process.
///
/// Once the loop is running, broker failures are handled by reconnecting
/// and per-record failures stay inside the loop; what remains fatal is a
/// bad configuration or a failed initial connect.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("broker error: {0}")]
    Broker(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, AppError>;
