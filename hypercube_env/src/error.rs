//! Error types for the hypercube environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A polled condition did not hold before its deadline
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The concurrency limiter was closed while a caller waited for a slot
    #[error("Concurrency limiter closed")]
    LimiterClosed,

    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),
}

impl EnvError {
    /// Creates a timeout error from a duration.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout(after.as_millis() as u64)
    }

    /// Creates a context error.
    pub fn context(msg: impl Into<String>) -> Self {
        Self::ContextError(msg.into())
    }
}
