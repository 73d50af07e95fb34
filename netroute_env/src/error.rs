//! Error types for the NetRoute environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Frame scheduling failed (no callback queued while work remains)
    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a scheduler error.
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::SchedulerError(msg.into())
    }
}
