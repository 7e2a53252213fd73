use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0} cancelled")]
    Cancelled(String),

    #[error("{what} timed out after {limit:?}")]
    Timeout { what: String, limit: Duration },

    #[error("{0} is not installed or not in PATH")]
    ToolMissing(String),

    #[error("failed to start command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Exited(ExitStatus),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True for failures caused by the invocation context rather than the work itself.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CoreError::Cancelled(_) | CoreError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
