//! Per-invocation cancellation and deadline.
//!
//! Every blocking step of an upload (hostname resolution, the `twine` subprocess) runs
//! through [`InvocationContext::guard`], so a cancelled or expired invocation surfaces an
//! error instead of hanging.

use crate::error::{CoreError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancellation token plus an optional deadline shared by all steps of one invocation.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole invocation by `timeout`, measured from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Use a caller-owned token so the caller can abort the invocation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut` unless the context is cancelled or its deadline passes first.
    ///
    /// `what` names the operation in the resulting error message.
    pub async fn guard<F, T>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled(what.to_string()));
        }

        let bounded = async {
            match (self.deadline, self.timeout) {
                (Some(deadline), Some(limit)) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| CoreError::Timeout {
                        what: what.to_string(),
                        limit,
                    }),
                _ => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(operation = %what, "Invocation cancelled");
                Err(CoreError::Cancelled(what.to_string()))
            }
            result = bounded => result,
        }
    }
}
