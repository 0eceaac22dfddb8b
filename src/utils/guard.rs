//! Timeout and cancellation for collaborator calls.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Interrupted;

/// Bounds a single backend call by a deadline and a cancellation token.
#[derive(Debug, Clone)]
pub struct CallGuard {
    timeout: Duration,
    cancel: CancellationToken,
}

impl CallGuard {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Await `call`, converting an elapsed deadline or a fired token into
    /// the caller's error type.
    pub async fn run<T, E, Fut>(&self, call: Fut) -> Result<T, E>
    where
        E: Interrupted,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.cancel.is_cancelled() {
            return Err(E::cancelled());
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(E::cancelled()),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or_else(|_| Err(E::timed_out(self.timeout.as_secs())))
            }
        }
    }
}
