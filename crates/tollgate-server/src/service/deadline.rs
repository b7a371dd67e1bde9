use std::future::Future;
use std::time::Duration;

use crate::handler::{ErrorKind, Result};

/// Tracing target for expired store deadlines.
const TRACING_TARGET_DEADLINE: &str = "tollgate_server::service::deadline";

/// Upper bound on a single store or cache call.
///
/// An expired deadline drops the pending call and surfaces as
/// [`ErrorKind::Cancelled`], so the operation stops at that step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Duration);

impl Deadline {
    /// Creates a deadline of `timeout` per call.
    #[inline]
    pub const fn new(timeout: Duration) -> Self {
        Self(timeout)
    }

    /// Returns the per-call timeout.
    #[inline]
    pub const fn timeout(&self) -> Duration {
        self.0
    }

    /// Runs `future` under the deadline.
    ///
    /// The outer `Result` reports expiry, the inner one is the store's own.
    pub async fn run<F>(&self, operation: &'static str, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        tokio::time::timeout(self.0, future).await.map_err(|_| {
            tracing::warn!(
                target: TRACING_TARGET_DEADLINE,
                operation,
                timeout_ms = self.0.as_millis() as u64,
                "store call exceeded its deadline"
            );

            ErrorKind::Cancelled.into_error()
        })
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_is_cancelled() {
        let deadline = Deadline::new(Duration::from_secs(1));
        let error = deadline
            .run("hang", std::future::pending::<()>())
            .await
            .expect_err("pending future must time out");

        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(error.resource(), None);
        assert_eq!(error.context(), None);
    }

    #[tokio::test]
    async fn completed_call_passes_through() -> anyhow::Result<()> {
        let deadline = Deadline::default();
        let value = deadline.run("ready", async { 7 }).await?;
        assert_eq!(value, 7);
        Ok(())
    }
}
