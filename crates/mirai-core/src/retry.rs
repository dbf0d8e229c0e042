//! Retry envelope applied to every operation that touches the channel.
//!
//! | Failure class | Behavior |
//! |---------------|----------|
//! | [`ErrorClass::Connect`] | wait `connect_delay`, recover (reconnect), retry the same call |
//! | [`ErrorClass::Other`] during a retry sequence | wait `unexpected_delay`, retry |
//! | [`ErrorClass::Domain`] | returned to the caller untouched |
//! | everything else | logged and returned |
//!
//! After `max_attempts` the last error is returned; tearing the session down is
//! the caller's job.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{ApiResult, ErrorClass};

/// Bounded fixed-delay retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after a connect-class failure.
    pub connect_delay: Duration,
    /// Delay after an unexpected failure while already retrying.
    pub unexpected_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            connect_delay: Duration::from_secs(8),
            unexpected_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Runs `op` under this policy.
    ///
    /// `recover` is awaited before the next attempt whenever the previous one
    /// failed with a connect-class error. A failing recovery counts as a
    /// failed attempt.
    pub async fn run<T, Op, OpFut, Rec, RecFut>(
        &self,
        op_name: &str,
        mut op: Op,
        mut recover: Rec,
    ) -> ApiResult<T>
    where
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = ApiResult<T>>,
        Rec: FnMut() -> RecFut,
        RecFut: Future<Output = ApiResult<()>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut needs_recovery = false;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = if needs_recovery {
                match recover().await {
                    Ok(()) => {
                        needs_recovery = false;
                        op().await
                    }
                    Err(e) => Err(e),
                }
            } else {
                op().await
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let delay = match err.class() {
                ErrorClass::Connect => {
                    needs_recovery = true;
                    self.connect_delay
                }
                ErrorClass::Other if attempt > 1 => self.unexpected_delay,
                ErrorClass::Domain => return Err(err),
                class => {
                    error!(op = %op_name, ?class, error = %err, "Operation failed");
                    return Err(err);
                }
            };

            if attempt >= max_attempts {
                error!(
                    op = %op_name,
                    attempts = attempt,
                    error = %err,
                    "Retry attempts exhausted"
                );
                return Err(err);
            }

            warn!(
                op = %op_name,
                attempt = attempt,
                delay = ?delay,
                error = %err,
                "Operation failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Background-path handling of API results.
pub trait ApiResultExt<T> {
    /// Swallows domain errors with a warning, passing everything else through.
    ///
    /// Used where no caller is waiting on the result, e.g. inside listeners.
    fn or_log(self, context: &str) -> ApiResult<Option<T>>;
}

impl<T> ApiResultExt<T> for ApiResult<T> {
    fn or_log(self, context: &str) -> ApiResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_domain() => {
                warn!(context = %context, error = %err, "Command rejected by gateway");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{ApiError, TransportError};

    fn conn_err() -> ApiError {
        ApiError::Transport(TransportError::ConnectionFailed {
            url: "ws://localhost".into(),
            reason: "refused".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failures_retry_then_succeed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recoveries = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();

        let c = Arc::clone(&calls);
        let r = Arc::clone(&recoveries);
        let started = tokio::time::Instant::now();
        let result = policy
            .run(
                "test",
                || {
                    let c = Arc::clone(&c);
                    async move {
                        if c.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(conn_err())
                        } else {
                            Ok(42)
                        }
                    }
                },
                || {
                    let r = Arc::clone(&r);
                    async move {
                        r.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(recoveries.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let result: ApiResult<()> = RetryPolicy::default()
            .run(
                "test",
                || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Err(conn_err()) }
                },
                || async { Err(conn_err()) },
            )
            .await;

        assert!(matches!(result, Err(ApiError::Transport(_))));
        // Only the first attempt reaches `op`; later ones fail in recovery.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_domain_error_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let result: ApiResult<()> = RetryPolicy::default()
            .run(
                "mute",
                || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Err(ApiError::PermissionDenied("no permission".into())) }
                },
                || async { Ok(()) },
            )
            .await;

        assert!(matches!(result, Err(ApiError::PermissionDenied(m)) if m == "no permission"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_error_retried_only_inside_sequence() {
        // First attempt: unexpected error outside a sequence is surfaced at once.
        let result: ApiResult<()> = RetryPolicy::default()
            .run("op", || async { Err(ApiError::Timeout) }, || async { Ok(()) })
            .await;
        assert!(matches!(result, Err(ApiError::Timeout)));

        // Connect failure opens a sequence; a following timeout is retried.
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let result = RetryPolicy::default()
            .run(
                "op",
                || {
                    let n = c.fetch_add(1, Ordering::SeqCst);
                    async move {
                        match n {
                            0 => Err(conn_err()),
                            1 => Err(ApiError::Timeout),
                            _ => Ok("done"),
                        }
                    }
                },
                || async { Ok(()) },
            )
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_or_log() {
        let swallowed: ApiResult<u32> = Err(ApiError::BotMuted("muted".into()));
        assert!(matches!(swallowed.or_log("send"), Ok(None)));

        let fatal: ApiResult<u32> = Err(ApiError::Verify("bad key".into()));
        assert!(fatal.or_log("send").is_err());

        assert!(matches!(Ok::<_, ApiError>(1).or_log("send"), Ok(Some(1))));
    }
}
