//! Supervision policy for failed fetches.

use std::future::Future;
use std::time::Duration;

use crate::HistoryError;

/// Retry a failing operation after a fixed delay.
///
/// The default retries forever every two seconds and does not distinguish
/// transient from permanent failures. Setting `max_attempts` bounds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds or the attempt cap is reached.
    ///
    /// Every failure is logged with the attempt number.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, HistoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HistoryError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(HistoryError::RetriesExhausted {
                            operation: what.to_string(),
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    tracing::warn!(
                        operation = what,
                        attempt,
                        error = %err,
                        delay_ms = self.delay.as_millis() as u64,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = quick(None)
            .run("flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(HistoryError::Node("unavailable".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_at_cap() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = quick(Some(3))
            .run("doomed", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HistoryError::Node("unknown account".into()))
            })
            .await;
        match result {
            Err(HistoryError::RetriesExhausted { attempts, operation, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(operation, "doomed");
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_needs_no_delay() {
        let policy = RetryPolicy {
            delay: Duration::from_secs(3600),
            max_attempts: None,
        };
        let value = policy.run("ok", || async { Ok::<_, HistoryError>("done") }).await;
        assert_eq!(value.unwrap(), "done");
    }
}
