use std::future::Future;
use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_parse_or};
use tracing::{debug, warn};

/// Startup readiness retry policy.
///
/// Dependencies such as the vector store and the embedding server usually
/// come up alongside this service, so startup checks are retried a fixed
/// number of times with a constant pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Pause between consecutive attempts in milliseconds
    pub backoff_ms: u64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_ms,
        }
    }

    /// Single attempt, no pause. Used by tests and one-shot tools.
    pub fn once() -> Self {
        Self::new(1, 0)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(30, 2000)
    }
}

impl FromEnv for RetryConfig {
    /// Reads RAG_STARTUP_ATTEMPTS and RAG_STARTUP_BACKOFF_MS
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self::new(
            env_parse_or("RAG_STARTUP_ATTEMPTS", defaults.max_attempts)?,
            env_parse_or("RAG_STARTUP_BACKOFF_MS", defaults.backoff_ms)?,
        ))
    }
}

/// Retry an async operation with a fixed pause between attempts.
///
/// Returns the first success, or the error of the last attempt once
/// `max_attempts` is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    what: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} attempts", what, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt >= config.max_attempts => {
                warn!("{} failed after {} attempts: {}", what, attempt, e);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                    what, attempt, config.max_attempts, e, config.backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(config.backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let result: Result<u32, String> =
            retry_with_backoff("operation", RetryConfig::new(3, 10), || async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<u32, String> =
            retry_with_backoff("operation", RetryConfig::new(5, 2000), || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err("not yet".to_string())
                    } else {
                        Ok(count)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<u32, String> =
            retry_with_backoff("operation", RetryConfig::new(4, 2000), || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryConfig::new(0, 5).max_attempts, 1);
    }

    #[test]
    fn test_retry_config_from_env() {
        temp_env::with_vars(
            [
                ("RAG_STARTUP_ATTEMPTS", Some("5")),
                ("RAG_STARTUP_BACKOFF_MS", None::<&str>),
            ],
            || {
                let config = RetryConfig::from_env().unwrap();
                assert_eq!(config, RetryConfig::new(5, 2000));
            },
        );
    }
}
