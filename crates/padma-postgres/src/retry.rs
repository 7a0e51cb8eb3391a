//! Retry logic for database operations.

use std::time::Duration;

use crate::{PgError, PgResult};

/// Configuration for retry behavior on failed operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means no retries)
    pub max_attempts: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            backoff_multiplier: 1.0,
        }
    }

    /// Set the maximum backoff duration.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the backoff duration for a given attempt number.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_millis = (self.initial_backoff.as_millis() as f64)
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_millis as u64);
        backoff.min(self.max_backoff)
    }

    /// Retry an async operation according to this configuration.
    ///
    /// Only errors classified transient by [`PgError::is_transient`] are
    /// retried; everything else fails immediately.
    ///
    /// # Example
    /// ```ignore
    /// let config = RetryConfig::default();
    /// let request = config.retry(|| async {
    ///     client.get_connection().await?.find_download_request(id).await
    /// }).await?;
    /// ```
    pub async fn retry<F, Fut, T>(&self, operation: F) -> PgResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = PgResult<T>>,
    {
        self.retry_if(operation, PgError::is_transient).await
    }

    /// Retry an async operation with a custom retry predicate.
    ///
    /// The predicate determines whether to retry based on the error. The
    /// orchestrator uses this to additionally retry when racing on the
    /// in-flight primary uniqueness constraint.
    pub async fn retry_if<F, Fut, T, P>(&self, mut operation: F, mut should_retry: P) -> PgResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = PgResult<T>>,
        P: FnMut(&PgError) -> bool,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !should_retry(&err) {
                        tracing::debug!(
                            target: crate::TRACING_TARGET_QUERY,
                            error = %err,
                            "Non-retryable error, failing immediately"
                        );
                        return Err(err);
                    }

                    last_error = Some(err);

                    // Don't sleep after the last attempt
                    if attempt < self.max_attempts {
                        let backoff = self.calculate_backoff(attempt);
                        tracing::debug!(
                            target: crate::TRACING_TARGET_QUERY,
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            backoff_ms = backoff.as_millis(),
                            "Retrying operation after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        // All retries exhausted
        Err(last_error
            .unwrap_or_else(|| PgError::Unexpected("All retry attempts exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use deadpool::managed::TimeoutType;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(100));
        assert_eq!(config.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_calculation() {
        let config = RetryConfig::default();

        assert_eq!(config.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(config.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(config.calculate_backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_max_backoff() {
        let config = RetryConfig::default().with_max_backoff(Duration::from_millis(300));

        assert_eq!(config.calculate_backoff(2), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_errors() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = config
            .retry(|| {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 3 {
                        Err(PgError::Timeout(TimeoutType::Wait))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_permanent_error_fails_immediately() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = config
            .retry(|| {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(PgError::Config("bad url".to_owned()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_if_custom_predicate() {
        let config = RetryConfig::new(2, Duration::from_millis(1));
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = config
            .retry_if(
                || {
                    let count = call_count_clone.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Err::<i32, _>(PgError::Unexpected("keep going".into()))
                    }
                },
                |_| true,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }
}
