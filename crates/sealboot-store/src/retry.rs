use std::fmt;
use std::time::Duration;

use crate::RetryConfig;

/// Retry a closure with exponential backoff + jitter while `is_retryable`
/// accepts the error.
///
/// Gives up when `max_retries` is reached or when the next sleep would push
/// the total time spent waiting past `max_elapsed_ms`; the last error is
/// returned in both cases. Errors rejected by `is_retryable` are returned
/// immediately.
pub fn retry_with_backoff<T, E: fmt::Display>(
    config: &RetryConfig,
    op_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut f: impl FnMut() -> std::result::Result<T, E>,
) -> std::result::Result<T, E> {
    let mut delay_ms = config.retry_delay_ms;
    let mut waited_ms: u64 = 0;
    let mut attempt = 0usize;

    loop {
        let err = match f() {
            Ok(val) => return Ok(val),
            Err(e) => e,
        };
        if !is_retryable(&err) {
            return Err(err);
        }
        if attempt >= config.max_retries {
            tracing::warn!("{op_name}: giving up after {} attempts: {err}", attempt + 1);
            return Err(err);
        }

        let jitter = rand::random::<u64>() % delay_ms.max(1);
        let sleep_ms = delay_ms.saturating_add(jitter);
        if waited_ms.saturating_add(sleep_ms) > config.max_elapsed_ms {
            tracing::warn!(
                "{op_name}: backoff budget of {}ms exhausted after {} attempts: {err}",
                config.max_elapsed_ms,
                attempt + 1,
            );
            return Err(err);
        }

        attempt += 1;
        tracing::warn!(
            "{op_name}: transient error (attempt {attempt}/{}), retrying in {sleep_ms}ms: {err}",
            config.max_retries,
        );
        std::thread::sleep(Duration::from_millis(sleep_ms));
        waited_ms = waited_ms.saturating_add(sleep_ms);
        delay_ms = delay_ms.saturating_mul(2).min(config.retry_max_delay_ms);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn fast_config(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            retry_delay_ms: 0,
            retry_max_delay_ms: 0,
            max_elapsed_ms: 1_000,
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            &fast_config(5),
            "put",
            |_| true,
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("throttled".to_string())
                } else {
                    Ok(7)
                }
            },
        );
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn non_retryable_error_returns_immediately() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &fast_config(5),
            "put",
            |_| false,
            || {
                calls.set(calls.get() + 1);
                Err("access denied".to_string())
            },
        );
        assert_eq!(result.unwrap_err(), "access denied");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn stops_at_max_retries() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &fast_config(2),
            "put",
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err("throttled".to_string())
            },
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn stops_when_budget_is_exhausted() {
        let config = RetryConfig {
            max_retries: 100,
            retry_delay_ms: 20,
            retry_max_delay_ms: 20,
            max_elapsed_ms: 50,
        };
        let calls = Cell::new(0);
        let start = std::time::Instant::now();
        let result: Result<(), String> = retry_with_backoff(
            &config,
            "put",
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err("throttled".to_string())
            },
        );
        assert!(result.is_err());
        // Each sleep is at least 20ms, so at most two fit in 50ms.
        assert!(calls.get() <= 3, "made {} calls", calls.get());
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
