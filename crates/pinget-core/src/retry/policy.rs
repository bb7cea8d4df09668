use std::time::Duration;

/// High-level classification of an attempt failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/low-speed).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, truncated body, etc.).
    Connection,
    /// TLS handshake failure unrelated to pinning.
    Tls,
    /// HTTP status that is retryable but not strictly throttling (408, 5xx).
    Http5xx(u16),
    /// Resume offset rejected; next attempt restarts from zero.
    StaleRange,
    /// Pin mismatch, storage failure, or any other non-retryable error.
    Fatal,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded retry with linear backoff: the wait after failed attempt `n` is
/// `backoff_factor * n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). At least 1.
    pub max_attempts: u32,
    /// Backoff unit; multiplied by the 1-based attempt number.
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff_factor: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Policy from the config form (seconds as float). Non-finite or negative
    /// factors are clamped to zero; `validate` on the config rejects them first.
    pub fn from_secs(max_attempts: u32, backoff_factor_secs: f64) -> Self {
        let secs = if backoff_factor_secs.is_finite() && backoff_factor_secs > 0.0 {
            backoff_factor_secs
        } else {
            0.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            backoff_factor: Duration::from_secs_f64(secs),
        }
    }

    /// Backoff after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_factor.saturating_mul(attempt)
    }

    /// Decide what to do after attempt `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if kind == ErrorKind::Fatal || attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }
}
