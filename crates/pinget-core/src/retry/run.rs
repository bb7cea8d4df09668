//! Retry loop: run a closure until success or policy says stop.

use std::time::Duration;

use super::classify;
use super::error::AttemptError;
use super::policy::{RetryDecision, RetryPolicy};

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryFailure {
    /// A non-retryable error; returned as soon as it happened.
    Fatal { attempt: u32, error: AttemptError },
    /// Every allowed attempt failed with a retryable error.
    Exhausted { attempts: u32, last: AttemptError },
}

/// Runs `f(attempt)` until it succeeds or the retry policy says to stop,
/// sleeping the backoff duration between attempts.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, f: F) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
{
    run_with_retry_sleeping(policy, std::thread::sleep, f)
}

/// Like `run_with_retry` with an injectable sleep.
pub fn run_with_retry_sleeping<T, F, S>(
    policy: &RetryPolicy,
    mut sleep: S,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            max_attempts = policy.max_attempts,
                            backoff_secs = d.as_secs_f64(),
                            "attempt failed: {}; retrying",
                            e
                        );
                        sleep(d);
                        attempt += 1;
                    }
                    RetryDecision::NoRetry if kind == super::ErrorKind::Fatal => {
                        return Err(RetryFailure::Fatal { attempt, error: e });
                    }
                    RetryDecision::NoRetry => {
                        return Err(RetryFailure::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                }
            }
        }
    }
}
