//! Retry and backoff policy.
//!
//! Classifies attempt failures (timeouts, throttling, connection and TLS
//! failures, pin mismatches) and applies bounded linear backoff. There is no
//! unbounded retry anywhere in the crate.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::AttemptError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, run_with_retry_sleeping, RetryFailure};
