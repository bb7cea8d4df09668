//! Per-attempt download error type for retry classification.

use std::fmt;
use std::path::PathBuf;

use crate::pin::{Fingerprint, ProbeError};

/// Error from one connection attempt (pin re-validation plus GET).
/// Classified before being turned into a `FetchError`.
#[derive(Debug)]
pub enum AttemptError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Server refused the resume offset (416) and the file is not complete;
    /// the destination has been reset so the next attempt starts at byte 0.
    RangeRejected { offset: u64 },
    /// Pin re-validation could not reach the host.
    Probe { host: String, source: ProbeError },
    /// Observed leaf certificate differs from the pin. Never retried.
    TrustViolation {
        host: String,
        expected: Fingerprint,
        observed: Fingerprint,
    },
    /// Destination file could not be opened or written. Not retried.
    Storage { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Curl(e) => write!(f, "{}", e),
            AttemptError::Http(code) => write!(f, "HTTP {}", code),
            AttemptError::RangeRejected { offset } => {
                write!(f, "server rejected resume offset {}", offset)
            }
            AttemptError::Probe { host, source } => write!(f, "pin probe of {}: {}", host, source),
            AttemptError::TrustViolation {
                host,
                expected,
                observed,
            } => write!(
                f,
                "pinned fingerprint mismatch for {}: expected {}, observed {}",
                host, expected, observed
            ),
            AttemptError::Storage { path, source } => {
                write!(f, "storage {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Curl(e) => Some(e),
            AttemptError::Probe { source, .. } => Some(source),
            AttemptError::Storage { source, .. } => Some(source),
            AttemptError::Http(_)
            | AttemptError::RangeRejected { .. }
            | AttemptError::TrustViolation { .. } => None,
        }
    }
}
