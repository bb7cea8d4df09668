//! Error taxonomy for the fetch pipeline.
//!
//! Every fatal condition carries enough context (host, member, attempt count,
//! path) to diagnose without re-running.

use std::path::PathBuf;

use crate::pin::ProbeError;
use crate::retry::AttemptError;

/// Errors returned by the download, verification and extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The leaf certificate presented by `host` does not match the pin. Never retried.
    #[error("pinned fingerprint mismatch for {host}: expected {expected}, observed {observed}")]
    TrustViolation {
        host: String,
        expected: String,
        observed: String,
    },

    /// The host could not be reached to validate the pin.
    #[error("cannot reach {host}")]
    Connectivity {
        host: String,
        #[source]
        source: ProbeError,
    },

    /// Every attempt failed with a retryable error; wraps the last one.
    #[error("download failed after {attempts} attempt(s)")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: AttemptError,
    },

    /// A non-retryable transfer failure other than an HTTP status.
    #[error("transfer failed on attempt {attempt}")]
    Transfer {
        attempt: u32,
        #[source]
        source: AttemptError,
    },

    /// The server answered with a status that retrying cannot fix.
    #[error("server returned HTTP {status}")]
    Http { status: u32 },

    /// Final size differs from the advertised size (strict size policy only).
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A member failed its checksum or could not be decompressed.
    #[error("corrupt archive member {member}: {reason}")]
    CorruptMember { member: String, reason: String },

    /// The archive's central directory could not be read.
    #[error("cannot read archive {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    /// Filesystem failure on a specific path.
    #[error("{}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the trust-violation variant (callers may want to alert on it).
    pub fn is_trust_violation(&self) -> bool {
        matches!(self, FetchError::TrustViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
