//! Resumable download engine.
//!
//! Validates the leaf pin, probes size and range support, then runs bounded
//! attempts with linear backoff. Each attempt re-validates the pin, resumes
//! from the bytes on disk when the server supports ranges, and otherwise
//! restarts from byte 0. Only one call may target a given destination at a
//! time; concurrent calls on the same path corrupt the resumed range.

mod attempt;
mod state;

pub use state::{DownloadState, Target};

use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};
use crate::fetch_head::{self, HeadResult};
use crate::pin::{check_pin, Fingerprint, LeafProbe, PinCheck, TlsProbe};
use crate::progress::ProgressSink;
use crate::retry::{run_with_retry, AttemptError, RetryFailure, RetryPolicy};
use crate::storage;
use crate::transport::{PinnedTransport, TransportConfig};

use attempt::AttemptOutcome;

/// Default transfer chunk size (512 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// What to do when the final size differs from the advertised size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMismatchPolicy {
    /// Log a warning and return success.
    #[default]
    Warn,
    /// Return `FetchError::SizeMismatch`.
    Fail,
}

/// Everything one download call needs.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    /// Bytes buffered per write to the destination.
    pub chunk_size: usize,
    pub size_mismatch: SizeMismatchPolicy,
}

impl DownloadOptions {
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            size_mismatch: SizeMismatchPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts < 1 {
            return Err(FetchError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_factor.is_zero() {
            return Err(FetchError::InvalidConfig(
                "backoff factor must be positive".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(FetchError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Downloads `url` to `destination`, resuming any partial file already there.
/// Pins are checked with a real TLS probe. Returns the destination path.
pub fn download_with_resume(
    url: &str,
    destination: &Path,
    options: &DownloadOptions,
    progress: &mut dyn ProgressSink,
) -> Result<PathBuf> {
    let probe = TlsProbe::new(options.transport.probe_timeout);
    download_with_probe(url, destination, options, &probe, progress)
}

/// `download_with_resume` with a caller-supplied leaf prober.
pub fn download_with_probe<P: LeafProbe + ?Sized>(
    url: &str,
    destination: &Path,
    options: &DownloadOptions,
    probe: &P,
    progress: &mut dyn ProgressSink,
) -> Result<PathBuf> {
    options.validate()?;
    let target = Target::parse(url)?;
    let pin = &options.transport.pin;

    storage::ensure_parent(destination).map_err(|e| FetchError::io(destination, e))?;

    // Trust decision before any other network activity.
    match check_pin(probe, &target.host, target.port, pin) {
        Ok(PinCheck::Match) => {
            tracing::debug!(host = %target.host, "leaf fingerprint matches pin");
        }
        Ok(PinCheck::Mismatch { observed }) => {
            return Err(FetchError::TrustViolation {
                host: target.host,
                expected: pin.to_string(),
                observed: observed.to_string(),
            });
        }
        Err(source) => {
            return Err(FetchError::Connectivity {
                host: target.host,
                source,
            });
        }
    }

    let transport = PinnedTransport::new(options.transport.clone());
    let head = fetch_head::probe(&transport, url).unwrap_or_else(|e| {
        tracing::debug!("HEAD probe failed, size and range support unknown: {:#}", e);
        HeadResult::default()
    });
    tracing::info!(
        url,
        remote_size = ?head.content_length,
        accept_ranges = head.accept_ranges,
        "starting download to {}",
        destination.display()
    );

    let mut state = DownloadState::new(
        url,
        destination.to_path_buf(),
        target,
        &head,
        &options.retry,
    );

    let result = run_with_retry(&options.retry, |attempt| {
        state.attempt = attempt;
        tracing::debug!(attempt, max_attempts = state.max_attempts, "starting attempt");
        revalidate_pin(probe, &state.target, pin)?;
        state.existing =
            storage::existing_len(destination).map_err(|source| AttemptError::Storage {
                path: destination.to_path_buf(),
                source,
            })?;
        if state.existing > 0 && state.resume_offset().is_none() {
            tracing::info!(
                existing = state.existing,
                "server does not support ranges; restarting from byte 0"
            );
        }
        attempt::run(&transport, &state, options.chunk_size, &mut *progress)
    });

    match result {
        Ok(AttemptOutcome::AlreadyComplete) => {
            tracing::info!("destination already complete: {}", destination.display());
        }
        Ok(AttemptOutcome::Transferred { bytes }) => {
            tracing::debug!(bytes, attempt = state.attempt, "transfer finished");
        }
        Err(failure) => return Err(into_fetch_error(failure)),
    }

    let final_len =
        storage::existing_len(destination).map_err(|e| FetchError::io(destination, e))?;
    if let Some(expected) = state.remote_total {
        if final_len != expected {
            match options.size_mismatch {
                SizeMismatchPolicy::Warn => tracing::warn!(
                    expected,
                    actual = final_len,
                    "final size differs from advertised size"
                ),
                SizeMismatchPolicy::Fail => {
                    return Err(FetchError::SizeMismatch {
                        expected,
                        actual: final_len,
                    })
                }
            }
        }
    }

    tracing::info!(bytes = final_len, "download complete: {}", destination.display());
    Ok(destination.to_path_buf())
}

fn revalidate_pin<P: LeafProbe + ?Sized>(
    probe: &P,
    target: &Target,
    pin: &Fingerprint,
) -> std::result::Result<(), AttemptError> {
    match check_pin(probe, &target.host, target.port, pin) {
        Ok(PinCheck::Match) => Ok(()),
        Ok(PinCheck::Mismatch { observed }) => Err(AttemptError::TrustViolation {
            host: target.host.clone(),
            expected: pin.clone(),
            observed,
        }),
        Err(source) => Err(AttemptError::Probe {
            host: target.host.clone(),
            source,
        }),
    }
}

fn into_fetch_error(failure: RetryFailure) -> FetchError {
    match failure {
        RetryFailure::Exhausted { attempts, last } => FetchError::RetriesExhausted {
            attempts,
            source: last,
        },
        RetryFailure::Fatal { attempt, error } => match error {
            AttemptError::TrustViolation {
                host,
                expected,
                observed,
            } => FetchError::TrustViolation {
                host,
                expected: expected.to_string(),
                observed: observed.to_string(),
            },
            AttemptError::Http(status) => FetchError::Http { status },
            AttemptError::Storage { path, source } => FetchError::Io { path, source },
            other => FetchError::Transfer {
                attempt,
                source: other,
            },
        },
    }
}
