//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod range_server;

use std::cell::Cell;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use pinget_core::pin::{Fingerprint, LeafProbe, ProbeError};
use pinget_core::retry::RetryPolicy;
use pinget_core::transport::TransportConfig;
use pinget_core::DownloadOptions;

/// SHA-256 of `fixtures/cert.der`.
pub const FIXTURE_PIN: &str = "0069a2fd8598007c6e41972bf886f9962793102c8039b9709ec448467ae17cd0";

pub fn fixture_pin() -> Fingerprint {
    FIXTURE_PIN.parse().unwrap()
}

pub fn other_pin() -> Fingerprint {
    Fingerprint::of_der(b"some other certificate")
}

/// Deterministic non-repeating-ish body.
pub fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Options with a fast retry policy for tests.
pub fn options(pin: Fingerprint, max_attempts: u32) -> DownloadOptions {
    let mut opts = DownloadOptions::new(TransportConfig::new(pin));
    opts.retry = RetryPolicy {
        max_attempts,
        backoff_factor: Duration::from_millis(10),
    };
    opts.transport.connect_timeout = Duration::from_secs(5);
    opts.transport.request_timeout = Duration::from_secs(10);
    opts.transport.probe_timeout = Duration::from_secs(5);
    opts
}

/// Always presents the same leaf fingerprint; counts calls.
pub struct FixedProbe {
    pub fingerprint: Fingerprint,
    pub calls: Cell<u32>,
}

impl FixedProbe {
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            calls: Cell::new(0),
        }
    }
}

impl LeafProbe for FixedProbe {
    fn leaf_fingerprint(&self, _host: &str, _port: u16) -> Result<Fingerprint, ProbeError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.fingerprint.clone())
    }
}

/// Presents `first` for the first `switch_after` calls, then `then`.
pub struct SwitchingProbe {
    pub first: Fingerprint,
    pub then: Fingerprint,
    pub switch_after: u32,
    pub calls: Cell<u32>,
}

impl LeafProbe for SwitchingProbe {
    fn leaf_fingerprint(&self, _host: &str, _port: u16) -> Result<Fingerprint, ProbeError> {
        let n = self.calls.get() + 1;
        self.calls.set(n);
        if n <= self.switch_after {
            Ok(self.first.clone())
        } else {
            Ok(self.then.clone())
        }
    }
}

/// Builds a zip in memory. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}
