//! SHA-256 certificate fingerprint newtype.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a DER certificate, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a raw DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Fingerprint(hex::encode(Sha256::digest(der)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returned when a pin string is not 32 hex-encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFingerprint(pub String);

impl fmt::Display for InvalidFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid SHA-256 fingerprint {:?} (expected 64 hex characters)",
            self.0
        )
    }
}

impl std::error::Error for InvalidFingerprint {}

impl FromStr for Fingerprint {
    type Err = InvalidFingerprint;

    /// Accepts upper or lower case, with or without `:` separators
    /// (the `openssl x509 -fingerprint` form).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let stripped = trimmed
            .split_once('=')
            .filter(|(prefix, _)| prefix.to_ascii_lowercase().contains("fingerprint"))
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let compact: String = stripped.chars().filter(|c| *c != ':').collect();
        if compact.len() != 64 || !compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidFingerprint(s.to_string()));
        }
        Ok(Fingerprint(compact.to_ascii_lowercase()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
