//! Per-call download state.

use std::path::PathBuf;

use crate::error::{FetchError, Result};
use crate::fetch_head::HeadResult;
use crate::retry::RetryPolicy;

/// Host and port a URL connects to (what the pin is checked against).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Host and explicit-or-default port of `url`.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::InvalidConfig(format!("invalid URL {:?}: {}", url, e)))?;
        let host = match parsed.host() {
            Some(url::Host::Domain(d)) => d.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => {
                return Err(FetchError::InvalidConfig(format!(
                    "URL {:?} has no host",
                    url
                )))
            }
        };
        let port = parsed.port_or_known_default().ok_or_else(|| {
            FetchError::InvalidConfig(format!("URL {:?} has no known port", url))
        })?;
        Ok(Self { host, port })
    }
}

/// Lives for one `download_with_resume` call; mutated across attempts.
#[derive(Debug, Clone)]
pub struct DownloadState {
    pub url: String,
    pub destination: PathBuf,
    pub target: Target,
    /// Bytes on disk at the start of the current attempt.
    pub existing: u64,
    /// Remote size from the HEAD probe, if reported.
    pub remote_total: Option<u64>,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// Current 1-based attempt number (0 before the first attempt).
    pub attempt: u32,
    pub max_attempts: u32,
}

impl DownloadState {
    pub fn new(
        url: &str,
        destination: PathBuf,
        target: Target,
        head: &HeadResult,
        retry: &RetryPolicy,
    ) -> Self {
        Self {
            url: url.to_string(),
            destination,
            target,
            existing: 0,
            remote_total: head.content_length,
            accept_ranges: head.accept_ranges,
            attempt: 0,
            max_attempts: retry.max_attempts,
        }
    }

    /// Offset to resume from, when the server supports ranges and bytes exist.
    pub fn resume_offset(&self) -> Option<u64> {
        (self.accept_ranges && self.existing > 0).then_some(self.existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_default_and_explicit_ports() {
        let t = Target::parse("https://example.org/archive.zip").unwrap();
        assert_eq!(
            t,
            Target {
                host: "example.org".into(),
                port: 443
            }
        );
        let t = Target::parse("https://example.org:8443/a?path=X.ZIP").unwrap();
        assert_eq!(t.port, 8443);
        let t = Target::parse("http://127.0.0.1/").unwrap();
        assert_eq!(
            t,
            Target {
                host: "127.0.0.1".into(),
                port: 80
            }
        );
        let t = Target::parse("https://[::1]:4443/").unwrap();
        assert_eq!(t.host, "::1");
    }

    #[test]
    fn target_rejects_garbage() {
        assert!(matches!(
            Target::parse("not a url"),
            Err(FetchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn resume_offset_requires_ranges_and_bytes() {
        let head = HeadResult {
            content_length: Some(10),
            accept_ranges: true,
        };
        let target = Target::parse("https://h/").unwrap();
        let mut s = DownloadState::new(
            "https://h/",
            PathBuf::from("x"),
            target,
            &head,
            &RetryPolicy::default(),
        );
        assert_eq!(s.resume_offset(), None);
        s.existing = 4;
        assert_eq!(s.resume_offset(), Some(4));
        s.accept_ranges = false;
        assert_eq!(s.resume_offset(), None);
    }

    #[test]
    fn state_carries_attempt_budget() {
        let retry = RetryPolicy {
            max_attempts: 7,
            ..RetryPolicy::default()
        };
        let s = DownloadState::new(
            "https://h/",
            PathBuf::from("x"),
            Target::parse("https://h/").unwrap(),
            &HeadResult::default(),
            &retry,
        );
        assert_eq!(s.max_attempts, 7);
        assert_eq!(s.attempt, 0);
        assert_eq!(s.remote_total, None);
    }
}
