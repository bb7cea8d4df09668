//! Pinned-TLS resumable archive download, integrity check and extraction.
//!
//! The pipeline is `download_with_resume` → `verify_archive` →
//! `extract_archive`, with `file_digest` for the audit hash.

pub mod archive;
pub mod checksum;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetch_head;
pub mod logging;
pub mod pin;
pub mod progress;
pub mod retry;
pub mod storage;
pub mod transport;

pub use archive::{
    extract_archive, extract_archive_with, list_members, verify_archive, ArchiveMember,
    ExtractOptions, Extracted,
};
pub use checksum::file_digest;
pub use downloader::{download_with_probe, download_with_resume, DownloadOptions};
pub use error::FetchError;
pub use pin::Fingerprint;
