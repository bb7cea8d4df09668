//! Zip archive inspection, integrity checking and extraction.
//!
//! Each operation opens the archive read-only and releases the handle before
//! returning.

mod extract;
mod verify;

pub use extract::{extract_archive, extract_archive_with, ExtractOptions, Extracted};
pub use verify::verify_archive;

use std::fs::File;
use std::path::Path;

use crate::error::{FetchError, Result};

/// One entry of the archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Path within the archive, as stored.
    pub path: String,
    /// Declared uncompressed size.
    pub size: u64,
    pub compressed_size: u64,
    pub is_dir: bool,
    /// Stored CRC-32 of the uncompressed content.
    pub crc32: u32,
}

pub(crate) fn open(path: &Path) -> Result<zip::ZipArchive<File>> {
    let file = File::open(path).map_err(|e| FetchError::io(path, e))?;
    zip::ZipArchive::new(file).map_err(|e| FetchError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn members_of(
    path: &Path,
    archive: &mut zip::ZipArchive<File>,
) -> Result<Vec<ArchiveMember>> {
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(|e| FetchError::Archive {
            path: path.to_path_buf(),
            reason: format!("entry {}: {}", index, e),
        })?;
        members.push(ArchiveMember {
            path: entry.name().to_string(),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            is_dir: entry.is_dir(),
            crc32: entry.crc32(),
        });
    }
    Ok(members)
}

/// Lists members in stored order without decompressing anything.
pub fn list_members(path: &Path) -> Result<Vec<ArchiveMember>> {
    let mut archive = open(path)?;
    members_of(path, &mut archive)
}

pub(crate) fn corrupt(member: &ArchiveMember, reason: impl std::fmt::Display) -> FetchError {
    FetchError::CorruptMember {
        member: member.path.clone(),
        reason: reason.to_string(),
    }
}
