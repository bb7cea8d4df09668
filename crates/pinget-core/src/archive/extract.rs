//! Streaming extraction into an output directory.
//!
//! Member paths are joined under the output directory verbatim; callers must
//! trust or sanitize the archive source. Files written before a failing
//! member are left in place (use `verify_archive` first for all-or-nothing).

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::{corrupt, members_of, open, ArchiveMember};
use crate::error::{FetchError, Result};
use crate::progress::{ProgressSink, ProgressThrottle};

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only extract members whose path contains this (case-insensitive).
    pub name_filter: Option<String>,
    /// Copy buffer size; memory use is independent of member size.
    pub chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            name_filter: None,
            chunk_size: 512 * 1024,
        }
    }
}

impl ExtractOptions {
    fn selects(&self, member: &ArchiveMember) -> bool {
        match &self.name_filter {
            None => true,
            Some(needle) => member
                .path
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// Result of an extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub output_dir: PathBuf,
    /// Extracted files in archive order.
    pub files: Vec<PathBuf>,
    /// Total decompressed bytes written.
    pub bytes: u64,
}

/// Extracts every member of `archive_path` under `output_dir`.
pub fn extract_archive(
    archive_path: &Path,
    output_dir: &Path,
    progress: &mut dyn ProgressSink,
) -> Result<Extracted> {
    extract_archive_with(archive_path, output_dir, &ExtractOptions::default(), progress)
}

/// Extracts the selected members of `archive_path` under `output_dir`, in
/// stored order, in a single pass.
pub fn extract_archive_with(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Extracted> {
    fs::create_dir_all(output_dir).map_err(|e| FetchError::io(output_dir, e))?;
    let mut archive = open(archive_path)?;
    let members = members_of(archive_path, &mut archive)?;

    let total: u64 = members
        .iter()
        .filter(|m| !m.is_dir && options.selects(m))
        .map(|m| m.size)
        .sum();
    let mut throttle = ProgressThrottle::start(progress, "extract", 0, Some(total));
    let mut buf = vec![0u8; options.chunk_size.max(1)];
    let mut files = Vec::new();

    for (index, member) in members.iter().enumerate() {
        let target = output_dir.join(&member.path);
        if member.is_dir {
            // With a filter, directories come from matching files' parents.
            if options.name_filter.is_none() {
                fs::create_dir_all(&target).map_err(|e| FetchError::io(&target, e))?;
            }
            continue;
        }
        if !options.selects(member) {
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }

        let mut entry = archive
            .by_index(index)
            .map_err(|e| corrupt(member, e))?;
        let mut out = File::create(&target).map_err(|e| FetchError::io(&target, e))?;
        let mut written = 0u64;
        loop {
            let n = entry.read(&mut buf).map_err(|e| corrupt(member, e))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])
                .map_err(|e| FetchError::io(&target, e))?;
            written += n as u64;
            throttle.advance(n as u64);
        }
        if written != member.size {
            return Err(corrupt(
                member,
                format!("decompressed {} bytes, expected {}", written, member.size),
            ));
        }
        tracing::debug!(member = %member.path, bytes = written, "extracted");
        files.push(target);
    }

    let bytes = throttle.finish();
    if files.is_empty() && options.name_filter.is_some() {
        tracing::warn!(
            filter = ?options.name_filter,
            "no archive member matched the filter"
        );
    }
    tracing::info!(
        files = files.len(),
        bytes,
        "extraction complete: {}",
        output_dir.display()
    );
    Ok(Extracted {
        output_dir: output_dir.to_path_buf(),
        files,
        bytes,
    })
}
