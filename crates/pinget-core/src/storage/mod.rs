//! Destination file lifecycle.
//!
//! The destination is the only persisted artifact of a download: opened in
//! append mode to continue a ranged transfer, truncate/create mode to start
//! over. Partial files left by a crash are resumable as-is.

mod writer;

pub use writer::{DestinationWriter, WriteMode};

use std::io;
use std::path::Path;

/// Bytes already present at `path` (0 if the file does not exist).
pub fn existing_len(path: &Path) -> io::Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

/// Creates the parent directories of `path` if missing.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Truncates `path` to zero length if it exists.
pub fn discard(path: &Path) -> io::Result<()> {
    match std::fs::OpenOptions::new().write(true).open(path) {
        Ok(f) => f.set_len(0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
