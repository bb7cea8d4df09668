//! Checksum command: compute SHA-256 of a file.

use anyhow::Result;
use pinget_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file (`sha256sum` format).
pub fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::file_digest(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
