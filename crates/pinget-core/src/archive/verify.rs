//! Pre-extraction integrity gate.

use std::io;
use std::path::Path;

use super::{corrupt, members_of, open};
use crate::error::Result;

/// Decompresses every member into a sink and checks its CRC-32. Nothing is
/// written to disk. Fails with `CorruptMember` naming the first bad member.
pub fn verify_archive(path: &Path) -> Result<()> {
    let mut archive = open(path)?;
    let members = members_of(path, &mut archive)?;
    for (index, member) in members.iter().enumerate() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| corrupt(member, e))?;
        let n = io::copy(&mut entry, &mut io::sink()).map_err(|e| corrupt(member, e))?;
        if n != member.size {
            return Err(corrupt(
                member,
                format!("decompressed {} bytes, expected {}", n, member.size),
            ));
        }
    }
    tracing::info!(members = members.len(), "archive verified: {}", path.display());
    Ok(())
}
