//! `pinget verify <archive>`.

use anyhow::Result;
use pinget_core::{list_members, verify_archive};
use std::path::Path;

pub fn run_verify(path: &Path) -> Result<()> {
    verify_archive(path)?;
    let members = list_members(path)?;
    println!("{}: OK ({} members)", path.display(), members.len());
    Ok(())
}
