//! `pinget list <archive>`.

use anyhow::Result;
use pinget_core::list_members;
use std::path::Path;

pub fn run_list(path: &Path) -> Result<()> {
    let members = list_members(path)?;
    let total: u64 = members.iter().map(|m| m.size).sum();
    for m in &members {
        println!("{:>12}  {:>12}  {:08x}  {}", m.size, m.compressed_size, m.crc32, m.path);
    }
    println!("{} members, {} bytes uncompressed", members.len(), total);
    Ok(())
}
