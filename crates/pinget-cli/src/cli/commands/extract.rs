//! `pinget extract <archive> <dir> [--filter S]`.

use anyhow::Result;
use pinget_core::progress::human_bytes;
use pinget_core::{extract_archive_with, ExtractOptions};
use std::path::Path;

use crate::cli::progress;

pub fn run_extract(path: &Path, out: &Path, filter: Option<String>) -> Result<()> {
    let options = ExtractOptions {
        name_filter: filter,
        ..ExtractOptions::default()
    };
    let extracted = extract_archive_with(path, out, &options, &mut *progress::sink())?;
    for file in &extracted.files {
        println!("{}", file.display());
    }
    println!(
        "extracted {} file(s), {} into {}",
        extracted.files.len(),
        human_bytes(extracted.bytes),
        extracted.output_dir.display()
    );
    Ok(())
}
