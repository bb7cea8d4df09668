//! Buffered sequential writer for the destination file.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// How to open the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Continue after the bytes already on disk (ranged resume).
    Append,
    /// Create or truncate and write from byte 0.
    Truncate,
}

/// Owns the destination handle for one attempt. Body bytes are buffered and
/// reach the file in `chunk_size` blocks; the handle is released when the
/// writer is dropped, on every exit path.
pub struct DestinationWriter {
    out: BufWriter<File>,
    written: u64,
}

impl DestinationWriter {
    pub fn open(path: &Path, mode: WriteMode, chunk_size: usize) -> io::Result<Self> {
        let mut options = File::options();
        match mode {
            WriteMode::Append => options.create(true).append(true),
            WriteMode::Truncate => options.create(true).write(true).truncate(true),
        };
        let file = options.open(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(chunk_size.max(1), file),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Drops everything in the file, including bytes from before this
    /// attempt, and restarts at offset 0.
    pub fn reset(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.out.get_ref().set_len(0)?;
        self.out.get_mut().seek(SeekFrom::Start(0))?;
        self.written = 0;
        Ok(())
    }

    /// Bytes written through this writer since open (or the last reset).
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Push buffered bytes to the file without syncing. Used on failed
    /// attempts so everything received stays resumable.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and sync to disk, then close the handle.
    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()
    }
}
