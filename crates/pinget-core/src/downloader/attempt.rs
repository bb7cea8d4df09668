//! One connection attempt: full or ranged GET streamed to the destination.

use std::cell::Cell;
use std::str;

use crate::fetch_head::{
    parse_content_range_start, parse_content_range_total, parse_status_line,
};
use crate::progress::{ProgressSink, ProgressThrottle};
use crate::retry::AttemptError;
use crate::storage::{self, DestinationWriter, WriteMode};
use crate::transport::PinnedTransport;

use super::state::DownloadState;

/// libcurl refuses receive buffers above this size on older releases.
const MAX_CURL_BUFFER: usize = 512 * 1024;

/// How an attempt ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AttemptOutcome {
    /// Body streamed to the destination; `bytes` is this attempt's share.
    Transferred { bytes: u64 },
    /// Server answered 416 for an offset exactly at the known end.
    AlreadyComplete,
}

fn storage_err(state: &DownloadState, source: std::io::Error) -> AttemptError {
    AttemptError::Storage {
        path: state.destination.clone(),
        source,
    }
}

/// Issues one GET (with `Range: bytes=<existing>-` when resuming) and streams
/// the body into the destination. The destination handle is closed on every
/// return path; bytes received before a failure stay on disk.
pub(super) fn run(
    transport: &PinnedTransport,
    state: &DownloadState,
    chunk_size: usize,
    progress: &mut dyn ProgressSink,
) -> Result<AttemptOutcome, AttemptError> {
    let resume_from = state.resume_offset();
    let mode = match resume_from {
        Some(_) => WriteMode::Append,
        None => WriteMode::Truncate,
    };

    let mut easy = transport.handle(&state.url).map_err(AttemptError::Curl)?;
    if let Some(offset) = resume_from {
        easy.range(&format!("{}-", offset))
            .map_err(AttemptError::Curl)?;
    }
    easy.buffer_size(chunk_size.min(MAX_CURL_BUFFER))
        .map_err(AttemptError::Curl)?;

    let mut writer = DestinationWriter::open(&state.destination, mode, chunk_size)
        .map_err(|e| storage_err(state, e))?;
    let start = resume_from.unwrap_or(0);
    let mut throttle = ProgressThrottle::start(progress, "download", start, state.remote_total);

    let status: Cell<Option<u32>> = Cell::new(None);
    let range_total: Cell<Option<u64>> = Cell::new(None);
    let range_start: Cell<Option<u64>> = Cell::new(None);
    let mut storage_error: Option<std::io::Error> = None;
    let mut misplaced_range: Option<u64> = None;
    let mut body_started = false;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    let line = line.trim_end();
                    if let Some(code) = parse_status_line(line) {
                        // New response (redirect hop or final): forget the old one.
                        status.set(Some(code));
                        range_total.set(None);
                        range_start.set(None);
                    } else if let Some(first) = parse_content_range_start(line) {
                        range_start.set(Some(first));
                        range_total.set(parse_content_range_total(line));
                    } else if let Some(total) = parse_content_range_total(line) {
                        range_total.set(Some(total));
                    }
                }
                true
            })
            .map_err(AttemptError::Curl)?;
        transfer
            .write_function(|data| {
                let code = status.get().unwrap_or(0);
                if !(200..300).contains(&code) {
                    // Error body; discard it and report the status after perform.
                    return Ok(data.len());
                }
                if !body_started {
                    body_started = true;
                    throttle.set_total(range_total.get());
                    if let Some(offset) = resume_from {
                        if code == 200 {
                            tracing::warn!("server ignored range request; restarting from byte 0");
                            if let Err(e) = writer.reset() {
                                storage_error = Some(e);
                                return Ok(0);
                            }
                            throttle.rewind(0);
                        } else if code == 206 && range_start.get() != Some(offset) {
                            // Appending would put these bytes at the wrong offset.
                            tracing::warn!(
                                requested = offset,
                                served = ?range_start.get(),
                                "partial response starts at the wrong offset; restarting from byte 0"
                            );
                            misplaced_range = Some(offset);
                            if let Err(e) = writer.reset() {
                                storage_error = Some(e);
                            }
                            return Ok(0);
                        }
                    }
                }
                match writer.write_chunk(data) {
                    Ok(()) => {
                        throttle.advance(data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })
            .map_err(AttemptError::Curl)?;
        transfer.perform()
    };
    throttle.finish();

    if let Err(e) = perform_result {
        if let Err(flush_err) = writer.flush() {
            tracing::debug!("flush after failed attempt: {}", flush_err);
        }
        if e.is_write_error() {
            if let Some(io_err) = storage_error.take() {
                return Err(storage_err(state, io_err));
            }
            if let Some(offset) = misplaced_range {
                return Err(AttemptError::RangeRejected { offset });
            }
        }
        return Err(AttemptError::Curl(e));
    }

    let code = easy.response_code().map_err(AttemptError::Curl)?;
    if code == 416 {
        drop(writer);
        let known_total = range_total.get().or(state.remote_total);
        if known_total == Some(start) {
            return Ok(AttemptOutcome::AlreadyComplete);
        }
        // Past the end (stale or foreign file) or unknown total: start over.
        storage::discard(&state.destination).map_err(|e| storage_err(state, e))?;
        return Err(AttemptError::RangeRejected { offset: start });
    }
    if !(200..300).contains(&code) {
        writer.flush().map_err(|e| storage_err(state, e))?;
        return Err(AttemptError::Http(code));
    }
    if resume_from.is_some() && code == 200 && !body_started {
        writer.reset().map_err(|e| storage_err(state, e))?;
    }

    let bytes = writer.written();
    writer.finish().map_err(|e| storage_err(state, e))?;
    Ok(AttemptOutcome::Transferred { bytes })
}
