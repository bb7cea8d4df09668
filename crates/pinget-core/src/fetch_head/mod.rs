//! HTTP HEAD / metadata probing.
//!
//! Best-effort: learns `Content-Length` and `Accept-Ranges` for progress
//! display and resumption. Callers treat any failure as "unknown size, no
//! range support".

mod parse;

pub(crate) use parse::{parse_content_range_start, parse_content_range_total, parse_status_line};

use anyhow::{Context, Result};
use std::str;

use crate::transport::PinnedTransport;

/// Key headers from a HEAD response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if `Accept-Ranges` mentions `bytes`.
    pub accept_ranges: bool,
}

/// Performs a HEAD request through `transport` and returns parsed metadata.
///
/// Follows redirects; only the headers of the final response are kept.
pub fn probe(transport: &PinnedTransport, url: &str) -> Result<HeadResult> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = transport.handle(url).context("invalid URL")?;
    easy.nobody(true)?; // HEAD request

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                if parse_status_line(line).is_some() {
                    headers.clear();
                }
                headers.push(line.to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    Ok(parse::parse_headers(&headers))
}
