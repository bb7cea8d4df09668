//! Parse HTTP response header lines.

use super::HeadResult;

/// Parse collected header lines into HeadResult.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut result = HeadResult::default();

    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            if let Ok(n) = value.parse::<u64>() {
                result.content_length = Some(n);
            }
        }
        if name.eq_ignore_ascii_case("accept-ranges") {
            result.accept_ranges = value.to_ascii_lowercase().contains("bytes");
        }
    }

    result
}

/// Status code of an `HTTP/x.y NNN reason` line, if `line` is one.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("HTTP/")?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

/// Total length from a `Content-Range` header line (`bytes a-b/total` or
/// `bytes */total`). `None` for other headers or an unknown (`*`) total.
pub(crate) fn parse_content_range_total(line: &str) -> Option<u64> {
    let (_, total) = content_range_value(line)?.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// First byte position from a `Content-Range: bytes a-b/total` line.
/// `None` for other headers and for the unsatisfied form `bytes */total`.
pub(crate) fn parse_content_range_start(line: &str) -> Option<u64> {
    let value = content_range_value(line)?;
    let (range, _) = value.strip_prefix("bytes")?.trim().split_once('/')?;
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}

fn content_range_value(line: &str) -> Option<&str> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-range") {
        return None;
    }
    Some(value.trim())
}
