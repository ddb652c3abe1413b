//! Conditional request ([RFC9110 Section 13]) and `Range` ([RFC9110 Section 14])
//! evaluation.
//!
//! [RFC9110 Section 13]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-conditional-requests>
//! [RFC9110 Section 14]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-range-requests>

use std::time::SystemTime;

use crate::headers::{standard, HeaderMap};
use crate::http::date;
use crate::http::{Method, StatusCode};

/// An inclusive byte range, already clamped to the resource's total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes this range covers.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// The metadata a conditional/range evaluation is performed against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators<'a> {
    pub last_modified: Option<SystemTime>,
    pub etag: Option<&'a str>,
}

/// Evaluate `If-Match`/`If-Unmodified-Since`/`If-Modified-Since`/`If-None-Match` in
/// that order ([spec §4.8]). Returns the status the response should short-circuit
/// to, or `None` to proceed with the ordinary method handling.
pub fn evaluate(method: Method, headers: &HeaderMap, validators: Validators) -> Option<StatusCode> {
    if let Some(if_match) = headers.get(standard::IF_MATCH).and_then(|v| v.try_as_str().ok()) {
        if !matches_any(if_match, validators.etag, Comparison::Strong) {
            return Some(StatusCode::PRECONDITION_FAILED);
        }
    }

    if let Some(since) = headers.get(standard::IF_UNMODIFIED_SINCE).and_then(|v| v.try_as_str().ok()) {
        if let (Some(since), Some(last_modified)) = (date::parse(since), validators.last_modified) {
            if last_modified > since {
                return Some(StatusCode::PRECONDITION_FAILED);
            }
        }
    }

    let mut tentative = None;

    if let Some(since) = headers.get(standard::IF_MODIFIED_SINCE).and_then(|v| v.try_as_str().ok()) {
        if let Some(since) = date::parse(since) {
            if since <= SystemTime::now() {
                match validators.last_modified {
                    Some(lm) if lm > since => return Some(StatusCode::OK),
                    _ => tentative = Some(StatusCode::NOT_MODIFIED),
                }
            }
        }
    }

    if let Some(if_none_match) = headers.get(standard::IF_NONE_MATCH).and_then(|v| v.try_as_str().ok()) {
        return Some(if matches_any(if_none_match, validators.etag, Comparison::Weak) {
            if matches!(method, Method::GET | Method::HEAD) {
                StatusCode::NOT_MODIFIED
            } else {
                StatusCode::PRECONDITION_FAILED
            }
        } else {
            StatusCode::OK
        });
    }

    tentative
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Strong,
    Weak,
}

/// `true` if `list` (a comma-separated `If-Match`/`If-None-Match` value) matches
/// `etag` under the given comparison rule. `*` matches any non-`None` etag.
fn matches_any(list: &str, etag: Option<&str>, rule: Comparison) -> bool {
    let Some(etag) = etag else { return false };
    for candidate in list.split(',').map(str::trim) {
        if candidate == "*" {
            return true;
        }
        if etag_eq(candidate, etag, rule) {
            return true;
        }
    }
    false
}

fn etag_eq(a: &str, b: &str, rule: Comparison) -> bool {
    let (a_weak, a_tag) = split_weak(a);
    let (b_weak, b_tag) = split_weak(b);
    if rule == Comparison::Strong && (a_weak || b_weak) {
        return false;
    }
    a_tag == b_tag
}

fn split_weak(tag: &str) -> (bool, &str) {
    match tag.strip_prefix("W/") {
        Some(rest) => (true, rest),
        None => (false, tag),
    }
}

/// Parse a `Range` header value ([spec §4.8]): comma-separated `bytes=` entries in
/// forms `A-B`, `A-` (open), `-N` (suffix), collapsed into a single enclosing range.
/// Returns `None` if the header is malformed, every entry is invalid, or the
/// computed start is beyond `total_len` is left to the caller (416 is a response
/// decision, not a parse failure).
pub fn parse_range(header: &str, total_len: u64) -> Option<ByteRange> {
    let spec = header.strip_prefix("bytes=")?;
    let mut min_start = None;
    let mut max_end = None;

    for entry in spec.split(',').map(str::trim) {
        let (start_str, end_str) = entry.split_once('-')?;
        let (start, end) = if start_str.is_empty() {
            let suffix: u64 = end_str.parse().ok()?;
            if suffix == 0 || total_len == 0 {
                continue;
            }
            let start = total_len.saturating_sub(suffix);
            (start, total_len - 1)
        } else {
            let start: u64 = start_str.parse().ok()?;
            let end = if end_str.is_empty() {
                total_len.saturating_sub(1)
            } else {
                end_str.parse().ok()?
            };
            if end < start {
                continue;
            }
            (start, end)
        };

        min_start = Some(min_start.map_or(start, |m: u64| m.min(start)));
        max_end = Some(max_end.map_or(end, |m: u64| m.max(end)));
    }

    let (start, end) = (min_start?, max_end?);
    Some(ByteRange { start, end })
}

/// Apply `If-Range` ([spec §4.8]): when present alongside a `Range`, drop the range
/// (send the whole entity) if the validator doesn't match — a date that's older than
/// `lastModified`, or an etag unequal to the resource's.
pub fn apply_if_range(range: Option<ByteRange>, headers: &HeaderMap, validators: Validators) -> Option<ByteRange> {
    let range = range?;
    let Some(if_range) = headers.get(standard::IF_RANGE).and_then(|v| v.try_as_str().ok()) else {
        return Some(range);
    };

    if let Some(date) = date::parse(if_range) {
        return match validators.last_modified {
            Some(lm) if lm > date => None,
            _ => Some(range),
        };
    }

    match validators.etag {
        Some(etag) if etag_eq(if_range, etag, Comparison::Strong) => Some(range),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_match_wildcard_matches_any_etag() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_MATCH, "*".parse().unwrap());
        let validators = Validators { etag: Some("\"abc\""), last_modified: None };
        assert_eq!(evaluate(Method::GET, &headers, validators), None);
    }

    #[test]
    fn if_match_rejects_weak_etags() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_MATCH, "W/\"abc\"".parse().unwrap());
        let validators = Validators { etag: Some("\"abc\""), last_modified: None };
        assert_eq!(evaluate(Method::GET, &headers, validators), Some(StatusCode::PRECONDITION_FAILED));
    }

    #[test]
    fn if_none_match_weak_comparison_yields_304_for_get() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_NONE_MATCH, "W/\"abc\"".parse().unwrap());
        let validators = Validators { etag: Some("\"abc\""), last_modified: None };
        assert_eq!(evaluate(Method::GET, &headers, validators), Some(StatusCode::NOT_MODIFIED));
    }

    #[test]
    fn if_none_match_yields_412_for_unsafe_method() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_NONE_MATCH, "\"abc\"".parse().unwrap());
        let validators = Validators { etag: Some("\"abc\""), last_modified: None };
        assert_eq!(evaluate(Method::PUT, &headers, validators), Some(StatusCode::PRECONDITION_FAILED));
    }

    #[test]
    fn parses_simple_and_open_and_suffix_ranges() {
        assert_eq!(parse_range("bytes=0-499", 1000), Some(ByteRange { start: 0, end: 499 }));
        assert_eq!(parse_range("bytes=500-", 1000), Some(ByteRange { start: 500, end: 999 }));
        assert_eq!(parse_range("bytes=-500", 1000), Some(ByteRange { start: 500, end: 999 }));
    }

    #[test]
    fn collapses_multiple_ranges_into_enclosing_range() {
        assert_eq!(parse_range("bytes=0-99,200-299", 1000), Some(ByteRange { start: 0, end: 299 }));
    }

    #[test]
    fn rejects_end_before_start() {
        assert_eq!(parse_range("bytes=500-100", 1000), None);
    }

    #[test]
    fn if_range_etag_mismatch_drops_the_range() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_RANGE, "\"old\"".parse().unwrap());
        let validators = Validators { etag: Some("\"new\""), last_modified: None };
        let range = Some(ByteRange { start: 0, end: 10 });
        assert_eq!(apply_if_range(range, &headers, validators), None);
    }

    #[test]
    fn if_range_etag_match_keeps_the_range() {
        let mut headers = HeaderMap::new();
        headers.append(standard::IF_RANGE, "\"same\"".parse().unwrap());
        let validators = Validators { etag: Some("\"same\""), last_modified: None };
        let range = Some(ByteRange { start: 0, end: 10 });
        assert_eq!(apply_if_range(range, &headers, validators), range);
    }
}
