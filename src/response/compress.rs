//! `Content-Encoding: gzip`/`deflate` response compression ([RFC9110 Section 8.4.1]).
//!
//! [RFC9110 Section 8.4.1]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-content-encoding>
#![cfg(feature = "compression")]

use std::io::{self, Write};

use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;

/// Streaming response-body compressor. Each [`write`][Self::write] call feeds input
/// bytes to the underlying codec and drains whatever compressed bytes it has
/// produced so far, so compression can be interleaved with chunked/streamed writes
/// rather than buffering the whole body.
#[derive(Debug)]
pub enum Encoder {
    Gzip(GzEncoder<Vec<u8>>),
    Deflate(DeflateEncoder<Vec<u8>>),
}

impl Encoder {
    /// Construct an encoder for the given `Content-Encoding` token (`gzip` or
    /// `deflate`), or `None` if it names neither.
    pub fn for_coding(coding: &str) -> Option<Self> {
        match coding {
            c if c.eq_ignore_ascii_case("gzip") => {
                Some(Self::Gzip(GzEncoder::new(Vec::new(), Compression::default())))
            }
            c if c.eq_ignore_ascii_case("deflate") => {
                Some(Self::Deflate(DeflateEncoder::new(Vec::new(), Compression::default())))
            }
            _ => None,
        }
    }

    /// The `Content-Encoding` token this encoder emits.
    pub fn coding(&self) -> &'static str {
        match self {
            Self::Gzip(_) => "gzip",
            Self::Deflate(_) => "deflate",
        }
    }

    /// Compress `data`, returning whatever compressed bytes are now ready to write.
    pub fn write(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip(enc) => {
                enc.write_all(data)?;
                Ok(std::mem::take(enc.get_mut()))
            }
            Self::Deflate(enc) => {
                enc.write_all(data)?;
                Ok(std::mem::take(enc.get_mut()))
            }
        }
    }

    /// Flush the codec's trailer (checksum/footer) and consume `self`.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip(enc) => enc.finish(),
            Self::Deflate(enc) => enc.finish(),
        }
    }
}

/// Pick the first encoding in `accept_encoding` (an `Accept-Encoding` header value)
/// that this crate supports, ignoring `q`-value ordering — any client listing gzip or
/// deflate at all is assumed willing to receive it.
pub fn negotiate(accept_encoding: &str) -> Option<&'static str> {
    let tokens: Vec<&str> = accept_encoding.split(',').map(|t| t.split(';').next().unwrap_or("").trim()).collect();
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("gzip")) {
        return Some("gzip");
    }
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("deflate")) {
        return Some("deflate");
    }
    None
}

/// Compressibility predicate ([spec §4.7]): the content type (parameters stripped)
/// matches any of a small set of glob patterns. A leading `*` matches as suffix, a
/// trailing `*` matches as prefix, otherwise the match is exact.
pub fn is_compressible(content_type: &str) -> bool {
    const PATTERNS: &[&str] = &["text/*", "*/javascript", "*icon", "*+xml", "*/json"];
    let ct = content_type.split(';').next().unwrap_or("").trim();
    PATTERNS.iter().any(|pat| glob_match(pat, ct))
}

fn glob_match(pattern: &str, value: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        return value.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.starts_with(prefix);
    }
    pattern.eq_ignore_ascii_case(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_text_wildcard() {
        assert!(is_compressible("text/plain"));
        assert!(is_compressible("text/html; charset=utf-8"));
    }

    #[test]
    fn matches_suffix_and_exact_patterns() {
        assert!(is_compressible("application/javascript"));
        assert!(is_compressible("image/x-icon"));
        assert!(is_compressible("application/rss+xml"));
        assert!(is_compressible("application/json"));
    }

    #[test]
    fn rejects_non_matching_types() {
        assert!(!is_compressible("image/png"));
        assert!(!is_compressible("application/octet-stream"));
    }

    #[test]
    fn negotiates_gzip_over_deflate() {
        assert_eq!(negotiate("gzip, deflate"), Some("gzip"));
        assert_eq!(negotiate("deflate"), Some("deflate"));
        assert_eq!(negotiate("br"), None);
    }

    #[test]
    fn gzip_round_trips_through_flate2() {
        let mut enc = Encoder::for_coding("gzip").unwrap();
        let mut out = enc.write(b"hello world").unwrap();
        out.extend(enc.finish().unwrap());
        let mut dec = flate2::read::GzDecoder::new(&out[..]);
        let mut result = String::new();
        std::io::Read::read_to_string(&mut dec, &mut result).unwrap();
        assert_eq!(result, "hello world");
    }
}
