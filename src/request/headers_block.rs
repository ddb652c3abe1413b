use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::headers::{HeaderMap, HeaderName, HeaderValue};

use super::error::RequestError;

/// Hard cap on header lines per request ([spec §4.6] step 2): exceeding it fails the
/// connection with 400 rather than letting a client exhaust memory with headers.
const MAX_HEADER_LINES: usize = 100;
const MAX_LINE_LEN: usize = 8192;

/// Read the header block following a request line: zero or more `name: value` lines,
/// with [obs-fold] continuation support, terminated by a blank line.
///
/// Duplicate header names are concatenated with `", "` ([RFC9110 Section 5.2]); a line
/// starting with SP/HTAB instead continues the most recently written field's value,
/// joined with a single SP — this is what distinguishes folding from repetition.
///
/// [obs-fold]: <https://datatracker.ietf.org/doc/html/rfc9112#section-5.2>
/// [RFC9110 Section 5.2]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-field-order>
pub async fn read_header_block<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<HeaderMap, RequestError> {
    let mut fields: Vec<(HeaderName, Vec<u8>)> = Vec::new();
    let mut last_touched: Option<usize> = None;
    let mut lines_read = 0usize;

    loop {
        let line = read_raw_line(reader).await?;
        if line.is_empty() {
            break;
        }

        lines_read += 1;
        if lines_read > MAX_HEADER_LINES {
            return Err(RequestError::TooManyHeaders);
        }

        if line[0] == b' ' || line[0] == b'\t' {
            let idx = last_touched.ok_or(RequestError::MalformedHeader)?;
            fields[idx].1.push(b' ');
            fields[idx].1.extend_from_slice(trim_ows(&line));
            continue;
        }

        let colon = line.iter().position(|&b| b == b':').ok_or(RequestError::MalformedHeader)?;
        let name = HeaderName::from_bytes(&line[..colon]).map_err(|_| RequestError::MalformedHeader)?;
        let value = trim_ows(&line[colon + 1..]);

        match fields.iter().position(|(n, _)| n.as_str() == name.as_str()) {
            Some(idx) => {
                fields[idx].1.extend_from_slice(b", ");
                fields[idx].1.extend_from_slice(value);
                last_touched = Some(idx);
            }
            None => {
                fields.push((name, value.to_vec()));
                last_touched = Some(fields.len() - 1);
            }
        }
    }

    let mut map = HeaderMap::with_capacity(fields.len());
    for (name, value) in fields {
        let value = HeaderValue::try_copy_from_slice(&value).map_err(|_| RequestError::MalformedHeader)?;
        map.append(name, value);
    }
    Ok(map)
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != b' ' && b != b'\t').map_or(start, |i| i + 1);
    &bytes[start..end]
}

async fn read_raw_line<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, RequestError> {
    let mut buf = Vec::new();
    loop {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(RequestError::from(crate::body::BodyError::UnexpectedEof));
            }
            Err(e) => return Err(RequestError::from(crate::body::BodyError::Io(e))),
        };
        if byte == b'\n' {
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            return Ok(buf);
        }
        buf.push(byte);
        if buf.len() > MAX_LINE_LEN {
            return Err(RequestError::from(crate::body::BodyError::TokenTooLarge));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_simple_headers() {
        let mut input: &[u8] = b"Host: example.com\r\nContent-Length: 5\r\n\r\n";
        let headers = read_header_block(&mut input).await.unwrap();
        assert_eq!(headers.get("host").unwrap().as_str(), "example.com");
        assert_eq!(headers.get("content-length").unwrap().as_str(), "5");
    }

    #[tokio::test]
    async fn folds_continuation_lines() {
        let mut input: &[u8] = b"X-Thing: first\r\n  second\r\n\r\n";
        let headers = read_header_block(&mut input).await.unwrap();
        assert_eq!(headers.get("x-thing").unwrap().as_str(), "first second");
    }

    #[tokio::test]
    async fn concatenates_duplicate_names() {
        let mut input: &[u8] = b"Accept: text/html\r\nAccept: application/json\r\n\r\n";
        let headers = read_header_block(&mut input).await.unwrap();
        assert_eq!(headers.get("accept").unwrap().as_str(), "text/html, application/json");
    }

    #[tokio::test]
    async fn folding_after_a_duplicate_continues_the_merged_value() {
        let mut input: &[u8] = b"Accept: a\r\nAccept: b\r\n c\r\n\r\n";
        let headers = read_header_block(&mut input).await.unwrap();
        assert_eq!(headers.get("accept").unwrap().as_str(), "a, b c");
    }

    #[tokio::test]
    async fn rejects_leading_fold_with_no_prior_header() {
        let mut input: &[u8] = b" leading\r\n\r\n";
        assert!(read_header_block(&mut input).await.is_err());
    }

    #[tokio::test]
    async fn rejects_line_without_colon() {
        let mut input: &[u8] = b"not-a-header\r\n\r\n";
        assert!(read_header_block(&mut input).await.is_err());
    }

    #[tokio::test]
    async fn rejects_too_many_headers() {
        let mut raw = Vec::new();
        for i in 0..101 {
            raw.extend_from_slice(format!("X-{i}: v\r\n").as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        let mut input: &[u8] = &raw;
        let err = read_header_block(&mut input).await.unwrap_err();
        assert!(matches!(err, RequestError::TooManyHeaders));
    }

    #[tokio::test]
    async fn empty_block_is_fine() {
        let mut input: &[u8] = b"\r\n";
        let headers = read_header_block(&mut input).await.unwrap();
        assert!(headers.is_empty());
    }
}
