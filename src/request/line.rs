use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::{Method, Version};

use super::error::RequestError;
use super::target::RequestTarget;

/// The parsed request-line: `method SP request-target SP HTTP-version CRLF`.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub target: RequestTarget,
    pub version: Version,
}

/// Read and parse the request line, tolerating any number of leading empty lines
/// ([RFC9112 Section 2.2]) and reporting a clean end-of-stream before any byte
/// arrives as [`RequestError::NoRequestLine`] rather than a parse failure.
///
/// [RFC9112 Section 2.2]: <https://datatracker.ietf.org/doc/html/rfc9112#section-2.2>
pub async fn read_request_line<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<RequestLine, RequestError> {
    loop {
        match read_raw_line(reader, max_len).await? {
            None => return Err(RequestError::NoRequestLine),
            Some(line) if line.is_empty() => continue,
            Some(line) => return parse_request_line(&line),
        }
    }
}

/// Read one CRLF- or LF-terminated line, returning `None` if end-of-stream occurs
/// before any byte is read, or an error if it occurs partway through a line.
async fn read_raw_line<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<Vec<u8>>, RequestError> {
    let mut buf = Vec::new();
    loop {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(RequestError::MalformedRequestLine);
            }
            Err(e) => return Err(RequestError::from(crate::body::BodyError::Io(e))),
        };
        if byte == b'\n' {
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            return Ok(Some(buf));
        }
        buf.push(byte);
        if buf.len() > max_len {
            return Err(RequestError::from(crate::body::BodyError::TokenTooLarge));
        }
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, RequestError> {
    let mut parts = line.split(|&b| b == b' ');
    let method = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    let target = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    let version = parts.next().ok_or(RequestError::MalformedRequestLine)?;
    if parts.next().is_some() {
        return Err(RequestError::MalformedRequestLine);
    }

    let method = Method::from_bytes(method).ok_or(RequestError::MalformedMethod)?;
    let target = RequestTarget::parse(target)?;
    let version = version
        .strip_prefix(b"HTTP/")
        .and_then(Version::parse)
        .ok_or(RequestError::MalformedVersion)?;

    Ok(RequestLine { method, target, version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_a_simple_request_line() {
        let mut input: &[u8] = b"GET /index.html HTTP/1.1\r\n";
        let line = read_request_line(&mut input, 8192).await.unwrap();
        assert_eq!(line.method, Method::GET);
        assert_eq!(line.version, Version::HTTP_11);
        assert_eq!(line.target.path(), Some("/index.html"));
    }

    #[tokio::test]
    async fn tolerates_leading_empty_lines() {
        let mut input: &[u8] = b"\r\n\r\nGET / HTTP/1.1\r\n";
        let line = read_request_line(&mut input, 8192).await.unwrap();
        assert_eq!(line.method, Method::GET);
    }

    #[tokio::test]
    async fn clean_eof_before_any_byte_is_not_an_error() {
        let mut input: &[u8] = b"";
        let err = read_request_line(&mut input, 8192).await.unwrap_err();
        assert!(err.is_missing_request_line());
    }

    #[tokio::test]
    async fn eof_after_empty_lines_is_also_missing_request_line() {
        let mut input: &[u8] = b"\r\n\r\n";
        let err = read_request_line(&mut input, 8192).await.unwrap_err();
        assert!(err.is_missing_request_line());
    }

    #[tokio::test]
    async fn truncated_mid_line_is_malformed_not_missing() {
        let mut input: &[u8] = b"GET /index.html";
        let err = read_request_line(&mut input, 8192).await.unwrap_err();
        assert!(!err.is_missing_request_line());
        assert!(matches!(err, RequestError::MalformedRequestLine));
    }

    #[tokio::test]
    async fn rejects_wrong_token_count() {
        let mut input: &[u8] = b"GET / HTTP/1.1 extra\r\n";
        let err = read_request_line(&mut input, 8192).await.unwrap_err();
        assert!(matches!(err, RequestError::MalformedRequestLine));
    }

    #[tokio::test]
    async fn rejects_unknown_version() {
        let mut input: &[u8] = b"GET / HTTP/2.0\r\n";
        let err = read_request_line(&mut input, 8192).await.unwrap_err();
        assert!(matches!(err, RequestError::MalformedVersion));
    }
}
