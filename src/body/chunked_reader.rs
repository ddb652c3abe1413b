use tokio::io::{AsyncRead, AsyncReadExt};

use crate::headers::{HeaderMap, HeaderName, HeaderValue};

use super::error::BodyError;
use super::token_reader::{read_line, Charset};

const MAX_CHUNK_SIZE_LINE: usize = 64;
const MAX_TRAILER_LINES: usize = 100;

#[derive(Debug, PartialEq, Eq)]
enum State {
    ChunkHeader,
    ChunkData(u64),
    ChunkTrailerCrlf,
    Trailers,
    Done,
}

/// Decodes an HTTP chunked transfer-coded body ([RFC9112 Section 7.1]).
///
/// Each chunk is `HEX-SIZE [;extensions] CRLF DATA CRLF`; a zero-size chunk
/// terminates the body, optionally followed by trailer header fields and a final
/// CRLF. Only chunk data is exposed through [`read`][Self::read]; once the
/// terminator is reached, [`take_trailers`][Self::take_trailers] returns any
/// trailer fields collected, which the caller merges into the request's headers
/// (repeated names concatenated with `", "`, matching the header block parser).
///
/// [RFC9112 Section 7.1]: <https://datatracker.ietf.org/doc/html/rfc9112#section-7.1>
#[derive(Debug)]
pub struct ChunkedReader<R> {
    inner: R,
    state: State,
    trailers: HeaderMap,
}

impl<R: AsyncRead + Unpin> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, state: State::ChunkHeader, trailers: HeaderMap::new() }
    }

    /// Read up to `buf.len()` bytes of chunk data. Returns `0` once the terminating
    /// chunk has been consumed (not when the underlying stream ends).
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, BodyError> {
        loop {
            match self.state {
                State::Done => return Ok(0),
                State::ChunkHeader => {
                    let line = read_line(&mut self.inner, MAX_CHUNK_SIZE_LINE, Charset::Latin1).await?;
                    let size_token = line.split(';').next().unwrap_or("").trim();
                    let size = u64::from_str_radix(size_token, 16).map_err(|_| BodyError::MalformedChunkSize)?;
                    self.state = if size == 0 { State::Trailers } else { State::ChunkData(size) };
                }
                State::ChunkData(0) => {
                    self.state = State::ChunkTrailerCrlf;
                }
                State::ChunkData(remaining) => {
                    let want = (remaining.min(buf.len() as u64)) as usize;
                    if want == 0 {
                        return Ok(0);
                    }
                    let n = self.inner.read(&mut buf[..want]).await?;
                    if n == 0 {
                        return Err(BodyError::BodyTruncated);
                    }
                    self.state = State::ChunkData(remaining - n as u64);
                    return Ok(n);
                }
                State::ChunkTrailerCrlf => {
                    let line = read_line(&mut self.inner, 0, Charset::Latin1).await?;
                    if !line.is_empty() {
                        return Err(BodyError::MalformedChunkSize);
                    }
                    self.state = State::ChunkHeader;
                }
                State::Trailers => {
                    for _ in 0..MAX_TRAILER_LINES {
                        let line = read_line(&mut self.inner, 8192, Charset::Latin1).await?;
                        if line.is_empty() {
                            self.state = State::Done;
                            return Ok(0);
                        }
                        let (name, value) = line.split_once(':').ok_or(BodyError::MalformedChunkSize)?;
                        let name = HeaderName::from_bytes(name.trim().as_bytes())
                            .map_err(|_| BodyError::MalformedChunkSize)?;
                        let value = HeaderValue::try_copy_from_string(value.trim())
                            .map_err(|_| BodyError::MalformedChunkSize)?;
                        merge_trailer(&mut self.trailers, name, value);
                    }
                    return Err(BodyError::TokenTooLarge);
                }
            }
        }
    }

    /// Read and discard all remaining chunk data and trailers, so the underlying
    /// connection is positioned for the next request.
    pub async fn drain(&mut self) -> Result<(), BodyError> {
        let mut buf = [0u8; 4096];
        while self.read(&mut buf).await? != 0 {}
        Ok(())
    }

    /// Take any trailer header fields collected after the terminating chunk. Empty
    /// until the body has been fully read.
    pub fn take_trailers(&mut self) -> HeaderMap {
        std::mem::replace(&mut self.trailers, HeaderMap::new())
    }

    /// Consume `self`, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn merge_trailer(trailers: &mut HeaderMap, name: HeaderName, value: HeaderValue) {
    if trailers.contains_key(&name) {
        let combined = trailers
            .get_all(&name)
            .map(|v| v.try_as_str().unwrap_or_default().to_owned())
            .chain(std::iter::once(value.try_as_str().unwrap_or_default().to_owned()))
            .collect::<Vec<_>>()
            .join(", ");
        trailers.insert(name, HeaderValue::try_copy_from_string(&combined).unwrap());
    } else {
        trailers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_chunks_until_terminator() {
        let src: &[u8] = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut reader = ChunkedReader::new(src);
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            let n = reader.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"Wikipedia");
    }

    #[tokio::test]
    async fn merges_trailers() {
        let src: &[u8] = b"3\r\nfoo\r\n0\r\nX-Trailer: a\r\n\r\n";
        let mut reader = ChunkedReader::new(src);
        let mut buf = [0u8; 16];
        while reader.read(&mut buf).await.unwrap() != 0 {}
        let trailers = reader.take_trailers();
        assert_eq!(trailers.get("x-trailer").unwrap().as_str(), "a");
    }

    #[tokio::test]
    async fn rejects_malformed_size() {
        let src: &[u8] = b"zz\r\n";
        let mut reader = ChunkedReader::new(src);
        let mut buf = [0u8; 16];
        let err = reader.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, BodyError::MalformedChunkSize));
    }

    #[tokio::test]
    async fn rejects_truncated_body() {
        let src: &[u8] = b"10\r\nabc";
        let mut reader = ChunkedReader::new(src);
        let mut buf = [0u8; 16];
        reader.read(&mut buf).await.unwrap();
        let err = reader.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, BodyError::BodyTruncated));
    }
}
