use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::BodyError;

const MAX_BOUNDARY_LEN: usize = 70;

/// Iterates the parts of a `multipart/form-data` body ([RFC2046 Section 5.1]).
///
/// Parts are separated by `CRLF--<boundary>`, terminated by `CRLF--<boundary>--`.
/// The boundary (1-70 bytes) is supplied by the caller from the request's
/// `Content-Type` parameter. [`next_part`][Self::next_part] skips any unread bytes
/// of the current part and advances past the next boundary, returning `false` once
/// the terminating boundary has been crossed. [`read`][Self::read] returns `0`
/// (EOF) at the end of the current part, not at end of the underlying stream; after
/// the terminating boundary, remaining bytes (the epilogue) are exposed as plain
/// data through [`read_epilogue`][Self::read_epilogue].
///
/// [RFC2046 Section 5.1]: <https://datatracker.ietf.org/doc/html/rfc2046#section-5.1>
#[derive(Debug)]
pub struct MultipartReader<R> {
    inner: R,
    /// `"--" + boundary`, the marker for the very first boundary (leading CRLF optional).
    first_marker: Vec<u8>,
    /// `"\r\n--" + boundary`, the marker for every later boundary.
    marker: Vec<u8>,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    state: State,
    started: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    BeforeFirstBoundary,
    InPart,
    AtPartEnd,
    Done,
    Epilogue,
}

impl<R: AsyncRead + Unpin> MultipartReader<R> {
    /// `boundary` is the value of the `boundary=` parameter, without the leading
    /// `--` that appears on the wire.
    pub fn new(inner: R, boundary: &[u8]) -> Result<Self, BodyError> {
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(BodyError::MissingBoundary);
        }
        let mut first_marker = Vec::with_capacity(2 + boundary.len());
        first_marker.extend_from_slice(b"--");
        first_marker.extend_from_slice(boundary);

        let mut marker = Vec::with_capacity(4 + boundary.len());
        marker.extend_from_slice(b"\r\n--");
        marker.extend_from_slice(boundary);

        Ok(Self {
            inner,
            first_marker,
            marker,
            buf: Vec::new(),
            pos: 0,
            eof: false,
            state: State::BeforeFirstBoundary,
            started: false,
        })
    }

    /// Advance to the next part, skipping any unread bytes of the current one.
    /// Returns `false` once the terminating boundary has been crossed (there is no
    /// next part).
    pub async fn next_part(&mut self) -> Result<bool, BodyError> {
        match self.state {
            State::Done | State::Epilogue => return Ok(false),
            State::InPart => {
                let mut sink = [0u8; 4096];
                while self.read(&mut sink).await? != 0 {}
            }
            State::AtPartEnd | State::BeforeFirstBoundary => {}
        }
        self.cross_boundary().await
    }

    /// Read up to `buf.len()` bytes of the current part's body. Returns `0` at the
    /// end of this part (call [`next_part`][Self::next_part] to continue).
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize, BodyError> {
        if self.state != State::InPart {
            return Ok(0);
        }
        if out.is_empty() {
            return Ok(0);
        }

        loop {
            let needle = self.marker.clone();
            let hay = &self.buf[self.pos..];

            if let Some(d) = find_subslice(hay, &needle) {
                let n = d.min(out.len());
                out[..n].copy_from_slice(&hay[..n]);
                self.pos += n;
                if n == 0 {
                    self.state = State::AtPartEnd;
                }
                return Ok(n);
            }

            // No full match in the buffered tail. Bytes further back than
            // `needle.len() - 1` from the end cannot be part of a split match, so
            // they are safe to emit now.
            let safe_len = hay.len().saturating_sub(needle.len().saturating_sub(1));
            if safe_len > 0 {
                let n = safe_len.min(out.len());
                out[..n].copy_from_slice(&hay[..n]);
                self.pos += n;
                return Ok(n);
            }

            if self.eof {
                return Err(BodyError::MissingBoundary);
            }
            self.fill_more().await?;
        }
    }

    /// Read remaining epilogue bytes (after the terminating boundary) as plain data.
    pub async fn read_epilogue(&mut self, out: &mut [u8]) -> Result<usize, BodyError> {
        if self.state == State::Done {
            self.state = State::Epilogue;
        }
        if self.state != State::Epilogue {
            return Ok(0);
        }
        if self.pos < self.buf.len() {
            let n = (self.buf.len() - self.pos).min(out.len());
            out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        Ok(self.inner.read(out).await?)
    }

    /// Consume the next boundary marker (first or subsequent), then either the
    /// terminator suffix `--CRLF` or transport padding up to CRLF.
    async fn cross_boundary(&mut self) -> Result<bool, BodyError> {
        let marker_len = if self.started { self.marker.len() } else { self.first_marker.len() };
        self.require(marker_len).await?;
        let matches = if self.started {
            self.buf[self.pos..].starts_with(&self.marker)
        } else {
            self.buf[self.pos..].starts_with(&self.first_marker)
        };
        if !matches {
            return Err(BodyError::MissingBoundary);
        }
        self.pos += marker_len;
        self.started = true;

        self.require(2).await?;
        if self.buf[self.pos..].starts_with(b"--") {
            self.pos += 2;
            self.consume_line().await?;
            self.state = State::Done;
            return Ok(false);
        }

        self.consume_line().await?;
        self.state = State::InPart;
        Ok(true)
    }

    async fn consume_line(&mut self) -> Result<(), BodyError> {
        loop {
            if let Some(nl) = self.buf[self.pos..].iter().position(|&b| b == b'\n') {
                self.pos += nl + 1;
                return Ok(());
            }
            if self.eof {
                return Err(BodyError::MissingBoundary);
            }
            self.fill_more().await?;
        }
    }

    /// Ensure at least `n` bytes are available from `pos` onward, reading more from
    /// the underlying stream as needed. Errors with `MissingBoundary` at end-of-stream.
    async fn require(&mut self, n: usize) -> Result<(), BodyError> {
        while self.buf.len() - self.pos < n {
            if self.eof {
                return Err(BodyError::MissingBoundary);
            }
            self.fill_more().await?;
        }
        Ok(())
    }

    async fn fill_more(&mut self) -> Result<(), BodyError> {
        // Compact consumed bytes so the buffer doesn't grow unbounded over a long body.
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        let mut chunk = [0u8; 4096];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}

fn find_subslice(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_boundary() {
        let src: &[u8] = b"";
        assert!(MultipartReader::new(src, b"").is_err());
    }

    #[test]
    fn rejects_oversized_boundary() {
        let src: &[u8] = b"";
        let long = vec![b'x'; 71];
        assert!(MultipartReader::new(src, &long).is_err());
    }

    #[tokio::test]
    async fn iterates_two_parts() {
        let body: &[u8] = b"--B\r\nfirst\r\n--B\r\nsecond\r\n--B--\r\n";
        let mut reader = MultipartReader::new(body, b"B").unwrap();

        assert!(reader.next_part().await.unwrap());
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            let n = reader.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"first");

        assert!(reader.next_part().await.unwrap());
        out.clear();
        loop {
            let n = reader.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"second");

        assert!(!reader.next_part().await.unwrap());
    }

    #[tokio::test]
    async fn missing_boundary_before_any_crossing_fails() {
        let body: &[u8] = b"no boundary here at all";
        let mut reader = MultipartReader::new(body, b"B").unwrap();
        assert!(reader.next_part().await.is_err());
    }
}
