use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Wraps a source stream, exposing exactly `n` bytes of it (or however many remain
/// before end-of-stream, if `tolerant`). Used for `Content-Length`-framed request and
/// response bodies.
///
/// Reading past the limit always yields EOF; it never touches the underlying stream
/// again. [`LimitedReader::drain`] exhausts any unread bytes without closing the
/// underlying stream, so a subsequent request on the same connection can read cleanly.
#[derive(Debug)]
pub struct LimitedReader<R> {
    inner: R,
    remaining: u64,
    tolerant: bool,
}

impl<R: AsyncRead + Unpin> LimitedReader<R> {
    /// `n` is the declared length (e.g. from `Content-Length`). When `tolerant` is
    /// true, reaching end-of-stream before `n` bytes is not an error — fewer bytes are
    /// simply returned.
    pub fn new(inner: R, n: u64, tolerant: bool) -> Self {
        Self { inner, remaining: n, tolerant }
    }

    /// Number of bytes not yet read.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Read a single byte, or `None` at the limit or end-of-stream.
    pub async fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use tokio::io::AsyncReadExt;
        if self.remaining == 0 {
            return Ok(None);
        }
        let mut b = [0u8; 1];
        match self.inner.read_exact(&mut b).await {
            Ok(_) => {
                self.remaining -= 1;
                Ok(Some(b[0]))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && self.tolerant => {
                self.remaining = 0;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Skip up to `n` bytes without returning them. Returns the number actually skipped.
    pub async fn skip(&mut self, n: u64) -> io::Result<u64> {
        use tokio::io::AsyncReadExt;
        let to_skip = n.min(self.remaining);
        let mut buf = [0u8; 4096];
        let mut skipped = 0u64;
        while skipped < to_skip {
            let chunk = (to_skip - skipped).min(buf.len() as u64) as usize;
            match self.inner.read(&mut buf[..chunk]).await {
                Ok(0) if self.tolerant => break,
                Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
                Ok(n) => skipped += n as u64,
                Err(e) => return Err(e),
            }
        }
        self.remaining -= skipped;
        Ok(skipped)
    }

    /// Discard any unread bytes so the underlying stream is left positioned exactly
    /// after this body. Does not close the underlying stream.
    pub async fn drain(&mut self) -> io::Result<()> {
        let remaining = self.remaining;
        self.skip(remaining).await?;
        Ok(())
    }

    /// Consume `self`, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LimitedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining == 0 {
            return Poll::Ready(Ok(()));
        }

        let max = (self.remaining.min(buf.remaining() as u64)) as usize;
        let mut sliced = buf.take(max);
        let ptr = sliced.filled().as_ptr();
        match Pin::new(&mut self.inner).poll_read(cx, &mut sliced) {
            Poll::Ready(Ok(())) => {
                assert_eq!(sliced.filled().as_ptr(), ptr, "Take::poll_read must not swap the buffer");
                let n = sliced.filled().len();
                // SAFETY: `n` bytes were just initialized by the inner reader above.
                unsafe {
                    buf.assume_init(n);
                }
                buf.advance(n);
                if n == 0 && max > 0 && !self.tolerant {
                    self.remaining = 0;
                    return Poll::Ready(Err(io::Error::from(io::ErrorKind::UnexpectedEof)));
                }
                self.remaining -= n as u64;
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn reads_exactly_n_bytes() {
        let src: &[u8] = b"hello world";
        let mut limited = LimitedReader::new(src, 5, false);
        let mut out = Vec::new();
        limited.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn drain_exhausts_without_closing_source() {
        let src: &[u8] = b"abcdefghij";
        let mut limited = LimitedReader::new(src, 10, false);
        limited.read_byte().await.unwrap();
        limited.drain().await.unwrap();
        assert_eq!(limited.remaining(), 0);
        let rest = limited.into_inner();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn tolerant_limit_past_eos_is_not_an_error() {
        let src: &[u8] = b"ab";
        let mut limited = LimitedReader::new(src, 10, true);
        let mut out = Vec::new();
        limited.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"ab");
    }
}
