use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::headers::HeaderMap;

use super::error::BodyError;

/// Encodes an HTTP chunked transfer-coded body ([RFC9112 Section 7.1]).
///
/// Each [`write`][Self::write] call with a non-empty buffer emits one chunk
/// (`HEX-len CRLF bytes CRLF`); zero-length writes are ignored, since emitting an
/// empty chunk would terminate the body early. The trailing zero-length chunk is
/// emitted by [`finish`][Self::finish], with optional trailer headers, or implicitly
/// by [`close`][Self::close]. Writing after the trailing chunk has been sent fails.
///
/// [RFC9112 Section 7.1]: <https://datatracker.ietf.org/doc/html/rfc9112#section-7.1>
#[derive(Debug)]
pub struct ChunkedWriter<W> {
    inner: W,
    finished: bool,
}

impl<W: AsyncWrite + Unpin> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, finished: false }
    }

    /// Write one chunk. A call with an empty `buf` is a no-op.
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), BodyError> {
        if buf.is_empty() {
            return Ok(());
        }
        if self.finished {
            return Err(BodyError::WriterClosed);
        }
        let size_hex = format!("{:x}", buf.len());
        self.inner.write_all(size_hex.as_bytes()).await?;
        self.inner.write_all(b"\r\n").await?;
        self.inner.write_all(buf).await?;
        self.inner.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Emit the trailing zero-length chunk, with optional trailer headers, and flush.
    /// Idempotent: calling this again, or [`write`][Self::write] afterward, fails.
    pub async fn finish(&mut self, trailers: Option<&HeaderMap>) -> Result<(), BodyError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.inner.write_all(b"0\r\n").await?;
        if let Some(trailers) = trailers {
            for (name, value) in trailers.iter() {
                self.inner.write_all(name.as_str().as_bytes()).await?;
                self.inner.write_all(b": ").await?;
                self.inner.write_all(value.as_bytes()).await?;
                self.inner.write_all(b"\r\n").await?;
            }
        }
        self.inner.write_all(b"\r\n").await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Close the body: emits the trailing chunk (without trailers) if not already
    /// sent, then flushes. Does not close the underlying stream.
    pub async fn close(&mut self) -> Result<(), BodyError> {
        self.finish(None).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Consume `self`, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_one_chunk_per_write() {
        let mut out = Vec::new();
        {
            let mut w = ChunkedWriter::new(&mut out);
            w.write(b"Wiki").await.unwrap();
            w.write(b"pedia").await.unwrap();
            w.close().await.unwrap();
        }
        assert_eq!(out, b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn zero_length_write_is_ignored() {
        let mut out = Vec::new();
        {
            let mut w = ChunkedWriter::new(&mut out);
            w.write(b"").await.unwrap();
            w.write(b"x").await.unwrap();
            w.close().await.unwrap();
        }
        assert_eq!(out, b"1\r\nx\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let mut out = Vec::new();
        let mut w = ChunkedWriter::new(&mut out);
        w.close().await.unwrap();
        let err = w.write(b"late").await.unwrap_err();
        assert!(matches!(err, BodyError::WriterClosed));
    }
}
