//! Message body framing ([RFC9112 Section 6]) and `multipart/form-data` parsing.
//!
//! [RFC9112 Section 6]: <https://datatracker.ietf.org/doc/html/rfc9112#section-6>

mod chunked_reader;
mod chunked_writer;
mod error;
mod limited;
mod multipart;

pub mod token_reader;

pub use chunked_reader::ChunkedReader;
pub use chunked_writer::ChunkedWriter;
pub use error::BodyError;
pub use limited::LimitedReader;
pub use multipart::MultipartReader;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::headers::HeaderMap;

/// A request or response body, framed one of three ways per [RFC9112 Section 6.3]:
/// `Transfer-Encoding: chunked`, a declared `Content-Length`, or (request-side only,
/// and only for a non-identity `Transfer-Encoding` without `chunked`) read until the
/// connection closes.
///
/// [RFC9112 Section 6.3]: <https://datatracker.ietf.org/doc/html/rfc9112#section-6.3>
#[derive(Debug)]
pub enum InputStream<R> {
    Chunked(ChunkedReader<R>),
    Limited(LimitedReader<R>),
    UntilClose(R),
}

impl<R: AsyncRead + Unpin> InputStream<R> {
    /// Read up to `buf.len()` bytes of body data. Returns `0` at the end of the body.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, BodyError> {
        match self {
            Self::Chunked(r) => r.read(buf).await,
            Self::Limited(r) => Ok(r.read(buf).await?),
            Self::UntilClose(r) => Ok(r.read(buf).await?),
        }
    }

    /// Read and discard the rest of the body, so the next request on this
    /// connection (if any) can be read cleanly. A no-op for [`UntilClose`][Self::UntilClose],
    /// since that framing only occurs when the connection is about to close anyway.
    pub async fn drain(&mut self) -> Result<(), BodyError> {
        match self {
            Self::Chunked(r) => r.drain().await,
            Self::Limited(r) => Ok(r.drain().await?),
            Self::UntilClose(_) => Ok(()),
        }
    }

    /// Trailer header fields collected after a chunked body's terminating chunk.
    /// Empty for the other framings, or before the body has been fully read.
    pub fn take_trailers(&mut self) -> HeaderMap {
        match self {
            Self::Chunked(r) => r.take_trailers(),
            _ => HeaderMap::new(),
        }
    }

    /// Consume `self`, returning the underlying stream, so the connection loop can
    /// reuse it for the next request.
    pub fn into_inner(self) -> R {
        match self {
            Self::Chunked(r) => r.into_inner(),
            Self::Limited(r) => r.into_inner(),
            Self::UntilClose(r) => r,
        }
    }
}
