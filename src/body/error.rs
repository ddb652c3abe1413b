use std::fmt;
use std::io;

/// Errors produced by the body-framing readers and writers in [`crate::body`].
#[derive(Debug)]
pub enum BodyError {
    /// A line exceeded the caller-supplied maximum length.
    TokenTooLarge,
    /// End-of-stream was reached while a delimiter was still expected.
    UnexpectedEof,
    /// A chunk size line was not a valid hex number.
    MalformedChunkSize,
    /// The stream ended before the declared chunk or content length was satisfied.
    BodyTruncated,
    /// A multipart boundary was not found before end-of-stream, or exceeded the
    /// 1-70 byte limit allowed by the boundary buffer.
    MissingBoundary,
    /// Writing to a [`ChunkedWriter`](super::ChunkedWriter) after its trailing chunk was sent.
    WriterClosed,
    /// Propagated I/O failure from the underlying stream.
    Io(io::Error),
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenTooLarge => f.write_str("token too large"),
            Self::UnexpectedEof => f.write_str("unexpected end of stream"),
            Self::MalformedChunkSize => f.write_str("malformed chunk size"),
            Self::BodyTruncated => f.write_str("body truncated before declared size"),
            Self::MissingBoundary => f.write_str("missing boundary"),
            Self::WriterClosed => f.write_str("write after trailing chunk"),
            Self::Io(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BodyError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BodyError> for io::Error {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
