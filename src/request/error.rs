use std::fmt;

use crate::body::BodyError;
use crate::uri::UriError;

/// Errors that can occur while parsing a request line, header block, or
/// request-target. Every variant maps to a client-visible status in the connection
/// loop (400 in all cases but [`RequestError::TooManyHeaders`], which is also 400).
#[derive(Debug)]
pub enum RequestError {
    /// End-of-stream before any byte of a request line arrived — an idle connection
    /// closing between requests, not a protocol violation.
    NoRequestLine,
    /// The request line was not exactly three SP-delimited tokens.
    MalformedRequestLine,
    /// The request-target was not a valid origin/absolute/authority/asterisk form.
    MalformedTarget(UriError),
    /// The method token contained bytes outside the HTTP `token` grammar.
    MalformedMethod,
    /// The declared HTTP version token was not recognized.
    MalformedVersion,
    /// A header line was neither `name: value` nor a folded continuation.
    MalformedHeader,
    /// More than 100 header lines were sent.
    TooManyHeaders,
    /// Propagated failure from the line reader or body framing.
    Body(BodyError),
}

impl From<BodyError> for RequestError {
    fn from(e: BodyError) -> Self {
        Self::Body(e)
    }
}

impl From<UriError> for RequestError {
    fn from(e: UriError) -> Self {
        Self::MalformedTarget(e)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRequestLine => f.write_str("connection closed before a request line arrived"),
            Self::MalformedRequestLine => f.write_str("malformed request line"),
            Self::MalformedTarget(e) => write!(f, "malformed request-target: {e}"),
            Self::MalformedMethod => f.write_str("malformed method"),
            Self::MalformedVersion => f.write_str("malformed HTTP version"),
            Self::MalformedHeader => f.write_str("malformed header field"),
            Self::TooManyHeaders => f.write_str("too many header lines"),
            Self::Body(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Body(e) => Some(e),
            _ => None,
        }
    }
}

/// `true` if end-of-stream was reached before any bytes of a request line arrived —
/// the connection loop treats this as an idle-timeout close, not a protocol error.
impl RequestError {
    pub fn is_missing_request_line(&self) -> bool {
        matches!(self, Self::NoRequestLine)
    }
}
