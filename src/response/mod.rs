//! HTTP/1.1 response writing.
//!
//! [`Response`] is a thin, single-owner wrapper over a connection's write half. It
//! tracks just enough state (has the head been sent, should the body be discarded,
//! is the framing chunked) to implement the contract below; everything else is decided
//! at [`send_headers`][Response::send_headers] time from the request's negotiated
//! capabilities.

mod compress;
mod conditional;

pub use conditional::{apply_if_range, evaluate, parse_range, ByteRange, Validators};
#[cfg(feature = "compression")]
pub use compress::{is_compressible, negotiate, Encoder};

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::body::ChunkedWriter;
use crate::headers::{standard, HeaderMap, HeaderValue};
use crate::http::date;
use crate::http::{StatusCode, Version};

/// What the client told us it can accept, gathered from the request before the
/// [`Response`] is constructed (`Connection`, `Accept-Encoding`, HTTP version).
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub supports_chunked: bool,
    pub accept_encoding: Option<String>,
}

enum Sink<W> {
    Pending(W),
    Identity(W),
    Chunked(ChunkedWriter<W>),
    /// Transient placeholder occupied only for the instant [`send_headers`] is
    /// upgrading `Pending` into `Identity`/`Chunked`.
    ///
    /// [`send_headers`]: Response::send_headers
    Transitioning,
}

/// A response under construction, or being streamed, for a single request.
///
/// Created per request by the connection loop and closed by it after the handler
/// returns ([spec §4.7] / [spec §4.11]).
#[derive(Debug)]
pub struct Response<W> {
    sink: Sink<W>,
    version: Version,
    caps: ClientCapabilities,
    headers: HeaderMap,
    headers_sent: bool,
    discard_body: bool,
    connection_close: bool,
    #[cfg(feature = "compression")]
    encoder: Option<compress::Encoder>,
}

impl<W: AsyncWrite + Unpin> Response<W> {
    /// `discard_body` is set for HEAD requests: headers are emitted normally but no
    /// body bytes ever reach the wire.
    pub fn new(out: W, version: Version, caps: ClientCapabilities, discard_body: bool) -> Self {
        Self {
            sink: Sink::Pending(out),
            version,
            caps,
            headers: HeaderMap::new(),
            headers_sent: false,
            discard_body,
            connection_close: false,
            #[cfg(feature = "compression")]
            encoder: None,
        }
    }

    /// `true` once [`send_headers`][Self::send_headers] has run; further calls are a
    /// no-op.
    #[inline]
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// `true` if this transaction must close the connection afterward — either the
    /// caller asked (e.g. [`send_error`][Self::send_error]) or `Connection: close` was
    /// set before the head went out.
    #[inline]
    pub fn wants_close(&self) -> bool {
        self.connection_close
    }

    /// Headers to include in the upcoming head, in addition to the ones
    /// [`send_headers`][Self::send_headers] computes itself (`Date`, `Server`,
    /// `Content-Length`/`Transfer-Encoding`, ...). No-op once the head has been sent.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Emit `HTTP/<version> <status> <reason>` followed by the header block and a
    /// blank line ([spec §4.7]).
    ///
    /// `length` is the resource's full (uncompressed, unranged) size, if known.
    /// `range`, if present, narrows the body to `[range.start, range.end]` and
    /// substitutes `206 Partial Content` for `status`, emitting `Content-Range`.
    /// Compression (gzip/deflate, per [`negotiate`]/[`is_compressible`]) forces
    /// chunked framing, since the compressed length isn't known in advance.
    ///
    /// Idempotent: a second call is a no-op.
    pub async fn send_headers(
        &mut self,
        status: StatusCode,
        length: Option<u64>,
        content_type: Option<&str>,
        range: Option<ByteRange>,
    ) -> io::Result<()> {
        if self.headers_sent {
            return Ok(());
        }
        self.headers_sent = true;

        let mut status = status;
        self.headers.insert(standard::DATE, HeaderValue::try_copy_from_slice(&date::httpdate_now()).unwrap());
        self.headers.insert(standard::SERVER, HeaderValue::try_copy_from_string("embers").unwrap());

        if let Some(ct) = content_type {
            self.headers.insert(standard::CONTENT_TYPE, HeaderValue::try_copy_from_string(ct).unwrap());
        }

        #[cfg(feature = "compression")]
        let use_compression = {
            let compressible = content_type.map(is_compressible).unwrap_or(false) && range.is_none();
            let coding = if compressible { self.caps.accept_encoding.as_deref().and_then(negotiate) } else { None };
            match coding {
                Some(coding) => {
                    self.encoder = Encoder::for_coding(coding);
                    self.headers.insert(standard::CONTENT_ENCODING, HeaderValue::try_copy_from_string(coding).unwrap());
                    self.headers.append(standard::VARY, HeaderValue::try_copy_from_string("Accept-Encoding").unwrap());
                    true
                }
                None => false,
            }
        };
        #[cfg(not(feature = "compression"))]
        let use_compression = false;

        let body_len = if let Some(r) = range {
            status = StatusCode::PARTIAL_CONTENT;
            let total = length.unwrap_or(0);
            self.headers.insert(
                standard::CONTENT_RANGE,
                HeaderValue::try_copy_from_string(&format!("bytes {}-{}/{total}", r.start, r.end)).unwrap(),
            );
            Some(r.len())
        } else {
            length
        };

        let chunked = use_compression || (body_len.is_none() && self.caps.supports_chunked && !self.version.is_legacy());

        if chunked {
            self.headers.insert(standard::TRANSFER_ENCODING, HeaderValue::try_copy_from_string("chunked").unwrap());
        } else if let Some(len) = body_len {
            self.headers.insert(
                standard::CONTENT_LENGTH,
                HeaderValue::try_copy_from_string(itoa::Buffer::new().format(len)).unwrap(),
            );
        } else {
            self.connection_close = true;
        }

        if self.connection_close {
            self.headers.insert(standard::CONNECTION, HeaderValue::try_copy_from_string("close").unwrap());
        }

        let mut out = match std::mem::replace(&mut self.sink, Sink::Transitioning) {
            Sink::Pending(out) => out,
            _ => unreachable!("send_headers called twice despite headers_sent guard"),
        };
        write_head(&mut out, self.version, status, &self.headers).await?;

        self.sink = if chunked { Sink::Chunked(ChunkedWriter::new(out)) } else { Sink::Identity(out) };
        Ok(())
    }

    /// Stream `data` as (a slice of) the body. No-op if [`discard_body`][Self::new] was
    /// requested (HEAD). Panics if called before [`send_headers`][Self::send_headers].
    pub async fn send_body(&mut self, data: &[u8]) -> io::Result<()> {
        if self.discard_body {
            return Ok(());
        }

        #[cfg(feature = "compression")]
        let staged;
        #[cfg(feature = "compression")]
        let data = match &mut self.encoder {
            Some(enc) => {
                staged = enc.write(data)?;
                &staged[..]
            }
            None => data,
        };

        match &mut self.sink {
            Sink::Identity(out) => out.write_all(data).await,
            Sink::Chunked(w) => w.write(data).await.map_err(io::Error::from),
            Sink::Pending(_) => panic!("send_body called before send_headers"),
            Sink::Transitioning => unreachable!("transient sink state observed outside send_headers"),
        }
    }

    /// Shorthand for a small in-memory response: `text/html; charset=utf-8`, UTF-8
    /// bytes, headers and body in one call.
    pub async fn send(&mut self, status: StatusCode, text: &str) -> io::Result<()> {
        let bytes = text.as_bytes();
        self.send_headers(status, Some(bytes.len() as u64), Some("text/html; charset=utf-8"), None).await?;
        self.send_body(bytes).await
    }

    /// Default error body: escaped `text` (or the status reason if `None`), the status
    /// reason phrase, and a link back to the host root. Sets `Connection: close` for
    /// any status `>= 400` ([spec §4.7]/[spec §7]).
    pub async fn send_error(&mut self, status: StatusCode, text: Option<&str>) -> io::Result<()> {
        if status.status() >= 400 {
            self.connection_close = true;
        }
        let message = text.unwrap_or_else(|| status.message());
        let body = format!(
            "<html><head><title>{code} {reason}</title></head>\
             <body><h1>{code} {reason}</h1><p>{msg}</p><hr><a href=\"/\">{reason}</a></body></html>",
            code = status.status(),
            reason = status.message(),
            msg = escape_html(message),
        );
        self.send(status, &body).await
    }

    /// 301 (`permanent`) or 302 redirect to `url`, with a zero-length body.
    pub async fn redirect(&mut self, url: &str, permanent: bool) -> io::Result<()> {
        let status = if permanent { StatusCode::MOVED_PERMANENTLY } else { StatusCode::FOUND };
        self.headers.insert(standard::LOCATION, HeaderValue::try_copy_from_string(url).unwrap());
        self.send_headers(status, Some(0), None, None).await
    }

    /// Flush the body sink: emits the trailing chunk if chunked, else just flushes.
    /// Does not close the underlying transport — the connection loop owns that.
    pub async fn close(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Identity(out) => out.flush().await,
            Sink::Chunked(w) => w.close().await.map_err(io::Error::from),
            Sink::Pending(out) => out.flush().await,
            Sink::Transitioning => unreachable!("transient sink state observed outside send_headers"),
        }
    }

    /// Write an interim `100 Continue` status line ([spec §4.11] preprocessing), ahead
    /// of the final response this `Response` will still go on to send. Only valid
    /// before [`send_headers`][Self::send_headers].
    pub async fn send_continue(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Pending(out) => {
                out.write_all(format!("{} 100 Continue\r\n\r\n", self.version.as_str()).as_bytes()).await?;
                out.flush().await
            }
            _ => unreachable!("send_continue called after send_headers"),
        }
    }

    /// Consume `self`, returning the underlying transport so the connection loop can
    /// reuse it for the next request.
    pub fn into_inner(self) -> W {
        match self.sink {
            Sink::Pending(out) | Sink::Identity(out) => out,
            Sink::Chunked(w) => w.into_inner(),
            Sink::Transitioning => unreachable!("transient sink state observed outside send_headers"),
        }
    }
}

async fn write_head<W: AsyncWrite + Unpin>(
    out: &mut W,
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
) -> io::Result<()> {
    let head = format!("{} {} {}\r\n", version.as_str(), status.status(), status.message());
    out.write_all(head.as_bytes()).await?;
    for (name, value) in headers.iter() {
        out.write_all(name.as_str().as_bytes()).await?;
        out.write_all(b": ").await?;
        out.write_all(value.as_bytes()).await?;
        out.write_all(b"\r\n").await?;
    }
    out.write_all(b"\r\n").await?;
    out.flush().await
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(chunked: bool) -> ClientCapabilities {
        ClientCapabilities { supports_chunked: chunked, accept_encoding: None }
    }

    #[tokio::test]
    async fn sends_a_simple_response_with_content_length() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.send(StatusCode::OK, "ok").await.unwrap();
        res.close().await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("content-length: 2"));
        assert!(text.ends_with("\r\n\r\nok"));
    }

    #[tokio::test]
    async fn second_send_headers_call_is_a_no_op() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.send_headers(StatusCode::OK, Some(0), None, None).await.unwrap();
        assert!(res.headers_sent());
        res.send_headers(StatusCode::NOT_FOUND, Some(0), None, None).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn head_request_suppresses_body_bytes() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), true);
        res.send_headers(StatusCode::OK, Some(2), Some("text/plain"), None).await.unwrap();
        res.send_body(b"ok").await.unwrap();
        res.close().await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("content-length: 2"));
        assert!(!text.ends_with("ok"));
    }

    #[tokio::test]
    async fn unknown_length_uses_chunked_framing_when_supported() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.send_headers(StatusCode::OK, None, Some("text/plain"), None).await.unwrap();
        res.send_body(b"hi").await.unwrap();
        res.close().await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("transfer-encoding: chunked"));
        assert!(text.ends_with("2\r\nhi\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn range_emits_206_and_content_range() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.send_headers(StatusCode::OK, Some(100), Some("text/plain"), Some(ByteRange { start: 0, end: 9 }))
            .await
            .unwrap();
        res.send_body(b"0123456789").await.unwrap();
        res.close().await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 206 Partial Content\r\n"));
        assert!(text.contains("content-range: bytes 0-9/100"));
        assert!(text.contains("content-length: 10"));
    }

    #[tokio::test]
    async fn redirect_sets_location_and_empty_body() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.redirect("/new", false).await.unwrap();
        res.close().await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 302 Found\r\n"));
        assert!(text.contains("location: /new"));
    }

    #[tokio::test]
    async fn send_error_sets_connection_close_and_escapes_text() {
        let mut out = Vec::new();
        let mut res = Response::new(&mut out, Version::HTTP_11, caps(true), false);
        res.send_error(StatusCode::BAD_REQUEST, Some("<bad>")).await.unwrap();
        res.close().await.unwrap();
        assert!(res.wants_close());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("connection: close"));
        assert!(text.contains("&lt;bad&gt;"));
    }
}
