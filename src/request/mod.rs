//! HTTP/1.1 request parsing ([RFC9112]).
//!
//! [RFC9112]: <https://www.rfc-editor.org/rfc/rfc9112.html>

mod error;
mod headers_block;
mod line;
mod target;

pub use error::RequestError;
pub use line::RequestLine;
pub use target::RequestTarget;

use std::cell::OnceCell;

use tokio::io::AsyncRead;

use crate::body::{ChunkedReader, InputStream, LimitedReader};
use crate::headers::{standard, HeaderMap};
use crate::http::{Method, Version};
use crate::uri::decode;

/// Cap on a single request-line or header line, in bytes. Generous enough for any
/// real client; exists to bound memory against a hostile one.
const MAX_LINE_LEN: usize = 8192;

/// Cap on `application/x-www-form-urlencoded` body bytes consumed by [`Request::params`].
const MAX_FORM_BODY: usize = 2 * 1024 * 1024;

/// A parsed HTTP/1.1 request, still attached to the connection's transport for
/// streaming the body.
#[derive(Debug)]
pub struct Request<R> {
    method: Method,
    target: RequestTarget,
    version: Version,
    headers: HeaderMap,
    body: InputStream<R>,
    is_secure: bool,
    local_host: String,
    local_port: u16,
    base_url: OnceCell<String>,
    path_override: Option<String>,
}

impl<R: AsyncRead + Unpin> Request<R> {
    /// Read the request line and header block from `transport`, then select body
    /// framing per [RFC9112 Section 6.3] and hand the transport to the resulting
    /// [`InputStream`]. `is_secure`/`local_host`/`local_port` stand in for the
    /// injected socket factory used by [`Request::base_url`].
    ///
    /// [RFC9112 Section 6.3]: <https://datatracker.ietf.org/doc/html/rfc9112#section-6.3>
    pub async fn parse(
        mut transport: R,
        is_secure: bool,
        local_host: String,
        local_port: u16,
    ) -> Result<Self, RequestError> {
        let line = line::read_request_line(&mut transport, MAX_LINE_LEN).await?;
        let headers = headers_block::read_header_block(&mut transport).await?;
        let body = select_body_framing(&headers, transport);

        Ok(Self {
            method: line.method,
            target: line.target,
            version: line.version,
            headers,
            body,
            is_secure,
            local_host,
            local_port,
            base_url: OnceCell::new(),
            path_override: None,
        })
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[inline]
    pub fn body(&mut self) -> &mut InputStream<R> {
        &mut self.body
    }

    /// The path this request resolves to for context lookup. `None` only for
    /// `CONNECT`'s authority-form target. Reflects [`set_path_override`][Self::set_path_override]
    /// when set, which the dispatcher uses for the directory-index rewrite ([spec §4.10]).
    pub fn path(&self) -> Option<&str> {
        self.path_override.as_deref().or_else(|| self.target.path())
    }

    /// Temporarily substitute the path the dispatcher and handler see, without
    /// touching the original request-target. Pass `None` to restore it.
    pub fn set_path_override(&mut self, path: Option<String>) {
        self.path_override = path;
    }

    /// Consume `self`, returning the underlying transport so the connection loop can
    /// reuse it for the next request on this connection.
    pub fn into_transport(self) -> R {
        self.body.into_inner()
    }

    /// Merge any trailer fields collected after a chunked body into the request's
    /// headers, duplicate names concatenated with `", "` as in the header block
    /// itself. Call after the body has been fully read or drained.
    pub fn adopt_trailers(&mut self) {
        let trailers = self.body.take_trailers();
        for (name, value) in trailers.iter() {
            match self.headers.get(name).map(|v| v.as_str().to_owned()) {
                Some(existing) => {
                    let combined = format!("{existing}, {}", value.as_str());
                    self.headers.insert(
                        name.clone(),
                        crate::headers::HeaderValue::try_copy_from_string(&combined).unwrap(),
                    );
                }
                None => self.headers.append(name.clone(), value.clone()),
            }
        }
    }

    /// Resolve and cache this request's base URL ([spec §4.6] step 4): scheme from
    /// the injected socket factory, host from the request-target's authority, else
    /// the `Host` header, else the detected local hostname — with any port suffix
    /// stripped — and the connection's local port.
    pub fn base_url(&self) -> &str {
        self.base_url.get_or_init(|| {
            let scheme = if self.is_secure { "https" } else { "http" };
            let host = self.authority_host().unwrap_or(&self.local_host);
            format!("{scheme}://{host}:{}", self.local_port)
        })
    }

    fn authority_host(&self) -> Option<&str> {
        if let RequestTarget::Absolute(uri) = &self.target {
            return Some(strip_port(uri.as_authority().host()));
        }
        if let RequestTarget::Authority(auth) = &self.target {
            return Some(strip_port(auth.host()));
        }
        self.headers
            .get(standard::HOST)
            .and_then(|v| v.try_as_str().ok())
            .map(strip_port)
    }

    /// Decode `application/x-www-form-urlencoded` parameters from the request-target's
    /// query string, and (if the `Content-Type` matches) from the body up to a 2 MiB
    /// cap. Order is preserved; the body, if consumed, cannot be read again.
    ///
    /// [spec §4.6] step 5.
    pub async fn params(&mut self) -> Result<Vec<(String, String)>, RequestError> {
        let mut params = Vec::new();
        if let Some(query) = self.target.query() {
            decode_form(query, &mut params)?;
        }

        let is_form_body = self
            .headers
            .get(standard::CONTENT_TYPE)
            .and_then(|v| v.try_as_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or("").trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form_body {
            let mut body_bytes = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = self.body.read(&mut chunk).await.map_err(RequestError::Body)?;
                if n == 0 {
                    break;
                }
                body_bytes.extend_from_slice(&chunk[..n]);
                if body_bytes.len() > MAX_FORM_BODY {
                    break;
                }
            }
            let body_str = String::from_utf8_lossy(&body_bytes);
            decode_form(&body_str, &mut params)?;
        }

        Ok(params)
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host;
    }
    host.split(':').next().unwrap_or(host)
}

fn decode_form(query: &str, out: &mut Vec<(String, String)>) -> Result<(), RequestError> {
    if query.is_empty() {
        return Ok(());
    }
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode::decode_lossy(k).map_err(|_| RequestError::MalformedHeader)?;
        let value = decode::decode_lossy(v).map_err(|_| RequestError::MalformedHeader)?;
        out.push((key, value));
    }
    Ok(())
}

fn select_body_framing<R: AsyncRead + Unpin>(headers: &HeaderMap, transport: R) -> InputStream<R> {
    if let Some(te) = headers.get(standard::TRANSFER_ENCODING).and_then(|v| v.try_as_str().ok()) {
        let tokens: Vec<&str> = te.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
        let is_identity_only = tokens.len() == 1 && tokens[0].eq_ignore_ascii_case("identity");
        if !is_identity_only {
            if tokens.iter().any(|t| t.eq_ignore_ascii_case("chunked")) {
                return InputStream::Chunked(ChunkedReader::new(transport));
            }
            return InputStream::UntilClose(transport);
        }
    }

    let len = headers
        .get(standard::CONTENT_LENGTH)
        .and_then(|v| v.try_as_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    InputStream::Limited(LimitedReader::new(transport, len, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_a_full_request_with_content_length_body() {
        let raw: &[u8] = b"POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello";
        let mut req = Request::parse(raw, false, "localhost".into(), 8080).await.unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), Some("/submit"));
        let mut body = Vec::new();
        let mut chunk = [0u8; 16];
        loop {
            let n = req.body().read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn selects_chunked_framing() {
        let raw: &[u8] =
            b"POST /x HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let mut req = Request::parse(raw, false, "localhost".into(), 80).await.unwrap();
        assert!(matches!(req.body(), InputStream::Chunked(_)));
        let mut body = Vec::new();
        let mut chunk = [0u8; 16];
        loop {
            let n = req.body().read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn base_url_prefers_absolute_form_authority() {
        let raw: &[u8] = b"GET http://proxy.example/page HTTP/1.1\r\nHost: ignored\r\n\r\n";
        let req = Request::parse(raw, false, "localhost".into(), 80).await.unwrap();
        assert_eq!(req.base_url(), "http://proxy.example:80");
    }

    #[tokio::test]
    async fn base_url_falls_back_to_host_header() {
        let raw: &[u8] = b"GET /p HTTP/1.1\r\nHost: example.com:9000\r\n\r\n";
        let req = Request::parse(raw, true, "localhost".into(), 443).await.unwrap();
        assert_eq!(req.base_url(), "https://example.com:443");
    }

    #[tokio::test]
    async fn params_decode_query_and_preserve_order() {
        let raw: &[u8] = b"GET /p?a=1&b=2 HTTP/1.1\r\nHost: h\r\n\r\n";
        let mut req = Request::parse(raw, false, "localhost".into(), 80).await.unwrap();
        let params = req.params().await.unwrap();
        assert_eq!(params, vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn params_decode_form_body() {
        let raw: &[u8] = b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 7\r\n\r\nx=1&y=2";
        let mut req = Request::parse(raw, false, "localhost".into(), 80).await.unwrap();
        let params = req.params().await.unwrap();
        assert_eq!(params, vec![("x".to_string(), "1".to_string()), ("y".to_string(), "2".to_string())]);
    }
}
