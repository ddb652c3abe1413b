//! Per-socket request/response loop ([spec §4.11]).

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf, ReadHalf, WriteHalf};

use crate::headers::standard;
use crate::http::{Method, StatusCode, Version};
use crate::request::Request;
use crate::response::{ClientCapabilities, Response};
use crate::service::Handler;
use crate::vhost::HostTable;

/// `R` with one already-read byte spliced back onto the front, so probing for
/// connection idleness doesn't lose that byte to the request parser.
pub(crate) struct Prefixed<R> {
    byte: Option<u8>,
    inner: R,
}

impl<R: AsyncRead + Unpin> AsyncRead for Prefixed<R> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if let Some(b) = this.byte.take() {
            buf.put_slice(&[b]);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Drive one accepted socket until the connection should close: strictly one
/// request/response at a time, looping until `Connection: close` (from either side)
/// or a pre-HTTP/1.1 version ([spec §4.11]/[spec §5]).
pub async fn run_connection<S>(
    socket: S,
    read_timeout: Duration,
    is_secure: bool,
    local_host: String,
    local_port: u16,
    host_table: Arc<HostTable>,
    handlers: Arc<Vec<Box<dyn Handler<Prefixed<ReadHalf<S>>, WriteHalf<S>>>>>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut reader, mut writer) = split(socket);

    loop {
        // Probe for a single byte under the timeout first, so an idle connection
        // between requests closes silently while a timeout partway through an
        // in-flight request still gets a 408 ([spec §5]).
        let mut probe = [0u8; 1];
        let first_byte = match tokio::time::timeout(read_timeout, reader.read(&mut probe)).await {
            Ok(Ok(0)) => return,
            Ok(Ok(_)) => Some(probe[0]),
            Ok(Err(_)) => return,
            Err(_) => {
                crate::log::debug!("idle connection timed out, closing");
                return;
            }
        };

        let prefixed = Prefixed { byte: first_byte, inner: reader };
        let parsed = match tokio::time::timeout(
            read_timeout,
            Request::parse(prefixed, is_secure, local_host.clone(), local_port),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                crate::log::debug!("read timeout mid-request, sending 408");
                let mut res = Response::new(writer, Version::HTTP_11, ClientCapabilities::default(), false);
                let _ = res.send_error(StatusCode::REQUEST_TIMEOUT, None).await;
                let _ = res.close().await;
                return;
            }
        };

        let mut req = match parsed {
            Ok(req) => req,
            Err(err) => {
                if err.is_missing_request_line() {
                    crate::log::debug!("connection closed between requests");
                } else {
                    crate::log::debug!("malformed request: {err}");
                    let mut res = Response::new(writer, Version::HTTP_11, ClientCapabilities::default(), false);
                    let _ = res.send_error(StatusCode::BAD_REQUEST, None).await;
                    let _ = res.close().await;
                }
                return;
            }
        };

        let version = req.version();
        let caps = ClientCapabilities {
            supports_chunked: !version.is_legacy(),
            accept_encoding: req
                .headers()
                .get(standard::ACCEPT_ENCODING)
                .and_then(|v| v.try_as_str().ok())
                .map(str::to_owned),
        };
        let discard_body = req.method() == Method::HEAD;
        let mut res = Response::new(writer, version, caps, discard_body);

        match preprocess(&mut req, &mut res).await {
            Ok(()) => {
                let host_name = host_name_for(&req);
                match host_table.resolve(&host_name) {
                    Some(host) => {
                        if let Err(err) = crate::dispatch::dispatch(&mut req, &mut res, host, &handlers[..]).await {
                            crate::log::debug!("i/o error serving request: {err}");
                            if res.headers_sent() {
                                // Mid-body I/O failure: the head is already on the
                                // wire, so there is nothing left to do but drop the
                                // connection ([spec §7]).
                                return;
                            }
                            let _ = res.send_error(StatusCode::INTERNAL_SERVER_ERROR, None).await;
                        }
                    }
                    None => {
                        let _ = res.send_error(StatusCode::NOT_FOUND, None).await;
                    }
                }
            }
            Err(status) => {
                let _ = res.send_error(status, None).await;
            }
        }

        let _ = res.close().await;
        let _ = req.body().drain().await;
        req.adopt_trailers();

        let should_close = res.wants_close() || version.is_legacy() || connection_header_requests_close(req.headers());

        writer = res.into_inner();
        reader = req.into_transport().inner;

        if should_close {
            return;
        }
    }
}

/// `HTTP/1.1` without `Host` → 400. `Expect: 100-continue` → interim `100`. Any other
/// `Expect` → 417. Pre-1.1 versions have legacy connection-token headers stripped
/// instead ([spec §4.11] preprocess).
async fn preprocess<R, W>(req: &mut Request<R>, res: &mut Response<W>) -> Result<(), StatusCode>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if req.version() == Version::HTTP_11 {
        if req.headers().get(standard::HOST).is_none() {
            return Err(StatusCode::BAD_REQUEST);
        }
        if let Some(expect) = req.headers().get(standard::EXPECT).and_then(|v| v.try_as_str().ok()) {
            if expect.eq_ignore_ascii_case("100-continue") {
                let _ = res.send_continue().await;
            } else {
                return Err(StatusCode::EXPECTATION_FAILED);
            }
        }
        return Ok(());
    }

    if req.version() == Version::HTTP_10 || req.version() == Version::HTTP_09 {
        if let Some(tokens) = req.headers().get(standard::CONNECTION).and_then(|v| v.try_as_str().ok()).map(str::to_owned) {
            for token in tokens.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                req.headers_mut().remove(token);
            }
        }
        return Ok(());
    }

    Err(StatusCode::BAD_REQUEST)
}

fn connection_header_requests_close(headers: &crate::headers::HeaderMap) -> bool {
    headers
        .get(standard::CONNECTION)
        .and_then(|v| v.try_as_str().ok())
        .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case("close")))
        .unwrap_or(false)
}

/// The `Host` header with any port suffix stripped, or `""` (the default host) if
/// absent — preprocess already rejected HTTP/1.1 requests without one.
fn host_name_for<R>(req: &Request<R>) -> String {
    req.headers()
        .get(standard::HOST)
        .and_then(|v| v.try_as_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Version;
    use crate::response::ClientCapabilities;
    use std::io::Cursor;

    fn res(version: Version) -> Response<Vec<u8>> {
        Response::new(Vec::new(), version, ClientCapabilities::default(), false)
    }

    #[tokio::test]
    async fn http11_without_host_is_rejected() {
        let raw: &[u8] = b"GET / HTTP/1.1\r\n\r\n";
        let mut req = Request::parse(Cursor::new(raw), false, "localhost".into(), 80).await.unwrap();
        let mut r = res(Version::HTTP_11);
        assert_eq!(preprocess(&mut req, &mut r).await, Err(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn unsupported_expect_yields_417() {
        let raw: &[u8] = b"GET / HTTP/1.1\r\nHost: h\r\nExpect: unknown-thing\r\n\r\n";
        let mut req = Request::parse(Cursor::new(raw), false, "localhost".into(), 80).await.unwrap();
        let mut r = res(Version::HTTP_11);
        assert_eq!(preprocess(&mut req, &mut r).await, Err(StatusCode::EXPECTATION_FAILED));
    }

    #[tokio::test]
    async fn continue_expectation_emits_interim_response() {
        let raw: &[u8] = b"GET / HTTP/1.1\r\nHost: h\r\nExpect: 100-continue\r\n\r\n";
        let mut req = Request::parse(Cursor::new(raw), false, "localhost".into(), 80).await.unwrap();
        let mut r = res(Version::HTTP_11);
        assert_eq!(preprocess(&mut req, &mut r).await, Ok(()));
        assert!(!r.headers_sent());
    }

    #[tokio::test]
    async fn legacy_version_strips_connection_tokens() {
        let raw: &[u8] = b"GET / HTTP/1.0\r\nHost: h\r\nConnection: keep-alive\r\nKeep-Alive: timeout=5\r\n\r\n";
        let mut req = Request::parse(Cursor::new(raw), false, "localhost".into(), 80).await.unwrap();
        let mut r = res(Version::HTTP_10);
        assert_eq!(preprocess(&mut req, &mut r).await, Ok(()));
        assert!(req.headers().get(standard::KEEP_ALIVE).is_none());
    }

    #[test]
    fn close_token_detected_case_insensitively() {
        let mut headers = crate::headers::HeaderMap::new();
        headers.append(standard::CONNECTION, "Close".parse().unwrap());
        assert!(connection_header_requests_close(&headers));
    }

    #[tokio::test]
    async fn prefixed_reader_replays_probed_byte_then_inner_stream() {
        let mut reader = Prefixed { byte: Some(b'G'), inner: Cursor::new(b"ET / HTTP/1.1\r\n".to_vec()) };
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"GET / HTTP/1.1\r\n");
    }
}
