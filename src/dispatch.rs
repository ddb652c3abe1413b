//! Method dispatch over a matched [`ContextInfo`] ([spec §4.10]).

use std::collections::HashSet;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::headers::{standard, HeaderValue};
use crate::http::{Method, StatusCode};
use crate::request::Request;
use crate::response::Response;
use crate::service::Handler;
use crate::vhost::{ContextInfo, VirtualHost};

/// Resolve `req`'s path against `host`, invoke the matching handler (or none, for the
/// server-wide `OPTIONS *` pseudo-context and the fallback-status cases), and ensure a
/// response has been sent by the time this returns.
pub async fn dispatch<R, W>(
    req: &mut Request<R>,
    res: &mut Response<W>,
    host: &VirtualHost,
    handlers: &[Box<dyn Handler<R, W>>],
) -> io::Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let method = req.method();
    let path = req.path().unwrap_or("").to_string();

    if path == "*" {
        if method == Method::OPTIONS {
            set_allow_header(res, host.supported_methods());
            return res.send_headers(StatusCode::OK, Some(0), None, None).await;
        }
        return res.send_error(StatusCode::BAD_REQUEST, None).await;
    }

    let ctx = host.get_context(&path);

    if method == Method::GET || ctx.handler(method).is_some() {
        let status = invoke_with_directory_index(ctx, method, &path, host, req, res, handlers).await?;
        return finish_handler_status(res, status).await;
    }

    if method == Method::HEAD {
        let status = invoke_with_directory_index(ctx, Method::GET, &path, host, req, res, handlers).await?;
        return finish_handler_status(res, status).await;
    }

    if method == Method::TRACE {
        return trace_response(req, res).await;
    }

    let mut allowed: HashSet<Method> = [Method::GET, Method::HEAD, Method::TRACE, Method::OPTIONS].into();
    allowed.extend(ctx.methods());
    set_allow_header(res, allowed.into_iter());

    if method == Method::OPTIONS {
        return res.send_headers(StatusCode::OK, Some(0), None, None).await;
    }

    if host.supported_methods().any(|m| m == method) {
        res.send_error(StatusCode::METHOD_NOT_ALLOWED, None).await
    } else {
        res.send_error(StatusCode::NOT_IMPLEMENTED, None).await
    }
}

/// Invoke `ctx`'s handler for `method`, rewriting `original_path` to
/// `original_path + directoryIndex` first if it ends with `/` and the host has one
/// configured, restoring the original path and retrying once if that first attempt
/// comes back `404` ([spec §4.10]).
async fn invoke_with_directory_index<R, W>(
    ctx: &ContextInfo,
    method: Method,
    original_path: &str,
    host: &VirtualHost,
    req: &mut Request<R>,
    res: &mut Response<W>,
    handlers: &[Box<dyn Handler<R, W>>],
) -> io::Result<i32>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let Some(index) = host.directory_index().filter(|_| original_path.ends_with('/')) else {
        return invoke(ctx, method, req, res, handlers).await;
    };

    req.set_path_override(Some(format!("{original_path}{index}")));
    let status = invoke(ctx, method, req, res, handlers).await?;
    if status == 404 && !res.headers_sent() {
        req.set_path_override(None);
        return invoke(ctx, method, req, res, handlers).await;
    }
    req.set_path_override(None);
    Ok(status)
}

async fn invoke<R, W>(
    ctx: &ContextInfo,
    method: Method,
    req: &mut Request<R>,
    res: &mut Response<W>,
    handlers: &[Box<dyn Handler<R, W>>],
) -> io::Result<i32>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    match ctx.handler(method) {
        Some(index) => handlers[index].serve(req, res).await,
        None => Ok(404),
    }
}

/// A non-zero handler status means "send a default error response", but only if the
/// handler hasn't already written one itself ([spec §4.10]/[spec §6]).
async fn finish_handler_status<W: AsyncWrite + Unpin>(res: &mut Response<W>, status: i32) -> io::Result<()> {
    if status == 0 || res.headers_sent() {
        return Ok(());
    }
    let code = StatusCode::from_u16(status as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    res.send_error(code, None).await
}

fn set_allow_header<W: AsyncWrite + Unpin>(res: &mut Response<W>, methods: impl Iterator<Item = Method>) {
    let mut names: Vec<&'static str> = methods.map(|m| m.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    let value = HeaderValue::try_copy_from_string(&names.join(", ")).unwrap();
    res.headers_mut().insert(standard::ALLOW, value);
}

/// `200`, `Content-Type: message/http`, request-line + header block echoed back as the
/// body, then the request body streamed after it ([spec §4.10]).
async fn trace_response<R, W>(req: &mut Request<R>, res: &mut Response<W>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let target = match req.path() {
        Some(path) => match req.target().query() {
            Some(q) => format!("{path}?{q}"),
            None => path.to_string(),
        },
        None => "*".to_string(),
    };

    let mut head = format!("{} {target} {}\r\n", req.method().as_str(), req.version().as_str());
    for (name, value) in req.headers().iter() {
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(value.as_str());
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    res.send_headers(StatusCode::OK, None, Some("message/http"), None).await?;
    res.send_body(head.as_bytes()).await?;

    let mut chunk = [0u8; 4096];
    loop {
        let n = req.body().read(&mut chunk).await.map_err(io::Error::from)?;
        if n == 0 {
            break;
        }
        res.send_body(&chunk[..n]).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Version;
    use crate::response::ClientCapabilities;
    use crate::service::BoxFuture;

    struct Fixed(i32);
    impl<R, W> Handler<R, W> for Fixed
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        fn serve<'a>(&'a self, _req: &'a mut Request<R>, res: &'a mut Response<W>) -> BoxFuture<'a, io::Result<i32>> {
            let status = self.0;
            Box::pin(async move {
                if status == 0 {
                    res.send(StatusCode::OK, "ok").await?;
                }
                Ok(status)
            })
        }
    }

    async fn build_request(raw: &'static [u8]) -> Request<&'static [u8]> {
        Request::parse(raw, false, "localhost".into(), 80).await.unwrap()
    }

    fn build_response() -> Response<Vec<u8>> {
        Response::new(Vec::new(), Version::HTTP_11, ClientCapabilities::default(), false)
    }

    #[tokio::test]
    async fn dispatches_get_to_matching_handler() {
        let mut host = VirtualHost::new(None);
        host.add_context("/hi", Method::GET, 0);
        let handlers: Vec<Box<dyn Handler<&[u8], Vec<u8>>>> = vec![Box::new(Fixed(0))];

        let mut req = build_request(b"GET /hi HTTP/1.1\r\nHost: h\r\n\r\n").await;
        let mut res = build_response();
        dispatch(&mut req, &mut res, &host, &handlers).await.unwrap();
        assert!(res.headers_sent());
    }

    #[tokio::test]
    async fn unregistered_method_yields_405_when_host_supports_it_elsewhere() {
        let mut host = VirtualHost::new(None);
        host.add_context("/only-post", Method::POST, 0);
        host.add_context("/elsewhere", Method::DELETE, 0);
        let handlers: Vec<Box<dyn Handler<&[u8], Vec<u8>>>> = vec![Box::new(Fixed(0))];

        let mut req = build_request(b"DELETE /only-post HTTP/1.1\r\nHost: h\r\n\r\n").await;
        let mut res = build_response();
        dispatch(&mut req, &mut res, &host, &handlers).await.unwrap();
        assert!(res.headers_sent());
    }

    #[tokio::test]
    async fn unregistered_method_yields_501_when_host_never_supports_it() {
        let mut host = VirtualHost::new(None);
        host.add_context("/only-get", Method::GET, 0);
        let handlers: Vec<Box<dyn Handler<&[u8], Vec<u8>>>> = vec![Box::new(Fixed(0))];

        let mut req = build_request(b"PATCH /only-get HTTP/1.1\r\nHost: h\r\n\r\n").await;
        let mut res = build_response();
        dispatch(&mut req, &mut res, &host, &handlers).await.unwrap();
        assert!(res.headers_sent());
    }

    #[tokio::test]
    async fn server_wide_options_reports_host_supported_methods() {
        let mut host = VirtualHost::new(None);
        host.add_context("/a", Method::GET, 0);
        host.add_context("/b", Method::POST, 0);
        let handlers: Vec<Box<dyn Handler<&[u8], Vec<u8>>>> = vec![Box::new(Fixed(0))];

        let mut req = build_request(b"OPTIONS * HTTP/1.1\r\nHost: h\r\n\r\n").await;
        let mut res = build_response();
        dispatch(&mut req, &mut res, &host, &handlers).await.unwrap();
        assert!(res.headers_sent());
    }

    #[tokio::test]
    async fn directory_index_rewrite_falls_back_on_404() {
        struct OnlyExact;
        impl<R, W> Handler<R, W> for OnlyExact
        where
            R: AsyncRead + Unpin + Send,
            W: AsyncWrite + Unpin + Send,
        {
            fn serve<'a>(&'a self, req: &'a mut Request<R>, res: &'a mut Response<W>) -> BoxFuture<'a, io::Result<i32>> {
                Box::pin(async move {
                    if req.path() == Some("/dir/") {
                        res.send(StatusCode::OK, "listing").await?;
                        Ok(0)
                    } else {
                        Ok(404)
                    }
                })
            }
        }

        let mut host = VirtualHost::new(None);
        host.set_directory_index(Some("index.html"));
        host.add_context("/dir", Method::GET, 0);
        let handlers: Vec<Box<dyn Handler<&[u8], Vec<u8>>>> = vec![Box::new(OnlyExact)];

        let mut req = build_request(b"GET /dir/ HTTP/1.1\r\nHost: h\r\n\r\n").await;
        let mut res = build_response();
        dispatch(&mut req, &mut res, &host, &handlers).await.unwrap();
        assert!(res.headers_sent());
    }
}
