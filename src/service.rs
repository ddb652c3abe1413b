//! The user-defined logic abstraction ([spec §6]): a [`Handler`] is whatever the
//! embedding application registers against a [`crate::vhost::VirtualHost`] context.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::request::Request;
use crate::response::Response;

/// A boxed, `Send` future borrowing at most `'a`, matching the inline convention used
/// throughout this family of crates rather than a crate-provided alias.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of request-handling logic registered at a host/path/method combination.
///
/// `serve` returns `0` when it has already written a complete response; any other
/// value tells the dispatcher to send a default error response with that status
/// ([spec §4.10]), which only happens if the handler has not yet sent headers.
pub trait Handler<R, W>: Send + Sync
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn serve<'a>(
        &'a self,
        req: &'a mut Request<R>,
        res: &'a mut Response<W>,
    ) -> BoxFuture<'a, io::Result<i32>>;

    /// Optional shutdown hook, invoked once per handler when the owning
    /// [`crate::server::Server`] is stopped ([spec §5]'s "AutoCloseable handler
    /// coupling").
    fn close(&self) {}
}

impl<R, W, F, Fut> Handler<R, W> for F
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    F: Fn(&mut Request<R>, &mut Response<W>) -> Fut + Send + Sync,
    Fut: Future<Output = io::Result<i32>> + Send,
{
    fn serve<'a>(
        &'a self,
        req: &'a mut Request<R>,
        res: &'a mut Response<W>,
    ) -> BoxFuture<'a, io::Result<i32>> {
        Box::pin(self(req, res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{StatusCode, Version};
    use crate::response::ClientCapabilities;

    #[tokio::test]
    async fn plain_async_fn_satisfies_handler() {
        async fn ok_handler(
            _req: &mut Request<&[u8]>,
            res: &mut Response<Vec<u8>>,
        ) -> io::Result<i32> {
            res.send(StatusCode::OK, "hi").await?;
            Ok(0)
        }

        let raw: &[u8] = b"GET / HTTP/1.1\r\nHost: h\r\n\r\n";
        let mut req = Request::parse(raw, false, "localhost".into(), 80).await.unwrap();
        let mut res = Response::new(Vec::new(), Version::HTTP_11, ClientCapabilities::default(), false);
        let status = Handler::serve(&ok_handler, &mut req, &mut res).await.unwrap();
        assert_eq!(status, 0);
    }
}
