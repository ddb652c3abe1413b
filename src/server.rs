//! All-in-one API to run an HTTP server ([spec §6]/[spec §6a]).
//!
//! [`ServerBuilder`] assembles the configuration surface — bind address, read
//! timeout, optional TLS, executor handle, virtual hosts and their handlers — with a
//! chained builder, matching the rest of this crate's `with_capacity`/`new`-style
//! construction. Host and handler tables are only mutable before [`ServerBuilder::build`];
//! [`Server::run`] reads them concurrently from every connection task without locking.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::connection::{run_connection, Prefixed};
use crate::service::{BoxFuture, Handler};
use crate::vhost::{HostTable, VirtualHost};

/// Any stream a connection can be driven over once accepted, whether plain TCP or
/// wrapped by an injected [`TlsAcceptor`]. A blanket impl, not something implementors
/// write by hand.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// The uniform per-connection stream type [`Server`] hands to [`run_connection`],
/// after any TLS wrapping has already happened.
pub type BoxedTransport = Pin<Box<dyn Transport>>;

type ConnHandler = dyn Handler<Prefixed<ReadHalf<BoxedTransport>>, WriteHalf<BoxedTransport>>;

/// Injected TLS, standing in for the spec's "socket factory" ([spec §1] non-goal:
/// certificate management is the caller's concern, not this crate's).
pub trait TlsAcceptor: Send + Sync {
    fn accept(&self, stream: TcpStream) -> BoxFuture<'static, io::Result<BoxedTransport>>;
}

/// Assembles a [`Server`]: bind address, timeouts, TLS, executor, and every virtual
/// host with its handlers. Configuration is only valid before [`build`][Self::build] —
/// matching spec §5's "only safe before start()".
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    read_timeout: Duration,
    tls: Option<Arc<dyn TlsAcceptor>>,
    runtime: Option<Handle>,
    hosts: HostTable,
    handlers: Vec<Box<ConnHandler>>,
    local_host: String,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            addr: None,
            read_timeout: Duration::from_secs(30),
            tls: None,
            runtime: None,
            hosts: HostTable::new(),
            handlers: Vec::new(),
            local_host: "localhost".to_string(),
        }
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address to listen on. Required before [`build`][Self::build].
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Socket read timeout, applied per byte-probe and per in-flight parse
    /// ([spec §5]). Defaults to 30 seconds.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Wrap every accepted connection through `acceptor` before the connection loop
    /// sees it. Absent, connections are served in plaintext.
    pub fn tls(mut self, acceptor: Arc<dyn TlsAcceptor>) -> Self {
        self.tls = Some(acceptor);
        self
    }

    /// Runtime on which each accepted connection's task is spawned. Defaults to the
    /// handle of the runtime [`build`][Self::build] is called from.
    pub fn runtime_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// The hostname reported by [`crate::request::Request::base_url`] when no `Host`
    /// header or absolute-form target supplies one. Defaults to `"localhost"`.
    pub fn local_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = host.into();
        self
    }

    /// Register a handler and get back the index to pass to
    /// [`VirtualHost::add_context`].
    pub fn add_handler<H>(&mut self, handler: H) -> usize
    where
        H: Handler<Prefixed<ReadHalf<BoxedTransport>>, WriteHalf<BoxedTransport>> + 'static,
    {
        self.handlers.push(Box::new(handler));
        self.handlers.len() - 1
    }

    /// Register a named virtual host with its aliases ([spec §4.9]).
    pub fn virtual_host(mut self, host: VirtualHost, aliases: &[&str]) -> Self {
        self.hosts.insert(host, aliases);
        self
    }

    /// Register the default (unnamed) virtual host, used when no `Host` value
    /// matches any named one.
    pub fn default_host(mut self, host: VirtualHost) -> Self {
        self.hosts.insert(host, &[]);
        self
    }

    /// Bind the listener and produce a [`Server`] ready to [`run`][Server::run].
    pub async fn build(self) -> io::Result<Server> {
        let addr = self.addr.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no bind address configured"))?;
        let listener = TcpListener::bind(addr).await?;
        let local_port = listener.local_addr()?.port();
        let runtime = self.runtime.unwrap_or_else(Handle::current);

        Ok(Server {
            listener,
            read_timeout: self.read_timeout,
            tls: self.tls,
            runtime,
            host_table: Arc::new(self.hosts),
            handlers: Arc::new(self.handlers),
            local_host: self.local_host,
            local_port,
            shutdown: Arc::new(Notify::new()),
        })
    }
}

/// A bound, configured acceptor. One task runs [`Server::run`]'s accept loop; each
/// accepted connection is spawned as its own task ([spec §5]'s "grow-on-demand worker
/// pool, injectable").
pub struct Server {
    listener: TcpListener,
    read_timeout: Duration,
    tls: Option<Arc<dyn TlsAcceptor>>,
    runtime: Handle,
    host_table: Arc<HostTable>,
    handlers: Arc<Vec<Box<ConnHandler>>>,
    local_host: String,
    local_port: u16,
    shutdown: Arc<Notify>,
}

impl Server {
    /// The address actually bound (useful when `bind` was given port `0`).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until [`stop`][Self::stop] is called. Accept errors are
    /// logged and do not end the loop ([spec §4.12]).
    pub async fn run(&self) -> io::Result<()> {
        crate::log::info!("listening on {:?}", self.listener.local_addr());
        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.notified() => {
                    crate::log::info!("server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let stream = match accepted {
                Ok((stream, _)) => stream,
                Err(err) => {
                    crate::log::debug!("accept error: {err}");
                    continue;
                }
            };
            let _ = stream.set_nodelay(true);

            let tls = self.tls.clone();
            let is_secure = tls.is_some();
            let read_timeout = self.read_timeout;
            let local_host = self.local_host.clone();
            let local_port = self.local_port;
            let host_table = self.host_table.clone();
            let handlers = self.handlers.clone();

            self.runtime.spawn(async move {
                let transport: BoxedTransport = match tls {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(t) => t,
                        Err(err) => {
                            crate::log::debug!("tls handshake failed: {err}");
                            return;
                        }
                    },
                    None => Box::pin(stream),
                };
                run_connection(transport, read_timeout, is_secure, local_host, local_port, host_table, handlers).await;
            });
        }
    }

    /// Stop the accept loop and call every registered handler's optional
    /// [`Handler::close`] ([spec §5]/[spec §9]'s "AutoCloseable handler coupling").
    /// Connections already in flight are left to finish on their own.
    pub fn stop(&self) {
        self.shutdown.notify_waiters();
        for handler in self.handlers.iter() {
            handler.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use crate::request::Request;
    use crate::response::Response;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn ok_handler<R: AsyncRead + Unpin + Send, W: AsyncWrite + Unpin + Send>(
        _req: &mut Request<R>,
        res: &mut Response<W>,
    ) -> io::Result<i32> {
        res.send(StatusCode::OK, "ok").await?;
        Ok(0)
    }

    #[tokio::test]
    async fn builder_requires_a_bind_address() {
        let err = ServerBuilder::new().build().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn server_accepts_and_serves_a_request() {
        let mut builder = ServerBuilder::new().bind("127.0.0.1:0".parse().unwrap());
        let idx = builder.add_handler(ok_handler::<Prefixed<ReadHalf<BoxedTransport>>, WriteHalf<BoxedTransport>>);
        let mut host = VirtualHost::new(None);
        host.add_context("/", crate::http::Method::GET, idx);
        let builder = builder.default_host(host);
        let server = builder.build().await.unwrap();
        let addr = server.local_addr().unwrap();

        let server = Arc::new(server);
        let run_server = server.clone();
        let task = tokio::spawn(async move { run_server.run().await });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream.write_all(b"GET / HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n").await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("ok"));

        server.stop();
        let _ = task.await;
    }

    #[test]
    fn stop_invokes_close_on_every_handler() {
        let called = Arc::new(AtomicUsize::new(0));

        struct CountingHandler(Arc<AtomicUsize>);
        impl<R: AsyncRead + Unpin + Send, W: AsyncWrite + Unpin + Send> Handler<R, W> for CountingHandler {
            fn serve<'a>(&'a self, _req: &'a mut Request<R>, _res: &'a mut Response<W>) -> BoxFuture<'a, io::Result<i32>> {
                Box::pin(async { Ok(0) })
            }
            fn close(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mut builder = ServerBuilder::new().bind("127.0.0.1:0".parse().unwrap());
            builder.add_handler(CountingHandler(called.clone()));
            let server = builder.build().await.unwrap();
            server.stop();
        });

        assert_eq!(called.load(Ordering::SeqCst), 1);
    }
}
