//! # Server and Client Toolkit
//!
//! This library provide a toolkit for building a server and client for various different
//! protocols.
//!
//! # Library Design
//!
//! This library is design so that it can be used as building block for writing a server.
//! Additionally, it also provide a ready to use API that combine all components to run a server.
//! It can also be used as an example to use and integrate each available components.
//!
//! ## Definitions
//!
//! - [`uri`] Uniform Resource Identifier ([RFC3986])
//! - [`headers`] HTTP Header Fields ([RFC9110 Section 5])
//! - [`http`] HTTP Semantics ([RFC9110])
//! - [`body`] Message body framing ([RFC9112 Section 6])
//!
//! ## Behaviors
//!
//! - [`request`] HTTP/1.1 request parsing ([RFC9112])
//! - [`response`] HTTP/1.1 response writing
//! - [`vhost`] virtual-host and context routing tables
//! - [`dispatch`] method dispatch over a matched context
//! - [`connection`] per-socket request/response loop
//!
//! ## User Abstraction
//!
//! - [`service`] abstract user defined logic
//!
//! ## Integrations
//!
//! - [`server`] all in one API to run a http server
//!
//! # Usage
//!
//! User can use each APIs individually to build custom server, or use available APIs from
//! [`server`] to quickly run a server.
//!
//! [RFC3986]: <https://www.rfc-editor.org/rfc/rfc3986.html>
//! [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html>
//! [RFC9110 Section 5]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-fields>
//! [RFC9112]: <https://www.rfc-editor.org/rfc/rfc9112.html>
//! [RFC9112 Section 6]: <https://datatracker.ietf.org/doc/html/rfc9112#section-6>
#![warn(missing_debug_implementations)]

mod log;
mod matches;

// definitions
pub mod uri;
pub mod headers;
pub mod http;
pub mod body;

// HTTP protocol
pub mod request;
pub mod response;
pub mod vhost;
pub mod dispatch;
pub mod connection;

// user abstraction
pub mod service;

// integration
pub mod server;
