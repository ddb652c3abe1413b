//! Uniform Resource Identifier ([RFC3986])
//!
//! [RFC3986]: <https://datatracker.ietf.org/doc/html/rfc3986>
//!
//! # Percent Encoding
//!
//! Components here are not automatically percent-decoded; use [`decode`] on the `str`
//! returned by an accessor when decoding is needed (request paths, form fields).

mod authority;
mod error;
mod path;
mod scheme;
#[allow(clippy::module_inception)]
mod uri;

pub mod decode;

pub use authority::Authority;
pub use error::UriError;
pub use path::Path;
pub use scheme::Scheme;
pub use uri::Uri;
