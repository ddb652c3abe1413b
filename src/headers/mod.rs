//! HTTP Header Fields ([RFC9110 Section 5]).
//!
//! [RFC9110 Section 5]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-fields>

mod field;
mod iter;
mod map;
mod name;
mod value;

pub use field::{GetAll, HeaderField};
pub use iter::Iter;
pub use map::{AsHeaderName, HeaderMap, IntoHeaderName};
pub use name::{standards as standard, HeaderName, InvalidHeaderName};
pub use value::{HeaderValue, InvalidHeaderValue};
