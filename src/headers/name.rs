use crate::matches::is_token;

// ===== HeaderName =====

/// HTTP Header name.
///
/// Comparison and hashing are case-insensitive; the stored representation is always
/// lowercase (standard names are lowercase string literals, owned names are lowercased
/// on construction).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HeaderName {
    repr: Repr,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Standard(&'static str),
    Owned(Box<str>),
}

impl HeaderName {
    /// Used in iterator placeholders.
    pub(crate) const PLACEHOLDER: Self = Self {
        repr: Repr::Standard(""),
    };

    /// Create a new [`HeaderName`] from a byte slice, validating and lowercasing it.
    pub fn from_bytes(name: &[u8]) -> Result<Self, InvalidHeaderName> {
        if name.is_empty() || !name.iter().all(|&b| is_token(b)) {
            return Err(InvalidHeaderName { _priv: () });
        }
        if name.iter().all(u8::is_ascii_lowercase) {
            // SAFETY: `is_token` is a subset of ASCII
            let s = unsafe { str::from_utf8_unchecked(name) };
            return Ok(Self { repr: Repr::Owned(s.into()) });
        }
        let lower: String = name.iter().map(|b| b.to_ascii_lowercase() as char).collect();
        Ok(Self { repr: Repr::Owned(lower.into_boxed_str()) })
    }

    /// Extracts a string slice of the header name.
    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Standard(s) => s,
            Repr::Owned(s) => s,
        }
    }
}

impl std::str::FromStr for HeaderName {
    type Err = InvalidHeaderName;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

impl PartialEq<str> for HeaderName {
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HeaderName").field(&self.as_str()).finish()
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Ref/Owned conversion traits, mirroring the map's key bounds =====

/// A type that can be used to look up a header by name without taking ownership.
pub trait AsHeaderName: SealedRef {}
pub(crate) trait SealedRef {
    fn matches(&self, name: &HeaderName) -> bool;
}

impl<K: AsHeaderName + ?Sized> AsHeaderName for &K {}
impl<S: SealedRef + ?Sized> SealedRef for &S {
    fn matches(&self, name: &HeaderName) -> bool {
        S::matches(self, name)
    }
}

impl AsHeaderName for str {}
impl SealedRef for str {
    fn matches(&self, name: &HeaderName) -> bool {
        name.as_str().eq_ignore_ascii_case(self)
    }
}

impl AsHeaderName for HeaderName {}
impl SealedRef for HeaderName {
    fn matches(&self, name: &HeaderName) -> bool {
        self.as_str().eq_ignore_ascii_case(name.as_str())
    }
}

/// A type that can be converted into an owned [`HeaderName`] for insertion.
pub trait IntoHeaderName: Sealed {}
pub(crate) trait Sealed {
    fn into_header_name(self) -> HeaderName;
}

impl IntoHeaderName for HeaderName {}
impl Sealed for HeaderName {
    fn into_header_name(self) -> HeaderName {
        self
    }
}

impl IntoHeaderName for &str {}
impl Sealed for &str {
    fn into_header_name(self) -> HeaderName {
        HeaderName::from_bytes(self.as_bytes())
            .unwrap_or_else(|e| e.panic_const())
    }
}

// ===== Error =====

/// An error returned when a header name contains bytes outside the HTTP `token` grammar.
#[non_exhaustive]
#[derive(Debug)]
pub struct InvalidHeaderName {
    _priv: (),
}

impl InvalidHeaderName {
    const fn panic_const(&self) -> ! {
        panic!("invalid header name")
    }
}

impl std::error::Error for InvalidHeaderName {}

impl std::fmt::Display for InvalidHeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid header name")
    }
}

// ===== Constants =====

// https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers

standard_header! {
    // ===== General =====

    /// Controls whether the network connection stays open after the current transaction finishes.
    pub const CONNECTION: HeaderName = "connection";
    /// Controls how long a persistent connection should stay open.
    pub const KEEP_ALIVE: HeaderName = "keep-alive";
    /// The size of the message body, in bytes.
    pub const CONTENT_LENGTH: HeaderName = "content-length";
    /// The form of encoding used to transfer the body safely to the user.
    pub const TRANSFER_ENCODING: HeaderName = "transfer-encoding";
    /// Indicates the client's willingness to accept a `1xx` informational response.
    pub const EXPECT: HeaderName = "expect";
    /// Specifies the domain name of the server and the TCP port on which it is listening.
    pub const HOST: HeaderName = "host";
    /// The date and time at which the message was originated.
    pub const DATE: HeaderName = "date";
    /// Identifies the software handling the request on the origin server.
    pub const SERVER: HeaderName = "server";
    /// A second request header that permits one-time, non-cacheable upgrades.
    pub const UPGRADE: HeaderName = "upgrade";

    // ===== Authentication =====

    /// Defines the authentication method that should be used to access a resource.
    pub const WWW_AUTHENTICATE: HeaderName = "www-authenticate";
    /// Contains the credentials to authenticate a user-agent with a server.
    pub const AUTHORIZATION: HeaderName = "authorization";

    // ===== Caching =====

    /// The time, in seconds, that the object has been in a proxy cache.
    pub const AGE: HeaderName = "age";
    /// Directives for caching mechanisms in both requests and responses.
    pub const CACHE_CONTROL: HeaderName = "cache-control";
    /// The date/time after which the response is considered stale.
    pub const EXPIRES: HeaderName = "expires";

    // ===== Conditionals =====

    /// The last modification date of the resource, used to compare several versions of the
    /// same resource. It is less accurate than ETag, but easier to calculate in some
    /// environments. Conditional requests using If-Modified-Since and If-Unmodified-Since
    /// use this value to change the behavior of the request.
    pub const LAST_MODIFIED: HeaderName = "last-modified";
    /// A unique string identifying the version of the resource. Conditional requests using
    /// If-Match and If-None-Match use this value to change the behavior of the request.
    pub const ETAG: HeaderName = "etag";
    /// Makes the request conditional, and applies the method only if the stored resource
    /// matches one of the given ETags.
    pub const IF_MATCH: HeaderName = "if-match";
    /// Makes the request conditional, and applies the method only if the stored resource
    /// doesn't match any of the given ETags.
    pub const IF_NONE_MATCH: HeaderName = "if-none-match";
    /// Makes the request conditional, and expects the resource to be transmitted only if it
    /// has been modified after the given date.
    pub const IF_MODIFIED_SINCE: HeaderName = "if-modified-since";
    /// Makes the request conditional, and expects the resource to be transmitted only if it
    /// has not been modified after the given date.
    pub const IF_UNMODIFIED_SINCE: HeaderName = "if-unmodified-since";
    /// Makes a range request conditional on the given validator not having changed.
    pub const IF_RANGE: HeaderName = "if-range";
    /// Determines how to match request headers to decide whether a cached response can be
    /// used rather than requesting a fresh one from the origin server.
    pub const VARY: HeaderName = "vary";

    // ===== Range requests =====

    /// Indicates if the server supports range requests, and if so in which unit the range
    /// can be expressed.
    pub const ACCEPT_RANGES: HeaderName = "accept-ranges";
    /// Indicates the part of a document that the server should return.
    pub const RANGE: HeaderName = "range";
    /// Indicates where in a full body message a partial message belongs.
    pub const CONTENT_RANGE: HeaderName = "content-range";

    // ===== Content negotiation =====

    /// Informs the server about the types of data that can be sent back.
    pub const ACCEPT: HeaderName = "accept";
    /// The encoding algorithm, usually a compression algorithm, that can be used on the
    /// resource sent back.
    pub const ACCEPT_ENCODING: HeaderName = "accept-encoding";
    /// Informs the server about the human language the server is expected to send back.
    pub const ACCEPT_LANGUAGE: HeaderName = "accept-language";
    /// Used to specify the compression algorithm, if any, applied to the representation.
    pub const CONTENT_ENCODING: HeaderName = "content-encoding";
    /// Indicates the media type of the resource.
    pub const CONTENT_TYPE: HeaderName = "content-type";
    /// Indicates an alternate location for the returned data, or a newly created resource.
    pub const LOCATION: HeaderName = "location";
    /// An opaque identifier for a specific version of a resource, used for multipart
    /// `Content-Disposition` and similar fields.
    pub const CONTENT_DISPOSITION: HeaderName = "content-disposition";
    /// Indicates that the client prefers an encrypted and authenticated response.
    pub const ORIGIN: HeaderName = "origin";
    /// Lists the set of methods supported by a resource, sent with `405` and `OPTIONS`
    /// responses.
    pub const ALLOW: HeaderName = "allow";
}

// ===== Macros =====

macro_rules! standard_header {
    (
        $(
            $(#[$doc:meta])*
            pub const $id:ident: $t:ty = $name:literal;
        )*
    ) => {
        pub mod standards {
            pub use {$(super::$id),*};
        }
        $(
            $(#[$doc])*
            pub const $id: $t = HeaderName {
                repr: Repr::Standard($name),
            };
        )*
    };
}

use standard_header;
