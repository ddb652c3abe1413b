use std::num::NonZeroU16;

/// HTTP [Status Code][rfc].
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

macro_rules! status_code_v3 {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            /// Returns the status code value, e.g: `200`.
            #[inline]
            pub const fn status(&self) -> u16 {
                self.0.get()
            }

            /// Returns the canonical reason phrase, e.g. `"OK"`, or `"Unknown Status"` for a
            /// code outside the table below (handlers may return arbitrary codes).
            #[inline]
            pub const fn message(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => $msg,
                    )*
                    _ => "Unknown Status",
                }
            }
        }

        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*
        }
    };
}

status_code_v3! {
    /// `100`. The server has received the request headers and the client should proceed to
    /// send the request body.
    100 CONTINUE "Continue";
    /// `101`. Sent in response to an `Upgrade` request header from the client and indicates
    /// the protocol the server is switching to.
    101 SWITCHING_PROTOCOL "Switching Protocols";
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `201`. The request succeeded, and a new resource was created as a result.
    201 CREATED "Created";
    /// `204`. There is no content to send for this request, but the headers are useful.
    204 NO_CONTENT "No Content";
    /// `206`. Delivers only part of the resource, per a `Range` request.
    206 PARTIAL_CONTENT "Partial Content";
    /// `301`. The URI of the requested resource has been changed permanently.
    301 MOVED_PERMANENTLY "Moved Permanently";
    /// `302`. The URI of requested resource has been changed temporarily.
    302 FOUND "Found";
    /// `303`. The server sent this response to direct the client to get the requested
    /// resource at another URI with a GET request.
    303 SEE_OTHER "See Other";
    /// `304`. Used for caching purposes; tells the client the cached response is still valid.
    304 NOT_MODIFIED "Not Modified";
    /// `307`. Directs the client to get the requested resource at another URI with the same
    /// method that was used in the prior request.
    307 TEMPORARY_REDIRECT "Temporary Redirect";
    /// `400`. The server cannot or will not process the request due to a perceived client
    /// error.
    400 BAD_REQUEST "Bad Request";
    /// `401`. Semantically means "unauthenticated".
    401 UNAUTHORIZED "Unauthorized";
    /// `403`. The client's identity is known, but it lacks access rights to the content.
    403 FORBIDDEN "Forbidden";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `405`. The request method is known but not supported by the target resource.
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    /// `406`. No representation satisfying content negotiation was found.
    406 NOT_ACCEPTABLE "Not Acceptable";
    /// `408`. Sent on an idle connection; the server would like to close it.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `411`. The server requires a `Content-Length` and it was not given.
    411 LENGTH_REQUIRED "Length Required";
    /// `412`. A conditional request's precondition was not met.
    412 PRECONDITION_FAILED "Precondition Failed";
    /// `413`. The request body is larger than the limit defined by the server.
    413 CONTENT_TOO_LARGE "Content Too Large";
    /// `414`. The URI requested is longer than the server is willing to interpret.
    414 URI_TOO_LONG "URI Too Long";
    /// `415`. The media format of the requested data is not supported by the server.
    415 UNSUPPORTED_MEDIA_TYPE "Unsupported Media Type";
    /// `416`. The ranges specified by the `Range` header cannot be satisfied.
    416 RANGE_NOT_SATISFIABLE "Range Not Satisfiable";
    /// `417`. The expectation given in the `Expect` header could not be met.
    417 EXPECTATION_FAILED "Expectation Failed";
    /// `431`. The request's header fields are too large.
    431 REQUEST_HEADER_FIELDS_TOO_LARGE "Request Header Fields Too Large";
    /// `500`. The server encountered a situation it does not know how to handle.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `501`. The request method is not supported and cannot be handled.
    501 NOT_IMPLEMENTED "Not Implemented";
    /// `503`. The server is not ready to handle the request.
    503 SERVICE_UNAVAILABLE "Service Unavailable";
    /// `505`. The HTTP version used in the request is not supported.
    505 HTTP_VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl StatusCode {
    /// Construct a [`StatusCode`] from an arbitrary `u16`, without requiring it to appear in
    /// the table above. Used at the `Handler` boundary, where a handler may return any
    /// status; [`message`][Self::message] falls back to `"Unknown Status"` for these.
    #[inline]
    pub fn from_u16(code: u16) -> Option<Self> {
        NonZeroU16::new(code).filter(|c| (100..1000).contains(&c.get())).map(Self)
    }

    /// Returns `true` for the `1xx` informational class.
    #[inline]
    pub const fn is_informational(&self) -> bool {
        self.status() / 100 == 1
    }

    /// Returns `true` for the `2xx` success class.
    #[inline]
    pub const fn is_success(&self) -> bool {
        self.status() / 100 == 2
    }

    /// Returns `true` for the `3xx` redirection class.
    #[inline]
    pub const fn is_redirection(&self) -> bool {
        self.status() / 100 == 3
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.status(), self.message())
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("StatusCode").field(&self.status()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::StatusCode;

    #[test]
    fn known_status_has_canonical_message() {
        assert_eq!(StatusCode::NOT_FOUND.message(), "Not Found");
        assert_eq!(StatusCode::NOT_FOUND.status(), 404);
    }

    #[test]
    fn arbitrary_status_falls_back() {
        let s = StatusCode::from_u16(499).unwrap();
        assert_eq!(s.message(), "Unknown Status");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(StatusCode::from_u16(0).is_none());
        assert!(StatusCode::from_u16(1000).is_none());
    }
}
