use super::{Authority, Path, Scheme};

/// HTTP [URI][rfc] in absolute-form, e.g. `http://example.com:8042/over/there?name=ferret`.
///
/// ```not_rust
///   http://example.com:8042/over/there?name=ferret
///   \__/   \______________/\_________/ \_________/
///    |           |            |            |
/// scheme     authority       path        query
/// ```
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc7230#section-2.7>
#[derive(Debug, Clone)]
pub struct Uri {
    scheme: Scheme,
    authority: Authority,
    path: Path,
}

impl Uri {
    pub(crate) const fn new(scheme: Scheme, authority: Authority, path: Path) -> Self {
        Self { scheme, authority, path }
    }

    #[inline]
    pub fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    #[inline]
    pub fn as_scheme(&self) -> &Scheme {
        &self.scheme
    }

    #[inline]
    pub fn authority(&self) -> &str {
        self.authority.as_str()
    }

    #[inline]
    pub fn as_authority(&self) -> &Authority {
        &self.authority
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.path.path()
    }

    #[inline]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn path_and_query(&self) -> &str {
        self.path.as_str()
    }
}
