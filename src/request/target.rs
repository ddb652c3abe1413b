use crate::uri::{Authority, Path, Scheme, Uri, UriError};

/// A parsed request-target ([RFC9112 Section 3.2]).
///
/// [RFC9112 Section 3.2]: <https://datatracker.ietf.org/doc/html/rfc9112#section-3.2>
#[derive(Debug, Clone)]
pub enum RequestTarget {
    /// `/where?q=now` — the ordinary form, used by every method except `CONNECT`.
    Origin(Path),
    /// `http://www.example.org/pub/WWW/TheProject.html` — used when talking to a proxy.
    Absolute(Uri),
    /// `www.example.com:80` — used only with `CONNECT`.
    Authority(Authority),
    /// `*` — used only with a server-wide `OPTIONS`.
    Asterisk,
}

impl RequestTarget {
    pub fn parse(target: &[u8]) -> Result<Self, UriError> {
        if target == b"*" {
            return Ok(Self::Asterisk);
        }
        if target.first() == Some(&b'/') {
            return Ok(Self::Origin(Path::try_from(&collapse_slashes(target))?));
        }
        if let Some(scheme_end) = target.iter().position(|&b| b == b':') {
            if target[scheme_end..].starts_with(b"://") {
                let scheme = Scheme::try_from(&target[..scheme_end])?;
                let rest = &target[scheme_end + 3..];
                let path_start = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
                let authority = Authority::try_from(&rest[..path_start])?;
                let path = if path_start == rest.len() {
                    Path::try_from(b"/")?
                } else {
                    Path::try_from(&collapse_slashes(&rest[path_start..]))?
                };
                return Ok(Self::Absolute(Uri::new(scheme, authority, path)));
            }
        }
        Ok(Self::Authority(Authority::try_from(target)?))
    }

    /// The path this target resolves to for context lookup, or `None` for
    /// `CONNECT`'s authority-form (no path is ever presented in that case).
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Origin(p) => Some(p.path()),
            Self::Absolute(u) => Some(u.path()),
            Self::Authority(_) => None,
            Self::Asterisk => Some("*"),
        }
    }

    /// This target's query string, e.g. `a=1&b=2`, or `None` if there is none or this
    /// form carries no query component at all.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Origin(p) => p.query(),
            Self::Absolute(u) => u.as_path().query(),
            Self::Authority(_) | Self::Asterisk => None,
        }
    }
}

/// Collapse runs of consecutive `/` into a single `/`, within the path component only
/// (the query string, if any, is left untouched).
fn collapse_slashes(target: &[u8]) -> Vec<u8> {
    let query_start = target.iter().position(|&b| b == b'?').unwrap_or(target.len());
    let (path, query) = target.split_at(query_start);
    let mut out = Vec::with_capacity(path.len() + query.len());
    let mut prev_slash = false;
    for &b in path {
        if b == b'/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(b);
    }
    out.extend_from_slice(query);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_origin_form() {
        let t = RequestTarget::parse(b"/over/there?name=ferret").unwrap();
        assert!(matches!(t, RequestTarget::Origin(_)));
        assert_eq!(t.path(), Some("/over/there"));
    }

    #[test]
    fn parses_absolute_form() {
        let t = RequestTarget::parse(b"http://example.com:8042/over/there?name=ferret").unwrap();
        match t {
            RequestTarget::Absolute(uri) => {
                assert_eq!(uri.scheme(), "http");
                assert_eq!(uri.authority(), "example.com:8042");
                assert_eq!(uri.path(), "/over/there");
            }
            _ => panic!("expected absolute-form"),
        }
    }

    #[test]
    fn parses_authority_form() {
        let t = RequestTarget::parse(b"www.example.com:80").unwrap();
        assert!(matches!(t, RequestTarget::Authority(_)));
        assert_eq!(t.path(), None);
    }

    #[test]
    fn parses_asterisk_form() {
        let t = RequestTarget::parse(b"*").unwrap();
        assert!(matches!(t, RequestTarget::Asterisk));
    }

    #[test]
    fn collapses_duplicate_slashes_in_path_only() {
        let t = RequestTarget::parse(b"//foo///bar?x=//y").unwrap();
        assert_eq!(t.path(), Some("/foo/bar"));
        match t {
            RequestTarget::Origin(p) => assert_eq!(p.query(), Some("x=//y")),
            _ => panic!("expected origin-form"),
        }
    }
}
