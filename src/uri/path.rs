use crate::matches::is_query;
use crate::uri::UriError;

/// A URI path, with an optional query component.
#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    value: Box<str>,
    /// byte offset of the query component within `value`, or `value.len()` if absent
    query: u16,
}

impl Path {
    /// The `*` request-target used by `OPTIONS *`.
    pub fn asterisk() -> Self {
        Self { value: "*".into(), query: 1 }
    }

    pub fn empty() -> Self {
        Self { value: "".into(), query: 0 }
    }

    /// Parse a `path [ "?" query ]` target from a byte slice, validating both per RFC3986.
    ///
    /// Fragments (`#...`) are not legal in a request-target and are rejected rather than
    /// silently dropped, since a client sending one is already violating the wire format.
    pub fn try_from(value: &[u8]) -> Result<Self, UriError> {
        if value.is_empty() || value[0] != b'/' {
            return Err(UriError::Char);
        }
        let query = match value.iter().position(|&b| b == b'?') {
            Some(q) => {
                if !value[..q].iter().all(|&b| crate::matches::is_path(b))
                    || !value[q + 1..].iter().all(|&b| is_query(b))
                {
                    return Err(UriError::Char);
                }
                q
            }
            None => {
                if !value.iter().all(|&b| crate::matches::is_path(b)) {
                    return Err(UriError::Char);
                }
                value.len()
            }
        };
        // SAFETY: every branch above only accepted ASCII bytes
        let s = unsafe { str::from_utf8_unchecked(value) };
        Ok(Self { value: s.into(), query: query as u16 })
    }

    /// Returns the path component, e.g. `/over/there`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.value[..self.query as usize]
    }

    /// Returns the query component, e.g. `name=joe&query=4`, if present.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.value.get(self.query as usize + 1..)
    }

    /// Returns the path and query as a single `str`, e.g. `/over/there?name=joe`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// ===== Formatting =====

impl std::fmt::Debug for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
