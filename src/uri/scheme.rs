use crate::matches::is_scheme;
use crate::uri::UriError;

/// URI scheme, e.g. `http`.
#[derive(Clone, PartialEq, Eq)]
pub struct Scheme {
    value: Box<str>,
}

impl Scheme {
    pub const HTTP: &'static str = "http";
    pub const HTTPS: &'static str = "https";

    /// Parse a [`Scheme`] from a byte slice.
    ///
    /// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    pub fn try_from(value: &[u8]) -> Result<Self, UriError> {
        let [first, rest @ ..] = value else {
            return Err(UriError::Incomplete);
        };
        if !first.is_ascii_alphabetic() || !rest.iter().all(|&b| is_scheme(b)) {
            return Err(UriError::Char);
        }
        // SAFETY: `is_scheme`/`is_ascii_alphabetic` are both subsets of ASCII
        let s = unsafe { str::from_utf8_unchecked(value) };
        Ok(Self { value: s.to_ascii_lowercase().into_boxed_str() })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn is_https(&self) -> bool {
        self.value.eq_ignore_ascii_case(Self::HTTPS)
    }
}

impl std::fmt::Debug for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
