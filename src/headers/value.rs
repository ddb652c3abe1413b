use bytes::Bytes;
use std::str::from_utf8;

// ===== HeaderValue =====

/// HTTP Header Value.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderValue {
    bytes: Bytes,
}

impl HeaderValue {
    /// used as an iterator placeholder.
    pub(crate) const PLACEHOLDER: Self = Self { bytes: Bytes::new() };

    /// Parse a [`HeaderValue`] from anything convertible into [`Bytes`].
    #[inline]
    pub fn try_from_slice(value: impl Into<Bytes>) -> Result<Self, InvalidHeaderValue> {
        let bytes: Bytes = value.into();
        validate(&bytes)?;
        Ok(Self { bytes })
    }

    /// Parse a [`HeaderValue`] by copying from a slice.
    #[inline]
    pub fn try_copy_from_slice(value: &[u8]) -> Result<HeaderValue, InvalidHeaderValue> {
        Self::try_from_slice(Bytes::copy_from_slice(value))
    }

    /// Parse a [`HeaderValue`] by copying from a `str`.
    #[inline]
    pub fn try_copy_from_string(value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        Self::try_from_slice(Bytes::copy_from_slice(value.as_bytes()))
    }

    /// Returns the value as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parse the value as a [`str`].
    ///
    /// # Panics
    ///
    /// Panics if the header value is not valid UTF-8.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.try_as_str()
            .expect("cannot convert header value as utf8 string")
    }

    /// Try to parse the value as a [`str`].
    #[inline]
    pub fn try_as_str(&self) -> Result<&str, std::str::Utf8Error> {
        from_utf8(&self.bytes)
    }
}

impl std::str::FromStr for HeaderValue {
    type Err = InvalidHeaderValue;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_copy_from_string(s)
    }
}

impl From<&'static str> for HeaderValue {
    fn from(value: &'static str) -> Self {
        Self::try_from_slice(Bytes::from_static(value.as_bytes()))
            .expect("called with invalid bytes")
    }
}

// ===== Parsing =====

/// field-value    = *field-content
/// field-content  = field-vchar [ 1*( SP / HTAB / field-vchar ) field-vchar ]
/// field-vchar    = VCHAR / obs-text
/// obs-text       = %x80-FF
const fn validate(value: &[u8]) -> Result<(), InvalidHeaderValue> {
    let mut i = 0;
    while i < value.len() {
        let b = value[i];
        if !(b >= b' ' && b != 127 || b == b'\t') {
            return Err(InvalidHeaderValue { _priv: () });
        }
        i += 1;
    }
    Ok(())
}

// ===== Traits =====

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.try_as_str() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.bytes),
        }
    }
}

// ===== Error =====

/// An error that can occur when parsing a header value.
#[non_exhaustive]
#[derive(Debug)]
pub struct InvalidHeaderValue {
    _priv: (),
}

impl std::error::Error for InvalidHeaderValue {}

impl std::fmt::Display for InvalidHeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("header contains invalid bytes")
    }
}
