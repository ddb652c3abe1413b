use crate::headers::{HeaderName, HeaderValue};

/// A single header field: one name paired with one value.
///
/// [`HeaderMap`] stores these in a flat, insertion-ordered list; repeated header names
/// become multiple [`HeaderField`]s rather than a nested value list, which is what makes
/// iteration order trivially equal to insertion order.
///
/// [`HeaderMap`]: super::HeaderMap
#[derive(Clone)]
pub struct HeaderField {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderField {
    pub(crate) const fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    /// Returns a reference to the [`HeaderName`].
    #[inline]
    pub const fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Returns a reference to the [`HeaderValue`].
    #[inline]
    pub const fn value(&self) -> &HeaderValue {
        &self.value
    }

    /// Consume this field into its name/value pair.
    #[inline]
    pub fn into_parts(self) -> (HeaderName, HeaderValue) {
        (self.name, self.value)
    }
}

impl std::fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderField")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}
