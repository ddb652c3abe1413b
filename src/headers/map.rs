use crate::headers::field::HeaderField;
use crate::headers::iter::{GetAll, Iter};
use crate::headers::name::{AsHeaderName, IntoHeaderName};
use crate::headers::{HeaderName, HeaderValue};

/// HTTP Headers Multimap.
///
/// Backed by a flat, insertion-ordered `Vec<HeaderField>` rather than a hash table:
/// lookups are a linear scan, which is the right complexity class once header counts are
/// bounded (as every HTTP server bounds them) and it is the only representation that makes
/// iteration order equal to insertion order, which callers are entitled to rely on.
///
/// # Header Name
///
/// All operations that take a header name accept either a static `str` or a [`HeaderName`].
/// It is preferred to use the [provided constants] over a static `str` literal, since the
/// constants skip validation.
///
/// [provided constants]: crate::headers::standard
#[derive(Clone, Default)]
pub struct HeaderMap {
    fields: Vec<HeaderField>,
}

impl HeaderMap {
    /// Create an empty [`HeaderMap`].
    #[inline]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create an empty [`HeaderMap`] with at least the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Returns the number of fields, including repeated header names.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Returns an iterator over all fields in insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.fields.iter())
    }

    /// Returns `true` if the map contains a field with the given name.
    pub fn contains_key<K: AsHeaderName>(&self, name: K) -> bool {
        self.fields.iter().any(|f| name.matches(f.name()))
    }

    /// Returns the first value for the given header name, in insertion order.
    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.fields.iter().find(|f| name.matches(f.name())).map(HeaderField::value)
    }

    /// Returns an iterator over every value for the given header name, in insertion order.
    pub fn get_all<K: AsHeaderName>(&self, name: K) -> GetAll<'_> {
        match self.fields.iter().find(|f| name.matches(f.name())) {
            Some(first) => GetAll { iter: self.fields.iter(), name: first.name().as_str() },
            None => GetAll::empty(),
        }
    }

    /// Insert a header, removing and returning any previous values under the same name.
    ///
    /// To add a value without removing existing ones, use [`append`][Self::append].
    pub fn insert<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) -> Option<HeaderValue> {
        let name = name.into_header_name();
        let mut removed = None;
        self.fields.retain(|f| {
            if f.name().as_str().eq_ignore_ascii_case(name.as_str()) {
                if removed.is_none() {
                    removed = Some(f.value().clone());
                }
                false
            } else {
                true
            }
        });
        self.fields.push(HeaderField::new(name, value));
        removed
    }

    /// Append a value under the given name without removing existing values.
    pub fn append<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.fields.push(HeaderField::new(name.into_header_name(), value));
    }

    /// Remove every value under the given name, returning the first removed value.
    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> Option<HeaderValue> {
        let mut removed = None;
        self.fields.retain(|f| {
            if name.matches(f.name()) {
                if removed.is_none() {
                    removed = Some(f.value().clone());
                }
                false
            } else {
                true
            }
        });
        removed
    }

    /// Reserve capacity for at least `additional` more fields.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.fields.reserve(additional);
    }

    /// Remove all fields, keeping the allocated capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl std::fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter().map(|(n, v)| (n.as_str(), v))).finish()
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}
