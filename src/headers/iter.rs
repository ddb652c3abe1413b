use crate::headers::{HeaderField, HeaderMap, HeaderName, HeaderValue};

// ===== Header Values Iterator =====

/// An iterator over the values of a single header name, in insertion order.
///
/// Created by [`HeaderMap::get_all`].
#[derive(Clone)]
pub struct GetAll<'a> {
    pub(crate) iter: std::slice::Iter<'a, HeaderField>,
    pub(crate) name: &'a str,
}

impl<'a> GetAll<'a> {
    pub(crate) const fn empty() -> Self {
        Self { iter: [].iter(), name: "" }
    }

    /// Returns `true` if there is still a remaining value.
    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.clone().next().is_some()
    }
}

impl<'a> Iterator for GetAll<'a> {
    type Item = &'a HeaderValue;

    fn next(&mut self) -> Option<Self::Item> {
        for field in self.iter.by_ref() {
            if field.name().as_str().eq_ignore_ascii_case(self.name) {
                return Some(field.value());
            }
        }
        None
    }
}

impl std::fmt::Debug for GetAll<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

// ===== Header Fields Iterator =====

/// An iterator over all headers in a [`HeaderMap`], in insertion order.
#[derive(Clone)]
pub struct Iter<'a> {
    iter: std::slice::Iter<'a, HeaderField>,
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = <Iter<'a> as Iterator>::Item;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Iter { iter: self.fields().iter() }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HeaderName, &'a HeaderValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|f| (f.name(), f.value()))
    }
}

impl<'a> Iter<'a> {
    pub(crate) fn new(iter: std::slice::Iter<'a, HeaderField>) -> Self {
        Self { iter }
    }
}

impl std::fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
