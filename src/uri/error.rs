/// A possible error value when parsing a URI component.
#[derive(Clone)]
pub enum UriError {
    /// Bytes ended before all components were parsed.
    Incomplete,
    /// Bytes length is too large.
    TooLong,
    /// Invalid character found.
    Char,
}

impl std::error::Error for UriError {}

impl std::fmt::Display for UriError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Self::Incomplete => "URI incomplete",
            Self::TooLong => "URI too long",
            Self::Char => "URI contains invalid character",
        })
    }
}

impl std::fmt::Debug for UriError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}
