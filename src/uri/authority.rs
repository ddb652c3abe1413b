use crate::matches::{is_ipv6, is_regname, is_userinfo};
use crate::uri::UriError;

/// URI authority, e.g. `example.com:8080` or `user@example.com`.
#[derive(Clone, PartialEq, Eq)]
pub struct Authority {
    value: Box<str>,
    /// byte offset of `host` within `value`, after any `userinfo@`
    host_start: u16,
    /// byte offset of `:port` within `value`, or `value.len()` if no port
    port_start: u16,
}

impl Authority {
    /// Parse an [`Authority`] from a byte slice.
    ///
    /// authority = [ userinfo "@" ] host [ ":" port ]
    pub fn try_from(value: &[u8]) -> Result<Self, UriError> {
        if value.is_empty() {
            return Err(UriError::Incomplete);
        }

        let host_start = match value.iter().position(|&b| b == b'@') {
            Some(at) => {
                if !value[..at].iter().all(|&b| is_userinfo(b)) {
                    return Err(UriError::Char);
                }
                at + 1
            }
            None => 0,
        };

        let host = &value[host_start..];
        if host.is_empty() {
            return Err(UriError::Incomplete);
        }

        let port_start = if host[0] == b'[' {
            let close = host.iter().position(|&b| b == b']').ok_or(UriError::Incomplete)?;
            if !host[1..close].iter().all(|&b| is_ipv6(b)) {
                return Err(UriError::Char);
            }
            host_start + close + 1
        } else {
            match host.iter().position(|&b| b == b':') {
                Some(colon) => {
                    if !host[..colon].iter().all(|&b| is_regname(b)) {
                        return Err(UriError::Char);
                    }
                    host_start + colon
                }
                None => {
                    if !host.iter().all(|&b| is_regname(b)) {
                        return Err(UriError::Char);
                    }
                    value.len()
                }
            }
        };

        if port_start < value.len() {
            let port = &value[port_start..];
            if port.first() != Some(&b':') || !port[1..].iter().all(u8::is_ascii_digit) {
                return Err(UriError::Char);
            }
        }

        // SAFETY: every branch above only accepted ASCII bytes
        let s = unsafe { str::from_utf8_unchecked(value) };
        Ok(Self {
            value: s.into(),
            host_start: host_start as u16,
            port_start: port_start as u16,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The `host` component, without userinfo or port.
    #[inline]
    pub fn host(&self) -> &str {
        &self.value[self.host_start as usize..self.port_start as usize]
    }

    /// The `port` component, if present.
    pub fn port(&self) -> Option<u16> {
        self.value.get(self.port_start as usize + 1..)?.parse().ok()
    }
}

// ===== Formatting =====

impl std::fmt::Debug for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
