use core::fmt;

/// Request methods recognized by [`Http1Tokenizer`](super::Http1Tokenizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Delete,
    Get,
    Head,
    Post,
    Put,
    Connect,
    Options,
    Trace,
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    Patch,
}

impl Method {
    const ALL: [Method; 16] = [
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Copy,
        Method::Lock,
        Method::Mkcol,
        Method::Move,
        Method::Propfind,
        Method::Proppatch,
        Method::Unlock,
        Method::Patch,
    ];

    /// Longest method token, in bytes.
    pub(crate) const MAX_LEN: usize = 9;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Copy => "COPY",
            Method::Lock => "LOCK",
            Method::Mkcol => "MKCOL",
            Method::Move => "MOVE",
            Method::Propfind => "PROPFIND",
            Method::Proppatch => "PROPPATCH",
            Method::Unlock => "UNLOCK",
            Method::Patch => "PATCH",
        }
    }

    /// Case-sensitive match of a complete method token.
    #[must_use]
    pub fn from_bytes(token: &[u8]) -> Option<Method> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().as_bytes() == token)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::from_bytes(method.as_str().as_bytes()), Some(method));
            assert!(method.as_str().len() <= Method::MAX_LEN);
        }
    }

    #[test]
    fn matching_is_exact() {
        assert_eq!(Method::from_bytes(b"get"), None);
        assert_eq!(Method::from_bytes(b"GE"), None);
        assert_eq!(Method::from_bytes(b"GETS"), None);
        assert_eq!(Method::from_bytes(b""), None);
    }
}
