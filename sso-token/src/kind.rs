//! Token kinds and their wire names.

use crate::error::{err, Error, ErrorKind, Result};

/// The closed set of token kinds, plus the two sentinel values a caller
/// can pass to `decode` instead of a concrete kind: `Any` accepts
/// whatever kind is on the wire, `Unknown` is never valid on the wire
/// and only appears as a decode result for a kind string this crate
/// doesn't recognize (used internally; `from_wire_name` never returns
/// it to a caller that required a specific kind).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    App,
    Cred,
    Error,
    Id,
    Login,
    Proxy,
    Request,
    WebkdcFactor,
    WebkdcProxy,
    WebkdcService,
    Any,
    Unknown,
}

const WIRE_NAMES: &[(TokenKind, &str)] = &[
    (TokenKind::App, "app"),
    (TokenKind::Cred, "cred"),
    (TokenKind::Error, "error"),
    (TokenKind::Id, "id"),
    (TokenKind::Login, "login"),
    (TokenKind::Proxy, "proxy"),
    // The original wire encoding abbreviates this to "req"; kept for
    // byte-level continuity with deployed tooling that reads the `t`
    // attribute.
    (TokenKind::Request, "req"),
    (TokenKind::WebkdcFactor, "webkdc-factor"),
    (TokenKind::WebkdcProxy, "webkdc-proxy"),
    (TokenKind::WebkdcService, "webkdc-service"),
];

impl TokenKind {
    /// The string written into a token's `t` attribute. Panics if
    /// called on `Any` or `Unknown`, neither of which is ever encoded.
    pub fn wire_name(self) -> &'static str {
        WIRE_NAMES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, n)| *n)
            .unwrap_or_else(|| panic!("{self:?} has no wire representation"))
    }

    pub fn from_wire_name(s: &str) -> Self {
        WIRE_NAMES
            .iter()
            .find(|(_, n)| *n == s)
            .map(|(k, _)| *k)
            .unwrap_or(TokenKind::Unknown)
    }

    pub(crate) fn require_known(self, attr: &str) -> Result<Self> {
        if self == TokenKind::Unknown {
            return Err(err!(ErrorKind::Corrupt, "unknown token kind in {attr}"));
        }
        Ok(self)
    }

    /// Whether `expected` (possibly `Any`) accepts a token whose wire
    /// kind is `self`.
    pub(crate) fn matches(self, expected: TokenKind) -> Result<()> {
        if expected == TokenKind::Any || expected == self {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::Corrupt,
                format!(
                    "expected token kind {:?}, got {:?}",
                    expected, self
                ),
            ))
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Any => write!(f, "any"),
            TokenKind::Unknown => write!(f, "unknown"),
            known => write!(f, "{}", known.wire_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for (kind, name) in WIRE_NAMES {
            assert_eq!(TokenKind::from_wire_name(name), *kind);
            assert_eq!(kind.wire_name(), *name);
        }
    }

    #[test]
    fn unrecognized_name_is_unknown() {
        assert_eq!(TokenKind::from_wire_name("bogus"), TokenKind::Unknown);
    }

    #[test]
    fn any_matches_everything_known() {
        assert!(TokenKind::Id.matches(TokenKind::Any).is_ok());
        assert!(TokenKind::Id.matches(TokenKind::Id).is_ok());
        assert!(TokenKind::Id.matches(TokenKind::App).is_err());
    }
}
