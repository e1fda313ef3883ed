//! Error taxonomy for token validation, encoding, and decoding.

use std::fmt;

/// The kind of failure that occurred. Extends the underlying keyring's
/// taxonomy with the one failure mode that only makes sense once raw
/// bytes have become a typed, time-bounded token: an expired one.
/// Every field-validation failure — missing required field, mutually
/// exclusive fields both set, or an unrecognized enum value — is
/// `Corrupt`, matching the original token format's `CORRUPT` mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed attribute stream, wrong token kind, a type mismatch
    /// while decoding, or a token's fields violate its kind's
    /// validation rules.
    Corrupt,
    /// Authenticated-encryption tag verification failed for every key
    /// tried.
    BadHmac,
    /// The keyring has no usable key, or the key itself is invalid.
    BadKey,
    /// The CSPRNG was unavailable.
    RandFailure,
    /// The token decoded and validated but its `expiration` has passed.
    TokenExpired,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Corrupt => "corrupt token",
            ErrorKind::BadHmac => "HMAC verification failed",
            ErrorKind::BadKey => "invalid key",
            ErrorKind::RandFailure => "random number generator failure",
            ErrorKind::TokenExpired => "token has expired",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<sso_keyring::Error> for Error {
    fn from(e: sso_keyring::Error) -> Self {
        let kind = match e.kind() {
            sso_keyring::ErrorKind::Corrupt => ErrorKind::Corrupt,
            sso_keyring::ErrorKind::BadHmac => ErrorKind::BadHmac,
            sso_keyring::ErrorKind::BadKey => ErrorKind::BadKey,
            sso_keyring::ErrorKind::RandFailure => ErrorKind::RandFailure,
            // The remaining keyring kinds (NotFound, FileNotFound,
            // FileVersion, FileOpen*, File{Read,Write}) only arise from
            // keyring-file operations a token never performs directly;
            // if `best_key` reports NotFound while sealing or opening a
            // token, that's a missing/expired key, which is BadKey here.
            sso_keyring::ErrorKind::NotFound => ErrorKind::BadKey,
            _ => ErrorKind::Corrupt,
        };
        Error::new(kind, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! err {
    ($kind:expr, $($arg:tt)*) => {
        $crate::error::Error::new($kind, format!($($arg)*))
    };
}
pub(crate) use err;
