//! Error taxonomy for keyring and codec operations.

use std::fmt;

/// The kind of failure that occurred.
///
/// Mirrors the flat error-kind taxonomy of the wire protocol this crate
/// implements. `NONE` and `NO_MEM` from that taxonomy have no Rust
/// analogue (a `Result::Ok` already covers the former; allocator failure
/// is not something this crate catches and re-reports) and are omitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed framing, unknown required attribute, or a type mismatch
    /// while parsing an attribute stream.
    Corrupt,
    /// Authenticated-encryption tag verification failed for every key
    /// tried.
    BadHmac,
    /// The key object itself is invalid (wrong length, wrong type).
    BadKey,
    /// The CSPRNG was unavailable.
    RandFailure,
    /// No keyring entry matched the selection criteria.
    NotFound,
    /// The keyring file does not exist.
    FileNotFound,
    /// The keyring file's format version is not supported.
    FileVersion,
    /// The keyring file could not be opened for reading.
    FileOpenRead,
    /// The temporary keyring file could not be opened for writing.
    FileOpenWrite,
    /// Reading the keyring file failed partway through.
    FileRead,
    /// Writing or renaming the keyring file failed.
    FileWrite,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Corrupt => "corrupt data",
            ErrorKind::BadHmac => "HMAC verification failed",
            ErrorKind::BadKey => "invalid key",
            ErrorKind::RandFailure => "random number generator failure",
            ErrorKind::NotFound => "not found",
            ErrorKind::FileNotFound => "file not found",
            ErrorKind::FileVersion => "unsupported file version",
            ErrorKind::FileOpenRead => "cannot open file for reading",
            ErrorKind::FileOpenWrite => "cannot open file for writing",
            ErrorKind::FileRead => "error reading file",
            ErrorKind::FileWrite => "error writing file",
        };
        write!(f, "{s}")
    }
}

/// A keyring/codec/crypto error: a kind plus a human-readable message.
///
/// The message may name a failing file, attribute, or key index, but
/// must never include key material.
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

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! err {
    ($kind:expr, $($arg:tt)*) => {
        $crate::error::Error::new($kind, format!($($arg)*))
    };
}
pub(crate) use err;
