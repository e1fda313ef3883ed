//! # sso-keyring
//!
//! Symmetric keyring management and the attribute-stream codec that
//! underlies both the keyring file format and (via `sso-token`) the
//! token wire format.
//!
//! This crate owns three of the four components of the SSO token core:
//!
//! - [`codec`]: the self-delimiting `name=value;` attribute stream.
//! - [`crypto`]: authenticated AES-CBC + HMAC-SHA1 encryption under a
//!   [`Key`].
//! - [`keyring`]: the [`Keyring`] itself — an ordered, timestamped
//!   collection of keys, with best-key selection, atomic file
//!   persistence, and scheduled rotation.
//!
//! The core is synchronous and single-threaded (see the crate's design
//! notes): every function here runs to completion on the calling
//! thread. Parallel use of a shared [`Keyring`] is the caller's
//! responsibility to serialize.

pub mod clock;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod key;
pub mod keyring;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, ErrorKind, Result};
pub use key::{Key, KeyType};
pub use keyring::{AutoUpdateOutcome, KeyUsage, Keyring, KeyringEntry};

/// Encrypt `plaintext` under the keyring's best current encryption key.
/// Fails with [`ErrorKind::BadKey`] if the keyring is empty.
pub fn seal(ring: &Keyring, plaintext: &[u8], clock: &dyn Clock) -> Result<Vec<u8>> {
    if ring.is_empty() {
        return Err(error::err!(ErrorKind::BadKey, "keyring is empty"));
    }
    let key = ring.best_key(KeyUsage::Encrypt, 0, clock)?;
    crypto::encrypt(key, plaintext)
}

/// Decrypt `envelope`, trying the keyring entry whose fingerprint
/// matches the envelope's advisory key hint first, then every other
/// entry, succeeding on the first key that authenticates.
pub fn open(ring: &Keyring, envelope: &[u8], clock: &dyn Clock) -> Result<Vec<u8>> {
    if ring.is_empty() {
        return Err(error::err!(ErrorKind::BadKey, "keyring is empty"));
    }
    let hint = crypto::peek_key_hint(envelope);

    let mut ordered: Vec<&Key> = Vec::with_capacity(ring.len());
    if let Some(hint) = hint {
        for entry in ring.entries() {
            if entry.key.fingerprint() == hint {
                ordered.push(&entry.key);
            }
        }
    }
    for entry in ring.entries() {
        if hint != Some(entry.key.fingerprint()) {
            ordered.push(&entry.key);
        }
    }

    for key in ordered {
        match crypto::decrypt(key, envelope) {
            Ok(plaintext) => return Ok(plaintext),
            Err(e) if e.kind() == ErrorKind::BadHmac => continue,
            Err(e) => return Err(e),
        }
    }
    Err(error::err!(ErrorKind::BadHmac, "no key in keyring authenticated the envelope"))
}
