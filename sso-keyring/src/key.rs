//! Symmetric key material.

use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{err, ErrorKind, Result};

/// Key algorithm. Only AES is defined at rest; the wire type field
/// (§6.1 `kt<i>`) leaves room for future values but this crate accepts
/// only `1` (AES).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    Aes,
}

impl KeyType {
    pub(crate) fn to_wire(self) -> u32 {
        match self {
            KeyType::Aes => 1,
        }
    }

    pub(crate) fn from_wire(v: u32) -> Result<Self> {
        match v {
            1 => Ok(KeyType::Aes),
            other => Err(err!(ErrorKind::BadKey, "unknown key type {other}")),
        }
    }
}

/// A symmetric key. Immutable after construction; equality is by
/// content. The material is zeroized on drop and is never exposed
/// except through `material()`, which callers must not log or persist
/// outside of `Keyring` serialization.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    #[zeroize(skip)]
    key_type: KeyType,
    material: Vec<u8>,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.key_type == other.key_type && self.material == other.material
    }
}
impl Eq for Key {}

impl Key {
    /// Construct a key from raw material. `length` must be one of the
    /// valid AES key sizes (16, 24, 32 bytes) and must match
    /// `material.len()`.
    pub fn new(key_type: KeyType, material: Vec<u8>) -> Result<Self> {
        match material.len() {
            16 | 24 | 32 => {}
            other => {
                return Err(err!(
                    ErrorKind::BadKey,
                    "invalid AES key length {other} (want 16, 24, or 32)"
                ))
            }
        }
        Ok(Self { key_type, material })
    }

    /// Generate a fresh random key of the given type and length using
    /// the OS CSPRNG.
    pub fn generate(key_type: KeyType, length: usize) -> Result<Self> {
        if !matches!(length, 16 | 24 | 32) {
            return Err(err!(
                ErrorKind::BadKey,
                "invalid AES key length {length} (want 16, 24, or 32)"
            ));
        }
        let mut material = vec![0u8; length];
        // OsRng draws from the platform CSPRNG; it has no fallible path
        // in rand_core 0.6's RngCore interface, but a future backend
        // swap could introduce one, so the error kind stays reachable.
        OsRng.try_fill_bytes(&mut material).map_err(|e| {
            err!(ErrorKind::RandFailure, "failed to generate key material: {e}")
        })?;
        Ok(Self { key_type, material })
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn length(&self) -> usize {
        self.material.len()
    }

    /// Raw key material. Sensitive: callers must not log this value.
    pub fn material(&self) -> &[u8] {
        &self.material
    }

    /// Non-secret fingerprint: first 4 bytes of SHA-256(material). Used
    /// as the ciphertext's advisory `key_hint` and safe to log.
    pub fn fingerprint(&self) -> [u8; 4] {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(&self.material);
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("length", &self.material.len())
            .field("fingerprint", &hex::encode(self.fingerprint()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_rejects_bad_length() {
        assert!(Key::generate(KeyType::Aes, 17).is_err());
    }

    #[test]
    fn generate_produces_requested_length() {
        for len in [16, 24, 32] {
            let k = Key::generate(KeyType::Aes, len).unwrap();
            assert_eq!(k.length(), len);
        }
    }

    #[test]
    fn equality_is_by_content() {
        let a = Key::new(KeyType::Aes, vec![1u8; 16]).unwrap();
        let b = Key::new(KeyType::Aes, vec![1u8; 16]).unwrap();
        let c = Key::new(KeyType::Aes, vec![2u8; 16]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fingerprint_is_deterministic_and_short() {
        let k = Key::new(KeyType::Aes, vec![7u8; 16]).unwrap();
        assert_eq!(k.fingerprint(), k.fingerprint());
        assert_eq!(k.fingerprint().len(), 4);
    }

    #[test]
    fn debug_never_prints_material() {
        let k = Key::new(KeyType::Aes, vec![0xAB; 16]).unwrap();
        let s = format!("{k:?}");
        assert!(!s.contains("ab,ab"));
        assert!(!s.to_lowercase().contains(&hex::encode(k.material())));
    }
}
