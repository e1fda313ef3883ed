//! Authenticated symmetric encryption of opaque payloads.
//!
//! Envelope (§6.2):
//! `[ key_hint(4) | nonce(16) | ciphertext(M) | hmac_tag(20) ]`
//!
//! `key_hint` is `Key::fingerprint()`: advisory only, decoders must still
//! try every key on a hint miss. Confidentiality is AES-CBC with PKCS#7
//! padding; integrity is HMAC-SHA1 over every byte preceding the tag,
//! computed and verified in encrypt-then-MAC order. The AES key and the
//! HMAC key are each derived from the supplied `Key`'s material through
//! a distinct domain-separated SHA-256 expansion so the same raw bytes
//! are never fed to both primitives.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{err, ErrorKind, Result};
use crate::key::Key;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha1 = Hmac<Sha1>;

pub const KEY_HINT_BYTES: usize = 4;
pub const NONCE_BYTES: usize = 16;
pub const TAG_BYTES: usize = 20;
const HEADER_BYTES: usize = KEY_HINT_BYTES + NONCE_BYTES;
const AES_BLOCK_BYTES: usize = 16;
pub const MIN_ENVELOPE_BYTES: usize = HEADER_BYTES + AES_BLOCK_BYTES + TAG_BYTES;

fn derive_aes_key(key: &Key) -> Vec<u8> {
    let mut h = Sha256::new();
    h.update(b"sso-keyring-aes-v1");
    h.update(key.material());
    let digest = h.finalize();
    digest[..key.length()].to_vec()
}

fn derive_hmac_key(key: &Key) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(b"sso-keyring-hmac-v1");
    h.update(key.material());
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}

fn hmac_tag(hmac_key: &[u8], data: &[u8]) -> [u8; TAG_BYTES] {
    let mut mac = HmacSha1::new_from_slice(hmac_key).expect("HMAC accepts any key length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; TAG_BYTES];
    out.copy_from_slice(&result);
    out
}

fn cbc_encrypt(aes_key: &[u8], iv: &[u8; NONCE_BYTES], plaintext: &[u8]) -> Result<Vec<u8>> {
    match aes_key.len() {
        16 => Ok(Aes128CbcEnc::new(aes_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        24 => Ok(Aes192CbcEnc::new(aes_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => Ok(Aes256CbcEnc::new(aes_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        other => Err(err!(ErrorKind::BadKey, "unsupported AES key length {other}")),
    }
}

fn cbc_decrypt(aes_key: &[u8], iv: &[u8; NONCE_BYTES], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let result = match aes_key.len() {
        16 => Aes128CbcDec::new(aes_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => Aes192CbcDec::new(aes_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => Aes256CbcDec::new(aes_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        other => return Err(err!(ErrorKind::BadKey, "unsupported AES key length {other}")),
    };
    result.map_err(|_| err!(ErrorKind::Corrupt, "invalid padding after decryption"))
}

/// Encrypt and authenticate `plaintext` under `key`, producing a
/// self-contained envelope.
pub fn encrypt(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_BYTES];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| err!(ErrorKind::RandFailure, "failed to generate nonce: {e}"))?;

    let aes_key = derive_aes_key(key);
    let ciphertext = cbc_encrypt(&aes_key, &nonce, plaintext)?;

    let mut out = Vec::with_capacity(HEADER_BYTES + ciphertext.len() + TAG_BYTES);
    out.extend_from_slice(&key.fingerprint());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);

    let hmac_key = derive_hmac_key(key);
    let tag = hmac_tag(&hmac_key, &out);
    out.extend_from_slice(&tag);

    Ok(out)
}

/// Try to decrypt `envelope` under `key`. Verifies the HMAC tag before
/// attempting to decrypt (encrypt-then-MAC order), using a
/// constant-time comparison.
pub fn decrypt(key: &Key, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_BYTES {
        return Err(err!(ErrorKind::Corrupt, "envelope shorter than minimum size"));
    }

    let body_end = envelope.len() - TAG_BYTES;
    let body = &envelope[..body_end];
    let given_tag = &envelope[body_end..];

    let hmac_key = derive_hmac_key(key);
    let expected_tag = hmac_tag(&hmac_key, body);
    if expected_tag.ct_eq(given_tag).unwrap_u8() != 1 {
        return Err(err!(ErrorKind::BadHmac, "authentication tag mismatch"));
    }

    let nonce: [u8; NONCE_BYTES] = envelope[KEY_HINT_BYTES..HEADER_BYTES]
        .try_into()
        .map_err(|_| err!(ErrorKind::Corrupt, "truncated nonce"))?;
    let ciphertext = &envelope[HEADER_BYTES..body_end];

    let aes_key = derive_aes_key(key);
    cbc_decrypt(&aes_key, &nonce, ciphertext)
}

/// Read the advisory `key_hint` out of an envelope without verifying
/// anything. Returns `None` if the envelope is too short to contain one.
pub fn peek_key_hint(envelope: &[u8]) -> Option<[u8; KEY_HINT_BYTES]> {
    if envelope.len() < KEY_HINT_BYTES {
        return None;
    }
    let mut out = [0u8; KEY_HINT_BYTES];
    out.copy_from_slice(&envelope[..KEY_HINT_BYTES]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyType;

    fn key128() -> Key {
        Key::generate(KeyType::Aes, 16).unwrap()
    }

    #[test]
    fn round_trip() {
        let key = key128();
        let ct = encrypt(&key, b"hello, sso").unwrap();
        let pt = decrypt(&key, &ct).unwrap();
        assert_eq!(pt, b"hello, sso");
    }

    #[test]
    fn round_trip_all_key_sizes() {
        for len in [16, 24, 32] {
            let key = Key::generate(KeyType::Aes, len).unwrap();
            let ct = encrypt(&key, b"payload").unwrap();
            assert_eq!(decrypt(&key, &ct).unwrap(), b"payload");
        }
    }

    #[test]
    fn wrong_key_fails_with_bad_hmac() {
        let key = key128();
        let other = key128();
        let ct = encrypt(&key, b"secret").unwrap();
        let err = decrypt(&other, &ct).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadHmac);
    }

    #[test]
    fn every_bit_flip_is_detected() {
        let key = key128();
        let ct = encrypt(&key, b"flip me").unwrap();
        for i in 0..ct.len() {
            for bit in 0..8u8 {
                let mut tampered = ct.clone();
                tampered[i] ^= 1 << bit;
                let result = decrypt(&key, &tampered);
                assert!(
                    result.is_err(),
                    "bit flip at byte {i} bit {bit} was not detected"
                );
            }
        }
    }

    #[test]
    fn truncated_envelope_is_corrupt_not_panic() {
        let key = key128();
        let err = decrypt(&key, b"short").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn key_hint_is_advisory_and_readable() {
        let key = key128();
        let ct = encrypt(&key, b"data").unwrap();
        assert_eq!(peek_key_hint(&ct), Some(key.fingerprint()));
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = key128();
        let ct = encrypt(&key, b"").unwrap();
        assert_eq!(decrypt(&key, &ct).unwrap(), Vec::<u8>::new());
    }
}
