//! Encode and decode pipelines tying validation, the attribute codec,
//! and keyring-authenticated encryption together.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sso_keyring::{codec, Clock, Keyring};

use crate::error::{err, ErrorKind, Result};
use crate::kind::TokenKind;
use crate::record::{Mode, Token};

/// Validate `token`, serialize it to the attribute stream, and seal it
/// under the keyring's best encryption key. Returns raw ciphertext
/// bytes (§6.2 envelope); see [`encode_base64`] for the wire form
/// usually handed to a client.
pub fn encode(token: &Token, ring: &Keyring, clock: &dyn Clock) -> Result<Vec<u8>> {
    token.validate(Mode::Encode, clock.now())?;
    let attrs = token.to_attrs();
    let borrowed: Vec<(&str, &[u8])> = attrs.iter().map(|(n, v)| (n.as_str(), v.as_slice())).collect();
    let plaintext = codec::encode(&borrowed);
    Ok(sso_keyring::seal(ring, &plaintext, clock)?)
}

/// [`encode`], then base64-encode the envelope for transport in a
/// header or URL parameter.
pub fn encode_base64(token: &Token, ring: &Keyring, clock: &dyn Clock) -> Result<String> {
    let raw = encode(token, ring, clock)?;
    Ok(BASE64.encode(raw))
}

/// Open `envelope` against the keyring, parse its attribute stream,
/// confirm its kind matches `expected` (or accept any kind if
/// `expected` is [`TokenKind::Any`]), and validate its fields
/// including expiration.
pub fn decode(envelope: &[u8], expected: TokenKind, ring: &Keyring, clock: &dyn Clock) -> Result<Token> {
    let plaintext = sso_keyring::open(ring, envelope, clock)?;
    let attrs = codec::decode(&plaintext)?;
    let kind_bytes = codec::require(&attrs, "t")?;
    let kind_name = std::str::from_utf8(kind_bytes)
        .map_err(|_| err!(ErrorKind::Corrupt, "token kind is not valid UTF-8"))?;
    let kind = TokenKind::from_wire_name(kind_name).require_known("t")?;
    kind.matches(expected)?;

    let token = Token::from_attrs(kind, &attrs)?;
    token.validate(Mode::Decode, clock.now())?;
    Ok(token)
}

/// Base64-decode `encoded`, then [`decode`]. Tolerates and strips
/// trailing ASCII whitespace (§6.3) before decoding.
pub fn decode_base64(encoded: &str, expected: TokenKind, ring: &Keyring, clock: &dyn Clock) -> Result<Token> {
    let trimmed = encoded.trim_end_matches(|c: char| c.is_ascii_whitespace());
    let raw = BASE64
        .decode(trimmed)
        .map_err(|e| err!(ErrorKind::Corrupt, "invalid base64: {e}"))?;
    decode(&raw, expected, ring, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{IdToken, LoginToken};
    use sso_keyring::{FixedClock, Key, KeyType};

    fn ring_with_one_key(clock: &dyn Clock) -> Keyring {
        let mut ring = Keyring::new(1);
        ring.add(0, 0, Key::generate(KeyType::Aes, 16).unwrap(), clock);
        ring
    }

    #[test]
    fn id_token_round_trips() {
        let clock = FixedClock(1000);
        let ring = ring_with_one_key(&clock);
        let token = Token::Id(IdToken {
            auth: "webkdc".into(),
            expiration: 5000,
            subject: Some("jdoe".into()),
            auth_data: None,
        });

        let ct = encode(&token, &ring, &clock).unwrap();
        let decoded = decode(&ct, TokenKind::Id, &ring, &clock).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn base64_round_trips() {
        let clock = FixedClock(1000);
        let ring = ring_with_one_key(&clock);
        let token = Token::Id(IdToken {
            auth: "krb5".into(),
            expiration: 5000,
            subject: None,
            auth_data: None,
        });

        let encoded = encode_base64(&token, &ring, &clock).unwrap();
        let decoded = decode_base64(&encoded, TokenKind::Any, &ring, &clock).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn base64_round_trips_with_trailing_whitespace() {
        let clock = FixedClock(1000);
        let ring = ring_with_one_key(&clock);
        let token = Token::Id(IdToken {
            auth: "krb5".into(),
            expiration: 5000,
            subject: None,
            auth_data: None,
        });

        let mut encoded = encode_base64(&token, &ring, &clock).unwrap();
        encoded.push_str("\n \t");
        let decoded = decode_base64(&encoded, TokenKind::Any, &ring, &clock).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn decode_rejects_wrong_expected_kind() {
        let clock = FixedClock(1000);
        let ring = ring_with_one_key(&clock);
        let token = Token::Id(IdToken {
            auth: "krb5".into(),
            expiration: 5000,
            subject: None,
            auth_data: None,
        });
        let ct = encode(&token, &ring, &clock).unwrap();
        let err = decode(&ct, TokenKind::App, &ring, &clock).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn decode_rejects_expired_token() {
        let clock_seal = FixedClock(1000);
        let ring = ring_with_one_key(&clock_seal);
        let token = Token::Id(IdToken {
            auth: "krb5".into(),
            expiration: 1500,
            subject: None,
            auth_data: None,
        });
        let ct = encode(&token, &ring, &clock_seal).unwrap();

        let clock_late = FixedClock(2000);
        let err = decode(&ct, TokenKind::Any, &ring, &clock_late).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[test]
    fn encode_rejects_invalid_fields_before_touching_keyring() {
        let clock = FixedClock(1000);
        let ring = ring_with_one_key(&clock);
        let bad = Token::Login(LoginToken {
            username: "jdoe".into(),
            password: None,
            otp: None,
            otp_type: None,
        });
        let err = encode(&bad, &ring, &clock).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn decode_survives_key_rotation() {
        let clock1 = FixedClock(1000);
        let mut ring = Keyring::new(1);
        ring.add(1000, 1000, Key::generate(KeyType::Aes, 16).unwrap(), &clock1);
        let token = Token::Id(IdToken {
            auth: "krb5".into(),
            expiration: 9000,
            subject: None,
            auth_data: None,
        });
        let ct = encode(&token, &ring, &clock1).unwrap();

        ring.add(2000, 2000, Key::generate(KeyType::Aes, 16).unwrap(), &FixedClock(2000));
        let clock2 = FixedClock(2500);
        let decoded = decode(&ct, TokenKind::Id, &ring, &clock2).unwrap();
        assert_eq!(decoded, token);
    }
}
