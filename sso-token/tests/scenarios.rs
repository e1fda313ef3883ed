//! Integration tests against the literal scenarios in the token
//! specification.

use sso_keyring::{FixedClock, Key, KeyType, Keyring};
use sso_token::{ErrorKind, IdToken, LoginToken, Token, TokenKind};

fn ring_with_one_key(clock: &dyn sso_keyring::Clock) -> Keyring {
    let mut ring = Keyring::new(1);
    ring.add(0, 0, Key::generate(KeyType::Aes, 16).unwrap(), clock);
    ring
}

#[test]
fn scenario_id_token_round_trip() {
    // spec.md §8 scenario 1: a fully populated id token encodes and
    // decodes back to the same fields.
    let clock = FixedClock(1_700_000_000);
    let ring = ring_with_one_key(&clock);

    let token = Token::Id(IdToken {
        auth: "webkdc".into(),
        expiration: 1_700_003_600,
        subject: Some("jdoe@example.org".into()),
        auth_data: Some(vec![1, 2, 3, 4]),
    });

    let encoded = sso_token::encode_base64(&token, &ring, &clock).unwrap();
    let decoded = sso_token::decode_base64(&encoded, TokenKind::Id, &ring, &clock).unwrap();
    assert_eq!(decoded, token);
}

#[test]
fn scenario_login_token_rejects_both_credentials() {
    // spec.md §8 scenario 6: a login token naming both a password and
    // an OTP fails validation rather than silently preferring one.
    let clock = FixedClock(1000);
    let ring = ring_with_one_key(&clock);

    let token = Token::Login(LoginToken {
        username: "jdoe".into(),
        password: Some("hunter2".into()),
        otp: Some("000000".into()),
        otp_type: Some("totp".into()),
    });

    let err = sso_token::encode(&token, &ring, &clock).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[test]
fn scenario_any_kind_accepts_whatever_is_on_the_wire() {
    let clock = FixedClock(1000);
    let ring = ring_with_one_key(&clock);
    let token = Token::Id(IdToken {
        auth: "krb5".into(),
        expiration: 5000,
        subject: None,
        auth_data: None,
    });
    let ct = sso_token::encode(&token, &ring, &clock).unwrap();
    let decoded = sso_token::decode(&ct, TokenKind::Any, &ring, &clock).unwrap();
    assert_eq!(decoded.kind(), TokenKind::Id);
}

#[test]
fn scenario_tampered_envelope_never_decodes() {
    let clock = FixedClock(1000);
    let ring = ring_with_one_key(&clock);
    let token = Token::Id(IdToken {
        auth: "krb5".into(),
        expiration: 5000,
        subject: None,
        auth_data: None,
    });
    let mut ct = sso_token::encode(&token, &ring, &clock).unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 0x01;
    let err = sso_token::decode(&ct, TokenKind::Any, &ring, &clock).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadHmac);
}
