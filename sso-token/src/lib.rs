//! # sso-token
//!
//! Typed, validated, authenticated-encrypted tokens built on
//! [`sso_keyring`]. This crate owns the fourth component of the SSO
//! token core, Tokens: a closed set of kinds (see [`TokenKind`]), each
//! with its own required/forbidden field rules, serialized through the
//! shared attribute-stream codec and sealed with the shared keyring.
//!
//! A token's lifecycle has two halves:
//!
//! - [`token::encode`] validates a [`Token`] and seals it.
//! - [`token::decode`] opens an envelope, checks its kind, and
//!   validates its fields including expiration.
//!
//! Both halves are synchronous, matching the core's single-threaded
//! design; there is no background expiration sweep; a token only
//! becomes subject to its expiration check when something decodes it.

pub mod error;
pub mod kind;
pub mod record;
pub mod rules;
pub mod token;

pub use error::{Error, ErrorKind, Result};
pub use kind::TokenKind;
pub use record::{
    AppToken, CredToken, ErrorToken, IdToken, LoginToken, ProxyToken, RequestToken, Token,
    WebkdcFactorToken, WebkdcProxyToken, WebkdcServiceToken,
};
pub use token::{decode, decode_base64, encode, encode_base64};
