//! Shared helpers for translating typed field values to and from the
//! attribute stream's raw `(name, bytes)` pairs. Each token kind's
//! `to_attrs`/`from_attrs` in [`crate::record`] is a flat list built
//! from these primitives; there is no generic descriptor table because
//! every kind's field set and required/forbidden logic differs enough
//! that a table would just be `match` in disguise.

use sso_keyring::codec;

use crate::error::{err, ErrorKind, Result};

/// How a single field's Rust value is represented on the wire.
pub(crate) enum AttrValue<'a> {
    Str(&'a str),
    Bytes(&'a [u8]),
    UInt(u32),
    Time(u64),
}

pub(crate) fn attr_bytes(value: AttrValue<'_>) -> Vec<u8> {
    match value {
        AttrValue::Str(s) => s.as_bytes().to_vec(),
        AttrValue::Bytes(b) => b.to_vec(),
        AttrValue::UInt(v) => codec::encode_uint(v),
        AttrValue::Time(v) => codec::encode_time(v),
    }
}

pub(crate) fn parse_str(bytes: &[u8], attr: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| err!(ErrorKind::Corrupt, "attribute {attr} is not valid UTF-8"))
}

pub(crate) fn require_str(attrs: &[(String, Vec<u8>)], name: &str) -> Result<String> {
    parse_str(codec::require(attrs, name)?, name)
}

pub(crate) fn find_str(attrs: &[(String, Vec<u8>)], name: &str) -> Result<Option<String>> {
    match codec::find(attrs, name) {
        Some(bytes) => Ok(Some(parse_str(bytes, name)?)),
        None => Ok(None),
    }
}

pub(crate) fn require_bytes(attrs: &[(String, Vec<u8>)], name: &str) -> Result<Vec<u8>> {
    Ok(codec::require(attrs, name)?.to_vec())
}

pub(crate) fn find_bytes(attrs: &[(String, Vec<u8>)], name: &str) -> Option<Vec<u8>> {
    codec::find(attrs, name).map(|b| b.to_vec())
}

pub(crate) fn require_time(attrs: &[(String, Vec<u8>)], name: &str) -> Result<u64> {
    Ok(codec::parse_time(codec::require(attrs, name)?, name)?)
}

pub(crate) fn find_time(attrs: &[(String, Vec<u8>)], name: &str) -> Result<u64> {
    match codec::find(attrs, name) {
        Some(bytes) => Ok(codec::parse_time(bytes, name)?),
        None => Ok(0),
    }
}

pub(crate) fn find_uint(attrs: &[(String, Vec<u8>)], name: &str) -> Result<u32> {
    match codec::find(attrs, name) {
        Some(bytes) => Ok(codec::parse_uint(bytes, name)?),
        None => Ok(0),
    }
}

/// Like `find_uint`, but a missing or zero value is `Corrupt` — for
/// attributes such as `error`'s `code`, where `0` is not a legal value.
pub(crate) fn require_uint(attrs: &[(String, Vec<u8>)], name: &str) -> Result<u32> {
    let v = find_uint(attrs, name)?;
    if v == 0 {
        return Err(err!(ErrorKind::Corrupt, "missing {name} attribute"));
    }
    Ok(v)
}

/// Validate a field that must be one of a fixed set of strings. An
/// unrecognized value is malformed data, not a semantically-invalid-but
/// well-formed token, so this is `Corrupt` rather than `Invalid`.
pub(crate) fn require_enum<'a>(value: &str, field: &str, allowed: &[&'a str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(err!(
            ErrorKind::Corrupt,
            "field {field} has unrecognized value {value:?} (want one of {allowed:?})"
        ))
    }
}
