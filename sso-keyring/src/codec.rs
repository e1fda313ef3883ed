//! Attribute stream codec.
//!
//! On-wire format: a concatenation of `name '=' value ';'` records with
//! `\` escaping any literal `;` or `\` inside `value`. Used both for the
//! keyring file format (§6.1) and, by `sso-token`, for token attribute
//! streams. This module only knows about raw `(name, value_bytes)`
//! pairs in order; interpreting a value as a string, byte string,
//! `uint32`, or timestamp is the caller's job via the `encode_uint`/
//! `parse_uint` family below.

use crate::error::{err, ErrorKind, Result};

/// Encode a single escaped value into `out`.
fn write_escaped(out: &mut Vec<u8>, value: &[u8]) {
    for &b in value {
        if b == b';' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
}

/// Encode an ordered list of `(name, value)` pairs into an attribute
/// stream. No ordering is imposed beyond the order given; callers
/// supply attributes in their rule-table order for determinism.
pub fn encode(attrs: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in attrs {
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        write_escaped(&mut out, value);
        out.push(b';');
    }
    out
}

/// Decode an attribute stream into ordered `(name, value)` pairs.
/// Unescapes `value`. Fails with `Corrupt` on malformed framing (an
/// unterminated record, a dangling escape byte, or a missing `=`).
pub fn decode(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut out = Vec::new();
    let mut i = 0;
    let len = data.len();

    while i < len {
        let eq = find_unescaped(data, i, b'=')
            .ok_or_else(|| err!(ErrorKind::Corrupt, "missing '=' in attribute stream"))?;
        let name = std::str::from_utf8(&data[i..eq])
            .map_err(|_| err!(ErrorKind::Corrupt, "attribute name is not valid ASCII"))?
            .to_string();
        if name.is_empty() {
            return Err(err!(ErrorKind::Corrupt, "empty attribute name"));
        }

        let mut j = eq + 1;
        let mut value = Vec::new();
        let mut terminated = false;
        while j < len {
            match data[j] {
                b'\\' => {
                    j += 1;
                    if j >= len {
                        return Err(err!(
                            ErrorKind::Corrupt,
                            "dangling escape at end of attribute stream"
                        ));
                    }
                    value.push(data[j]);
                    j += 1;
                }
                b';' => {
                    terminated = true;
                    j += 1;
                    break;
                }
                b => {
                    value.push(b);
                    j += 1;
                }
            }
        }
        if !terminated {
            return Err(err!(
                ErrorKind::Corrupt,
                "attribute {name} is missing its terminating ';'"
            ));
        }

        out.push((name, value));
        i = j;
    }

    Ok(out)
}

/// Find the index of the first unescaped occurrence of `target` at or
/// after `from`.
fn find_unescaped(data: &[u8], from: usize, target: u8) -> Option<usize> {
    let mut i = from;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 2,
            b if b == target => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Format a `u32` as ASCII decimal (the wire representation of
/// `uint32` attributes).
pub fn encode_uint(v: u32) -> Vec<u8> {
    v.to_string().into_bytes()
}

/// Parse an ASCII-decimal `uint32` attribute value.
pub fn parse_uint(bytes: &[u8], attr: &str) -> Result<u32> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| err!(ErrorKind::Corrupt, "invalid uint32 in attribute {attr}"))
}

/// Format a `u64` timestamp as ASCII decimal (the wire representation
/// of `time` attributes).
pub fn encode_time(v: u64) -> Vec<u8> {
    v.to_string().into_bytes()
}

/// Parse an ASCII-decimal `time` attribute value.
pub fn parse_time(bytes: &[u8], attr: &str) -> Result<u64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| err!(ErrorKind::Corrupt, "invalid timestamp in attribute {attr}"))
}

/// Look up a required attribute's raw value by name, failing with
/// `Corrupt` if absent. Only the first occurrence is returned — later
/// duplicates are ignored, matching the codec's forward-compatibility
/// stance on unrecognized data.
pub fn require<'a>(attrs: &'a [(String, Vec<u8>)], name: &str) -> Result<&'a [u8]> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_slice())
        .ok_or_else(|| err!(ErrorKind::Corrupt, "missing required attribute {name}"))
}

/// Look up an optional attribute's raw value by name.
pub fn find<'a>(attrs: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
}
