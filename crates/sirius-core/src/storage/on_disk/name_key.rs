//! Packed 6-bit name-key encoding used by the on-disk catalog.
//!
//! A table name (at most 16 characters, drawn from a 64-symbol alphabet) is
//! packed 6 bits per character into a 96-bit (12-byte) key so the catalog can
//! use a fixed-size record regardless of name length.

use crate::error::{EngineError, EngineResult};

/// Number of character slots a name key can hold.
pub const MAX_NAME_LEN: usize = 16;
/// Size in bytes of a packed name key.
pub const KEY_LEN: usize = 12;

/// The code used to pad unused character slots; trimmed back off on decode.
const PAD_CODE: u8 = 62; // '_'

fn char_code(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a' + 26),
        b'0'..=b'9' => Some(c - b'0' + 52),
        b'_' => Some(62),
        b'-' => Some(63),
        _ => None,
    }
}

fn code_char(code: u8) -> u8 {
    match code {
        0..=25 => b'A' + code,
        26..=51 => b'a' + (code - 26),
        52..=61 => b'0' + (code - 52),
        62 => b'_',
        _ => b'-',
    }
}

/// Validates a table name against the catalog's character set and length
/// constraints (at most 16 characters, every character in the alphabet, not
/// ending in `_` since that would be indistinguishable from padding, and not
/// composed entirely of `-`).
pub fn validate_table_name(name: &str) -> EngineResult<()> {
    if name.is_empty() {
        return Err(EngineError::NameError("table name cannot be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::NameError(format!(
            "table name '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name.ends_with('_') {
        return Err(EngineError::NameError(format!(
            "table name '{name}' cannot end with '_'"
        )));
    }
    if name.bytes().all(|b| b == b'-') {
        return Err(EngineError::NameError(
            "table name cannot consist only of '-'".into(),
        ));
    }
    if let Some(bad) = name.bytes().find(|&b| char_code(b).is_none()) {
        return Err(EngineError::NameError(format!(
            "table name '{name}' contains an unsupported character: '{}'",
            bad as char
        )));
    }
    Ok(())
}

/// Packs a validated table name into its 12-byte catalog key.
pub fn encode(name: &str) -> EngineResult<[u8; KEY_LEN]> {
    validate_table_name(name)?;
    let bytes = name.as_bytes();
    let mut buffer = [0u8; KEY_LEN];
    for i in 0..MAX_NAME_LEN {
        let code = if i < bytes.len() {
            char_code(bytes[i]).expect("validated above")
        } else {
            PAD_CODE
        };
        let bit_pos = i * 6;
        let byte_index = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;
        buffer[byte_index] |= code << bit_in_byte;
        if bit_in_byte > 2 {
            buffer[byte_index + 1] |= code >> (8 - bit_in_byte);
        }
    }
    Ok(buffer)
}

/// Unpacks a 12-byte catalog key back into its table name, trimming the
/// trailing padding characters.
#[must_use]
pub fn decode(key: &[u8; KEY_LEN]) -> String {
    let mut codes = [0u8; MAX_NAME_LEN];
    for (i, code) in codes.iter_mut().enumerate() {
        let bit_pos = i * 6;
        let byte_index = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;
        let mut c = key[byte_index] >> bit_in_byte;
        if bit_in_byte > 2 {
            c |= key[byte_index + 1] << (8 - bit_in_byte);
        }
        *code = c & 0x3F;
    }
    let mut chars: Vec<u8> = codes.iter().map(|&c| code_char(c)).collect();
    while chars.last() == Some(&b'_') {
        chars.pop();
    }
    String::from_utf8(chars).expect("alphabet is ASCII")
}

/// Marker written over a dropped catalog record; unreachable as a real key
/// since it decodes to 16 `-` characters, which [`validate_table_name`]
/// never allows a live table to be named.
pub const TOMBSTONE: [u8; KEY_LEN] = [0xFF; KEY_LEN];
