//! Bits shared by both buffer dialects (spec section 4.3): the token word
//! encoding, the identifier XOR mask, and 4-byte-boundary padding. Kept in
//! one place so `legacy` and `v2` can't drift apart on them.

use gdsc_core::error::GdscError;
use gdsc_core::sentinels::{IDENTIFIER_XOR, TOKEN_BYTE_MASK};
use gdsc_core::token::EncodedToken;

pub fn need(bytes: &[u8], pos: usize, n: usize) -> Result<(), GdscError> {
    if pos + n > bytes.len() {
        return Err(GdscError::InvalidBuffer(format!(
            "buffer truncated: need {n} bytes at offset {pos}, only {} remain",
            bytes.len().saturating_sub(pos)
        )));
    }
    Ok(())
}

pub fn read_u32(bytes: &[u8], pos: usize) -> Result<u32, GdscError> {
    need(bytes, pos, 4)?;
    Ok(u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()))
}

/// Reads one encoded token's local-id/payload word, in either the 1-byte
/// or 4-byte wire form (spec section 3, "Encoded Token"). Returns the token
/// and how many bytes the local-id/payload portion consumed - callers that
/// append a trailing end-line (the v2 dialect) read that separately.
pub fn read_token_word(bytes: &[u8], pos: usize) -> Result<(EncodedToken, usize), GdscError> {
    need(bytes, pos, 1)?;
    let first = bytes[pos];
    if first & TOKEN_BYTE_MASK == 0 {
        Ok((EncodedToken::from_parts(first, 0), 1))
    } else {
        need(bytes, pos, 4)?;
        let word = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        let masked = word & !(TOKEN_BYTE_MASK as u32);
        Ok((EncodedToken::from_raw(masked), 4))
    }
}

/// Writes one encoded token's local-id/payload word, choosing the 1-byte
/// form when the token allows it.
pub fn write_token_word(out: &mut Vec<u8>, token: EncodedToken) {
    if token.requires_multi_byte_form() {
        let word = token.raw() | (TOKEN_BYTE_MASK as u32);
        out.extend(word.to_le_bytes());
    } else {
        out.push(token.local_id());
    }
}

/// Reads a legacy-dialect identifier: a 32-bit length, that many
/// `0xB6`-masked bytes, a masked null terminator, padded to a 4-byte
/// boundary (spec section 4.3, legacy dialect).
pub fn read_identifier_legacy(bytes: &[u8], pos: usize) -> Result<(String, usize), GdscError> {
    let len = read_u32(bytes, pos)? as usize;
    let header = 4;
    need(bytes, pos + header, len)?;
    let masked = &bytes[pos + header..pos + header + len];
    let unmasked: Vec<u8> = masked.iter().map(|b| b ^ IDENTIFIER_XOR).collect();
    let s = String::from_utf8(unmasked)
        .map_err(|e| GdscError::InvalidBuffer(format!("identifier is not valid UTF-8: {e}")))?;
    let total_before_pad = header + len + 1;
    let padded = total_before_pad.div_ceil(4) * 4;
    need(bytes, pos, padded)?;
    Ok((s, padded))
}

pub fn write_identifier_legacy(out: &mut Vec<u8>, s: &str) {
    let content = s.as_bytes();
    out.extend((content.len() as u32).to_le_bytes());
    for &b in content {
        out.push(b ^ IDENTIFIER_XOR);
    }
    out.push(0 ^ IDENTIFIER_XOR);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Reads a v2-dialect identifier: a 32-bit code-point count, then that many
/// UTF-32 code points, each 4 `0xB6`-masked little-endian bytes (spec
/// section 4.3, v2 dialect).
pub fn read_identifier_v2(bytes: &[u8], pos: usize) -> Result<(String, usize), GdscError> {
    let count = read_u32(bytes, pos)? as usize;
    let mut consumed = 4;
    let mut s = String::with_capacity(count);
    for _ in 0..count {
        need(bytes, pos + consumed, 4)?;
        let masked = &bytes[pos + consumed..pos + consumed + 4];
        let raw: [u8; 4] = [
            masked[0] ^ IDENTIFIER_XOR,
            masked[1] ^ IDENTIFIER_XOR,
            masked[2] ^ IDENTIFIER_XOR,
            masked[3] ^ IDENTIFIER_XOR,
        ];
        let cp = u32::from_le_bytes(raw);
        let c = char::from_u32(cp).ok_or_else(|| {
            GdscError::InvalidBuffer(format!("identifier contains invalid code point {cp:#x}"))
        })?;
        s.push(c);
        consumed += 4;
    }
    Ok((s, consumed))
}

pub fn write_identifier_v2(out: &mut Vec<u8>, s: &str) {
    let chars: Vec<char> = s.chars().collect();
    out.extend((chars.len() as u32).to_le_bytes());
    for c in chars {
        let raw = (c as u32).to_le_bytes();
        for b in raw {
            out.push(b ^ IDENTIFIER_XOR);
        }
    }
}

/// Reads `count` `(token_index, value)` pairs (spec section 4.3's line-map
/// and, for v2, columns map).
pub fn read_index_value_pairs(
    bytes: &[u8],
    pos: usize,
    count: usize,
) -> Result<(std::collections::BTreeMap<u32, u32>, usize), GdscError> {
    let mut map = std::collections::BTreeMap::new();
    let mut consumed = 0;
    for _ in 0..count {
        let idx = read_u32(bytes, pos + consumed)?;
        consumed += 4;
        let val = read_u32(bytes, pos + consumed)?;
        consumed += 4;
        map.insert(idx, val);
    }
    Ok((map, consumed))
}

pub fn write_index_value_pairs(out: &mut Vec<u8>, map: &std::collections::BTreeMap<u32, u32>) {
    for (idx, val) in map {
        out.extend(idx.to_le_bytes());
        out.extend(val.to_le_bytes());
    }
}
