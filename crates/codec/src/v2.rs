//! The v2 (compressed) dialect (`bytecode_format_version >= 100`): spec
//! section 4.3.

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::sentinels::{CONTENT_HEADER_SIZE_CHANGED, MAGIC, TOKEN_BYTE_MASK};
use gdsc_core::state::ScriptState;
use gdsc_core::token::EncodedToken;
use gdsc_core::variant::VariantCodec;

use crate::common::{
    need, read_identifier_v2, read_index_value_pairs, read_u32, write_identifier_v2,
    write_index_value_pairs,
};

const OUTER_HEADER_LEN: usize = 12;

fn content_header_len(format_version: u32) -> usize {
    if format_version >= CONTENT_HEADER_SIZE_CHANGED {
        20
    } else {
        16
    }
}

/// Reads one v2 token: the local-id/payload word (1 or 4 bytes, same rule
/// as legacy) followed by an explicit 4-byte end-line - every v2 token
/// carries one, unlike the sparse `lines`/`columns` maps (spec section
/// 4.3, v2 dialect).
fn read_token(bytes: &[u8], pos: usize) -> GdscResult<(EncodedToken, u32, usize)> {
    need(bytes, pos, 1)?;
    let first = bytes[pos];
    let (tok, word_len) = if first & TOKEN_BYTE_MASK == 0 {
        (EncodedToken::from_parts(first, 0), 1)
    } else {
        need(bytes, pos, 4)?;
        let word = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        let masked = word & !(TOKEN_BYTE_MASK as u32);
        (EncodedToken::from_raw(masked), 4)
    };
    let end_line = read_u32(bytes, pos + word_len)?;
    Ok((tok, end_line, word_len + 4))
}

fn write_token(out: &mut Vec<u8>, token: EncodedToken, end_line: u32) {
    if token.requires_multi_byte_form() {
        let word = token.raw() | (TOKEN_BYTE_MASK as u32);
        out.extend(word.to_le_bytes());
    } else {
        out.push(token.local_id());
    }
    out.extend(end_line.to_le_bytes());
}

/// Decodes the (already decompressed) content body: content header,
/// identifiers, constants, lines, columns, tokens.
fn decode_content(
    content: &[u8],
    format_version: u32,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<ScriptState> {
    let header_len = content_header_len(format_version);
    need(content, 0, header_len)?;
    let identifier_count = read_u32(content, 0)? as usize;
    let constant_count = read_u32(content, 4)? as usize;
    let line_count = read_u32(content, 8)? as usize;
    let token_count_offset = header_len - 4;
    let token_count = read_u32(content, token_count_offset)? as usize;

    let mut pos = header_len;
    let mut identifiers = Vec::with_capacity(identifier_count);
    for _ in 0..identifier_count {
        let (s, used) = read_identifier_v2(content, pos)?;
        identifiers.push(s);
        pos += used;
    }

    let mut constants = Vec::with_capacity(constant_count);
    for _ in 0..constant_count {
        let remaining = content.len() - pos;
        let (value, used) = variant_codec
            .decode(revision.variant_format_major, &content[pos..], remaining)
            .map_err(|e| GdscError::VariantDecodeError(e.to_string()))?;
        constants.push(value);
        pos += used;
    }

    let (lines, used) = read_index_value_pairs(content, pos, line_count)?;
    pos += used;
    let (columns, used) = read_index_value_pairs(content, pos, line_count)?;
    pos += used;

    let mut tokens = Vec::with_capacity(token_count);
    let mut end_lines = std::collections::BTreeMap::new();
    for i in 0..token_count {
        let (tok, end_line, used) = read_token(content, pos)?;
        tokens.push(tok);
        end_lines.insert(i as u32, end_line);
        pos += used;
    }

    if pos != content.len() {
        return Err(GdscError::InvalidBuffer(format!(
            "{} residual bytes after decoding {token_count} v2 tokens",
            content.len() - pos
        )));
    }

    let state = ScriptState {
        bytecode_format_version: format_version,
        identifiers,
        constants,
        tokens,
        lines,
        end_lines,
        columns,
    };
    crate::common_checks::check_table_references(&state, revision)?;
    Ok(state)
}

pub fn decode(
    bytes: &[u8],
    format_version: u32,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<ScriptState> {
    need(bytes, 0, OUTER_HEADER_LEN)?;
    let decompressed_len = read_u32(bytes, 8)? as usize;
    let compressed = &bytes[OUTER_HEADER_LEN..];

    if decompressed_len == 0 {
        if !compressed.is_empty() {
            return Err(GdscError::InvalidBuffer(
                "decompressed length is 0 but trailing bytes remain".to_string(),
            ));
        }
        return decode_content(&[], format_version, revision, variant_codec);
    }

    let content = zstd::decode_all(compressed)
        .map_err(|e| GdscError::CompressionError(e.to_string()))?;
    if content.len() != decompressed_len {
        return Err(GdscError::CompressionError(format!(
            "decompressed length mismatch: header says {decompressed_len}, got {}",
            content.len()
        )));
    }
    decode_content(&content, format_version, revision, variant_codec)
}

fn encode_content(
    state: &ScriptState,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<Vec<u8>> {
    let mut content = Vec::new();
    content.extend((state.identifiers.len() as u32).to_le_bytes());
    content.extend((state.constants.len() as u32).to_le_bytes());
    content.extend((state.lines.len() as u32).to_le_bytes());
    if state.bytecode_format_version >= CONTENT_HEADER_SIZE_CHANGED {
        content.extend(0u32.to_le_bytes());
    }
    content.extend((state.tokens.len() as u32).to_le_bytes());

    for id in &state.identifiers {
        write_identifier_v2(&mut content, id);
    }
    let encode_full_objects = revision
        .flags
        .contains(gdsc_core::revision::RevisionFlags::ENCODE_FULL_OBJECTS);
    for c in &state.constants {
        let bytes = variant_codec
            .encode(revision.variant_format_major, c, encode_full_objects)
            .map_err(|e| GdscError::VariantEncodeError(e.to_string()))?;
        content.extend(bytes);
    }
    write_index_value_pairs(&mut content, &state.lines);
    write_index_value_pairs(&mut content, &state.columns);
    for (i, tok) in state.tokens.iter().enumerate() {
        let end_line = state.end_lines.get(&(i as u32)).copied().unwrap_or(0);
        write_token(&mut content, *tok, end_line);
    }

    Ok(content)
}

pub fn encode(
    state: &ScriptState,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<Vec<u8>> {
    let content = encode_content(state, revision, variant_codec)?;

    let mut out = Vec::new();
    out.extend(MAGIC);
    out.extend(state.bytecode_format_version.to_le_bytes());

    if content.is_empty() {
        out.extend(0u32.to_le_bytes());
        return Ok(out);
    }

    out.extend((content.len() as u32).to_le_bytes());
    let compressed =
        zstd::encode_all(content.as_slice(), 0).map_err(|e| GdscError::CompressionError(e.to_string()))?;
    out.extend(compressed);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use gdsc_core::token::GlobalToken;
    use gdsc_core::variant::Variant;
    use gdsc_variant::GdscriptVariantCodec;

    fn test_revision(format_version: u32) -> RevisionDescriptor {
        RevisionDescriptor {
            commit_id: 100,
            engine_version_min: "4.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: format_version,
            variant_format_major: 4,
            token_table: vec![
                GlobalToken::Empty,
                GlobalToken::Identifier,
                GlobalToken::Constant,
                GlobalToken::Newline,
                GlobalToken::Eof,
                GlobalToken::Var,
                GlobalToken::OpAssign,
            ],
            function_table: vec![],
            function_arity_overrides: Default::default(),
            parent_commit_id: None,
            flags: RevisionFlags::IS_V2_DIALECT,
        }
    }

    #[test]
    fn empty_script_round_trips_without_compression() {
        let rev = test_revision(100);
        let codec = GdscriptVariantCodec;
        let state = ScriptState::new(100);
        let bytes = encode(&state, &rev, &codec).unwrap();
        // bytes 8..12 must be the decompressed length (0 here).
        assert_eq!(&bytes[8..12], &0u32.to_le_bytes());
        let decoded = decode(&bytes, 100, &rev, &codec).unwrap();
        assert!(decoded.is_empty_script());
    }

    #[test]
    fn many_identifiers_round_trip_through_compression() {
        let rev = test_revision(100);
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(100);
        for i in 0..50 {
            state.identifiers.push(format!("ident_{i}"));
            state.constants.push(Variant::Int(i));
            state.tokens.push(EncodedToken::from_parts(1, i as u32));
            state.lines.insert(i as u32, (i + 1) as u32);
            state.columns.insert(i as u32, 1);
            state.end_lines.insert(i as u32, (i + 1) as u32);
        }
        let bytes = encode(&state, &rev, &codec).unwrap();
        let declared_len = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        assert!(declared_len > 0);
        let decoded = decode(&bytes, 100, &rev, &codec).unwrap();
        assert_eq!(decoded.identifiers, state.identifiers);
        assert_eq!(decoded.constants, state.constants);
        assert_eq!(decoded.lines, state.lines);
        assert_eq!(decoded.columns, state.columns);
    }

    #[test]
    fn format_101_uses_20_byte_content_header() {
        let rev = test_revision(101);
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(101);
        state.identifiers.push("x".to_string());
        state.tokens.push(EncodedToken::from_parts(1, 0));
        state.end_lines.insert(0, 1);
        let bytes = encode(&state, &rev, &codec).unwrap();
        let decoded = decode(&bytes, 101, &rev, &codec).unwrap();
        assert_eq!(decoded.identifiers, vec!["x".to_string()]);
    }

    #[test]
    fn decompressed_length_mismatch_is_compression_error() {
        let rev = test_revision(100);
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(100);
        state.identifiers.push("x".to_string());
        state.tokens.push(EncodedToken::from_parts(1, 0));
        state.end_lines.insert(0, 1);
        let mut bytes = encode(&state, &rev, &codec).unwrap();
        // Corrupt the declared decompressed length.
        let bad_len = (999u32).to_le_bytes();
        bytes[8..12].copy_from_slice(&bad_len);
        let err = decode(&bytes, 100, &rev, &codec).unwrap_err();
        assert!(matches!(err, GdscError::CompressionError(_)));
    }
}
