//! The legacy dialect (`bytecode_format_version < 100`): spec section 4.3.

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::EncodedToken;
use gdsc_core::variant::VariantCodec;

use crate::common::{
    need, read_identifier_legacy, read_index_value_pairs, read_token_word, read_u32,
    write_identifier_legacy, write_index_value_pairs, write_token_word,
};

const HEADER_LEN: usize = 24;

pub fn decode(
    bytes: &[u8],
    format_version: u32,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<ScriptState> {
    need(bytes, 0, HEADER_LEN)?;
    let identifier_count = read_u32(bytes, 8)? as usize;
    let constant_count = read_u32(bytes, 12)? as usize;
    let line_count = read_u32(bytes, 16)? as usize;
    let token_count = read_u32(bytes, 20)? as usize;

    let mut pos = HEADER_LEN;
    let mut identifiers = Vec::with_capacity(identifier_count);
    for _ in 0..identifier_count {
        let (s, used) = read_identifier_legacy(bytes, pos)?;
        identifiers.push(s);
        pos += used;
    }

    let mut constants = Vec::with_capacity(constant_count);
    for _ in 0..constant_count {
        let remaining = bytes.len() - pos;
        let (value, used) = variant_codec
            .decode(revision.variant_format_major, &bytes[pos..], remaining)
            .map_err(|e| GdscError::VariantDecodeError(e.to_string()))?;
        constants.push(value);
        pos += used;
    }

    let (lines, used) = read_index_value_pairs(bytes, pos, line_count)?;
    pos += used;

    let mut tokens = Vec::with_capacity(token_count);
    for _ in 0..token_count {
        let (tok, used) = read_token_word(bytes, pos)?;
        tokens.push(tok);
        pos += used;
    }

    if pos != bytes.len() {
        return Err(GdscError::InvalidBuffer(format!(
            "{} residual bytes after decoding {token_count} tokens",
            bytes.len() - pos
        )));
    }

    let state = ScriptState {
        bytecode_format_version: format_version,
        identifiers,
        constants,
        tokens,
        lines,
        end_lines: Default::default(),
        columns: Default::default(),
    };
    crate::common_checks::check_table_references(&state, revision)?;
    Ok(state)
}

pub fn encode(
    state: &ScriptState,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<Vec<u8>> {
    let mut out = Vec::new();
    out.extend(gdsc_core::sentinels::MAGIC);
    out.extend(state.bytecode_format_version.to_le_bytes());
    out.extend((state.identifiers.len() as u32).to_le_bytes());
    out.extend((state.constants.len() as u32).to_le_bytes());
    out.extend((state.lines.len() as u32).to_le_bytes());
    out.extend((state.tokens.len() as u32).to_le_bytes());

    for id in &state.identifiers {
        write_identifier_legacy(&mut out, id);
    }
    let encode_full_objects = revision
        .flags
        .contains(gdsc_core::revision::RevisionFlags::ENCODE_FULL_OBJECTS);
    for c in &state.constants {
        let bytes = variant_codec
            .encode(revision.variant_format_major, c, encode_full_objects)
            .map_err(|e| GdscError::VariantEncodeError(e.to_string()))?;
        out.extend(bytes);
    }
    write_index_value_pairs(&mut out, &state.lines);
    for tok in &state.tokens {
        write_token_word(&mut out, *tok);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use gdsc_core::token::GlobalToken;
    use gdsc_core::variant::Variant;
    use gdsc_variant::GdscriptVariantCodec;

    fn test_revision() -> RevisionDescriptor {
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "1.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 1,
            variant_format_major: 1,
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
            flags: RevisionFlags::empty(),
        }
    }

    #[test]
    fn empty_script_round_trips() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let state = ScriptState::new(1);
        let bytes = encode(&state, &rev, &codec).unwrap();
        assert_eq!(&bytes[0..4], b"GDSC");
        let decoded = decode(&bytes, 1, &rev, &codec).unwrap();
        assert!(decoded.is_empty_script());
    }

    #[test]
    fn minimal_assignment_round_trips() {
        // var x = 1 \n eof, matching spec scenario S2's shape.
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(1);
        state.identifiers.push("x".to_string());
        state.constants.push(Variant::Int(1));
        state.tokens = vec![
            EncodedToken::from_parts(5, 0),     // Var
            EncodedToken::from_parts(1, 0),     // Identifier(0)
            EncodedToken::from_parts(6, 0),     // OpAssign
            EncodedToken::from_parts(2, 0),     // Constant(0)
            EncodedToken::from_parts(3, 0),     // Newline
            EncodedToken::from_parts(4, 0),     // Eof
        ];
        state.lines.insert(0, 1);

        let bytes = encode(&state, &rev, &codec).unwrap();
        let decoded = decode(&bytes, 1, &rev, &codec).unwrap();
        assert_eq!(decoded.identifiers, vec!["x".to_string()]);
        assert_eq!(decoded.constants, vec![Variant::Int(1)]);
        assert_eq!(decoded.tokens.len(), 6);
    }

    #[test]
    fn truncated_header_is_invalid_buffer() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let err = decode(b"GDSC", 1, &rev, &codec).unwrap_err();
        assert!(matches!(err, GdscError::InvalidBuffer(_)));
    }

    #[test]
    fn residual_bytes_are_rejected() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let state = ScriptState::new(1);
        let mut bytes = encode(&state, &rev, &codec).unwrap();
        bytes.push(0xFF);
        let err = decode(&bytes, 1, &rev, &codec).unwrap_err();
        assert!(matches!(err, GdscError::InvalidBuffer(_)));
    }

    #[test]
    fn multi_byte_token_round_trips() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(1);
        for i in 0..200 {
            state.constants.push(Variant::Int(i));
        }
        // Constant index 150 needs the 4-byte form (payload != 0).
        state.tokens.push(EncodedToken::from_parts(2, 150));
        let bytes = encode(&state, &rev, &codec).unwrap();
        assert!(state.tokens[0].requires_multi_byte_form());
        let decoded = decode(&bytes, 1, &rev, &codec).unwrap();
        assert_eq!(decoded.tokens[0].payload(), 150);
    }
}
