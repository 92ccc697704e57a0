//! End-to-end scenarios exercising the facade across decode, validate,
//! reconstruct, and compile together.

use std::sync::Arc;

use gdsc_core::registry::registry;
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::sentinels::MAGIC;
use gdsc_variant::GdscriptVariantCodec;

fn find_revision(commit_id: u32) -> Arc<RevisionDescriptor> {
    registry().find_by_commit(commit_id).expect("revision should be registered")
}

#[test]
fn s1_empty_script_legacy() {
    let rev = find_revision(0x0001_0000);
    let mut bytes = Vec::new();
    bytes.extend(MAGIC);
    bytes.extend(rev.bytecode_format_version.to_le_bytes());
    bytes.extend(0u32.to_le_bytes()); // identifier_count
    bytes.extend(0u32.to_le_bytes()); // constant_count
    bytes.extend(0u32.to_le_bytes()); // line_count
    bytes.extend(0u32.to_le_bytes()); // token_count

    let text = gdsc::decompile_for(&bytes, &rev).expect("decompile_for should succeed");
    assert_eq!(text, "");

    let codec = GdscriptVariantCodec;
    assert_eq!(gdsc_diagnose::validate(&bytes, &rev, &codec, true), gdsc_diagnose::Verdict::Pass);
}

#[test]
fn s2_minimal_assignment_legacy() {
    let rev = find_revision(0x0001_0000);
    let source = "var x = 1\n";
    let bytes = gdsc::compile(source, &rev).expect("compile should succeed");
    let decoded_text = gdsc::decompile_for(&bytes, &rev).expect("decompile_for should succeed");
    assert_eq!(decoded_text, source);
}

#[test]
fn s4_multi_byte_token_round_trips() {
    let rev = find_revision(0x0001_0000);
    let codec = GdscriptVariantCodec;
    let mut state = gdsc_core::ScriptState::new(rev.bytecode_format_version);
    for i in 0..150 {
        state.identifiers.push(format!("v{i}"));
    }
    let local_id = rev.local_id_of(gdsc_core::GlobalToken::Identifier).unwrap();
    state.tokens.push(gdsc_core::EncodedToken::from_parts(local_id, 149));
    assert!(state.tokens[0].requires_multi_byte_form());

    let bytes = gdsc_codec::encode(&state, &rev, &codec).unwrap();
    let decoded = gdsc_codec::decode(&bytes, &rev, &codec).unwrap();
    assert_eq!(decoded.tokens, state.tokens);

    let re_encoded = gdsc_codec::encode(&decoded, &rev, &codec).unwrap();
    assert_eq!(re_encoded, bytes);
}

#[test]
fn s5_v2_compressed_round_trip() {
    let rev = find_revision(0x0004_0000);
    assert_eq!(rev.bytecode_format_version, 100);

    let mut source = String::new();
    for i in 0..50 {
        source.push_str(&format!("var ident_{i} = {i}\n"));
    }

    let bytes = gdsc::compile(&source, &rev).expect("compile should succeed");
    assert!(bytes.len() >= 12);
    let decompressed_len = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    assert!(decompressed_len > 0);

    let codec = GdscriptVariantCodec;
    let state_a = gdsc_codec::decode(&bytes, &rev, &codec).unwrap();
    let text = gdsc_lang::reconstruct(&state_a, &rev).unwrap();
    let re_bytes = gdsc::compile(&text, &rev).expect("recompiling reconstructed text should succeed");
    let state_b = gdsc_codec::decode(&re_bytes, &rev, &codec).unwrap();

    assert_eq!(state_a.identifiers, state_b.identifiers);
    assert_eq!(state_a.constants, state_b.constants);
    assert_eq!(state_a.tokens, state_b.tokens);
}

#[test]
fn s6_comment_preservation_is_not_guaranteed() {
    let rev = find_revision(0x0001_0000);
    let bytes = gdsc::compile("# hello\nvar x = 1\n", &rev).expect("compile should succeed");
    let text = gdsc::decompile_for(&bytes, &rev).expect("decompile_for should succeed");
    assert_eq!(text, "var x = 1\n");
}
