//! The Validation Engine (spec section 4.6): classifies a candidate buffer
//! as PASS/FAIL/CORRUPT under a chosen revision.
//!
//! `FAIL` carries a reason and a best-effort line number; `CORRUPT` means
//! the buffer could not even be decoded. Neither variant is a `GdscError` -
//! spec section 7 states `ValidationFail` "is used only as a return value
//! from validate, never propagated," so this lives as its own local type
//! rather than growing the shared error enum.

use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::GlobalToken;
use gdsc_core::variant::VariantCodec;

/// The outcome of classifying one buffer under one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { reason: String, line: u32 },
    Corrupt { reason: String },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

fn line_of(state: &ScriptState, index: usize) -> u32 {
    state.lines.get(&(index as u32)).copied().unwrap_or(0)
}

fn is_relaxed_position(state: &ScriptState, revision: &RevisionDescriptor, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    let Some(prev) = state.tokens.get(index - 1) else {
        return false;
    };
    let Some(prev_global) = revision.global_of(prev.local_id()) else {
        return false;
    };
    matches!(prev_global, GlobalToken::Period | GlobalToken::Function)
}

/// Counts comma-separated arguments at nesting level zero between a call's
/// opening paren (at `paren_index`) and its matching close, per spec rule
/// 10's "walking forward from the opening paren" description.
fn count_call_arguments(state: &ScriptState, revision: &RevisionDescriptor, paren_index: usize) -> u32 {
    let mut depth: i32 = 0;
    let mut args: u32 = 0;
    let mut saw_any_token = false;
    for tok in &state.tokens[paren_index..] {
        let Some(global) = revision.global_of(tok.local_id()) else {
            continue;
        };
        match global {
            GlobalToken::ParenthesisOpen | GlobalToken::BracketOpen | GlobalToken::CurlyBracketOpen => {
                depth += 1;
                if depth > 1 {
                    saw_any_token = true;
                }
            }
            GlobalToken::ParenthesisClose | GlobalToken::BracketClose | GlobalToken::CurlyBracketClose => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                saw_any_token = true;
            }
            GlobalToken::Comma if depth == 1 => {
                args += 1;
            }
            _ => {
                if depth >= 1 {
                    saw_any_token = true;
                }
            }
        }
    }
    if saw_any_token {
        args + 1
    } else {
        0
    }
}

/// Validates an already-decoded [`ScriptState`] (spec section 4.6, rules
/// 1-10), given the raw buffer's own declared format version for rule 1.
fn validate_decoded(
    state: &ScriptState,
    revision: &RevisionDescriptor,
    declared_format_version: u32,
) -> Verdict {
    if declared_format_version != revision.bytecode_format_version {
        return Verdict::Fail {
            reason: format!(
                "buffer format version {declared_format_version} does not match revision format version {}",
                revision.bytecode_format_version
            ),
            line: 0,
        };
    }

    for (i, tok) in state.tokens.iter().enumerate() {
        let local_id = tok.local_id();
        if local_id as usize >= revision.token_table.len() {
            return Verdict::Fail {
                reason: format!("token {i} has local id {local_id}, outside this revision's token table"),
                line: line_of(state, i),
            };
        }
        let global = revision.token_table[local_id as usize];

        match global {
            GlobalToken::BuiltInFunc => {
                let idx = tok.payload() as usize;
                if idx >= revision.function_table.len() {
                    return Verdict::Fail {
                        reason: format!("token {i} references function {idx}, outside this revision's function table"),
                        line: line_of(state, i),
                    };
                }
            }
            GlobalToken::Error if !revision.is_v2() => {
                return Verdict::Fail {
                    reason: format!("token {i} is an ERROR token, not allowed in the legacy dialect"),
                    line: line_of(state, i),
                };
            }
            GlobalToken::Cursor | GlobalToken::Max => {
                return Verdict::Fail {
                    reason: format!("token {i} is a {global:?} token, never valid in a serialized buffer"),
                    line: line_of(state, i),
                };
            }
            _ => {}
        }

        if is_relaxed_position(state, revision, i) {
            continue;
        }

        match global {
            GlobalToken::Function => {
                let next_two = &state.tokens[i + 1..(i + 3).min(state.tokens.len())];
                let globals: Vec<GlobalToken> = next_two
                    .iter()
                    .filter_map(|t| revision.global_of(t.local_id()))
                    .collect();
                let ok = if revision.is_v2() && globals.first() == Some(&GlobalToken::ParenthesisOpen) {
                    true
                } else {
                    globals.first() == Some(&GlobalToken::Identifier)
                        && globals.get(1) == Some(&GlobalToken::ParenthesisOpen)
                };
                if !ok {
                    return Verdict::Fail {
                        reason: format!("token {i} (FUNCTION) is not followed by identifier+'(' or a lambda '('"),
                        line: line_of(state, i),
                    };
                }
            }
            GlobalToken::Enum => {
                let next = state
                    .tokens
                    .get(i + 1)
                    .and_then(|t| revision.global_of(t.local_id()));
                if !matches!(next, Some(GlobalToken::Identifier) | Some(GlobalToken::CurlyBracketOpen)) {
                    return Verdict::Fail {
                        reason: format!("token {i} (ENUM) is not followed by IDENTIFIER or '{{'"),
                        line: line_of(state, i),
                    };
                }
            }
            GlobalToken::Static => {
                let next = state
                    .tokens
                    .get(i + 1)
                    .and_then(|t| revision.global_of(t.local_id()));
                let ok = if revision.is_v2() {
                    matches!(next, Some(GlobalToken::Function) | Some(GlobalToken::Var))
                } else {
                    matches!(next, Some(GlobalToken::Function))
                };
                if !ok {
                    return Verdict::Fail {
                        reason: format!("token {i} (STATIC) is not followed by FUNCTION{}", if revision.is_v2() { " or VAR" } else { "" }),
                        line: line_of(state, i),
                    };
                }
            }
            GlobalToken::Pass if !revision.is_v2() => {
                let next = state
                    .tokens
                    .get(i + 1)
                    .and_then(|t| revision.global_of(t.local_id()));
                if !matches!(next, Some(GlobalToken::Newline) | Some(GlobalToken::Semicolon) | Some(GlobalToken::Eof)) {
                    return Verdict::Fail {
                        reason: format!("token {i} (PASS) is not followed by NEWLINE, SEMICOLON, or EOF"),
                        line: line_of(state, i),
                    };
                }
            }
            _ => {}
        }

        if matches!(global, GlobalToken::BuiltInFunc) {
            if let Some(next) = state.tokens.get(i + 1) {
                if revision.global_of(next.local_id()) == Some(GlobalToken::ParenthesisOpen) {
                    let arity = revision.arity_of(&state_func_name(state, revision, tok.payload() as usize));
                    let args = count_call_arguments(state, revision, i + 1);
                    if args < arity.0 || args > arity.1 {
                        return Verdict::Fail {
                            reason: format!(
                                "call to {} at token {i} passes {args} argument(s), expected {}..={}",
                                state_func_name(state, revision, tok.payload() as usize),
                                arity.0,
                                arity.1
                            ),
                            line: line_of(state, i),
                        };
                    }
                }
            }
        }
    }

    Verdict::Pass
}

fn state_func_name(_state: &ScriptState, revision: &RevisionDescriptor, index: usize) -> String {
    revision
        .function_table
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("<func:{index}>"))
}

/// Classifies `bytes` under `revision` (spec section 4.6's public contract).
///
/// `verbose` currently only affects whether decode/table-reference errors
/// are folded into the `CORRUPT` reason verbatim (true) or summarized
/// (false); both still return `Corrupt`.
pub fn validate(
    bytes: &[u8],
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
    verbose: bool,
) -> Verdict {
    if bytes.len() < 8 {
        return Verdict::Corrupt {
            reason: "buffer shorter than the common header".to_string(),
        };
    }
    let declared_format_version = u32::from_le_bytes(
        bytes[4..8]
            .try_into()
            .expect("slice of length 4 converts to [u8; 4]"),
    );

    match gdsc_codec::decode(bytes, revision, variant_codec) {
        Ok(state) => validate_decoded(&state, revision, declared_format_version),
        Err(e) => Verdict::Corrupt {
            reason: if verbose {
                e.to_string()
            } else {
                "buffer could not be decoded under this revision".to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use gdsc_core::token::EncodedToken;
    use gdsc_variant::GdscriptVariantCodec;
    use std::collections::HashMap;

    fn test_revision() -> RevisionDescriptor {
        use GlobalToken::*;
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "3.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 13,
            variant_format_major: 1,
            token_table: vec![
                Empty, Identifier, Constant, Newline, Eof, Var, OpAssign, Function, Pass, Semicolon,
                ParenthesisOpen, ParenthesisClose, BuiltInFunc, Comma,
            ],
            function_table: vec!["print".to_string()],
            function_arity_overrides: HashMap::new(),
            parent_commit_id: None,
            flags: RevisionFlags::empty(),
        }
    }

    #[test]
    fn too_short_buffer_is_corrupt() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let verdict = validate(&[1, 2, 3], &rev, &codec, true);
        assert!(matches!(verdict, Verdict::Corrupt { .. }));
    }

    #[test]
    fn mismatched_format_version_fails() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(99);
        state.tokens.push(EncodedToken::from_parts(4, 0));
        let bytes = gdsc_codec::encode(&state, &rev, &codec).unwrap();
        let verdict = validate(&bytes, &rev, &codec, true);
        assert!(matches!(verdict, Verdict::Fail { .. }));
    }

    #[test]
    fn pass_not_followed_by_terminator_fails() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(13);
        state.tokens = vec![
            EncodedToken::from_parts(8, 0), // Pass
            EncodedToken::from_parts(1, 0), // Identifier -- not a valid follower
        ];
        state.identifiers.push("x".to_string());
        let bytes = gdsc_codec::encode(&state, &rev, &codec).unwrap();
        let verdict = validate(&bytes, &rev, &codec, true);
        assert!(matches!(verdict, Verdict::Fail { .. }));
    }

    #[test]
    fn well_formed_minimal_script_passes() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(13);
        state.identifiers.push("x".to_string());
        state.constants.push(gdsc_core::variant::Variant::Int(1));
        state.tokens = vec![
            EncodedToken::from_parts(5, 0), // Var
            EncodedToken::from_parts(1, 0), // Identifier(0)
            EncodedToken::from_parts(6, 0), // OpAssign
            EncodedToken::from_parts(2, 0), // Constant(0)
            EncodedToken::from_parts(3, 0), // Newline
            EncodedToken::from_parts(4, 0), // Eof
        ];
        let bytes = gdsc_codec::encode(&state, &rev, &codec).unwrap();
        let verdict = validate(&bytes, &rev, &codec, true);
        assert_eq!(verdict, Verdict::Pass);
    }
}
