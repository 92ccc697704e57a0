//! Assembles a fresh [`ScriptState`] from source text (the write side of
//! spec section 6.4's `compile`).
//!
//! The Text Tokenizer only ever emits `Identifier`/`Constant` literal
//! tokens (built-in function/type resolution against a revision's
//! `function_table` is a semantic lookup, not a lexical one), so this pass
//! is the one place that has to assign identifier-table and constant-table
//! indices - in first-reference order, per spec section 4.3's
//! deterministic-emission requirement, rather than reusing whatever order
//! a decoded buffer happened to arrive in.

use std::collections::HashMap;

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::{EncodedToken, GlobalToken};
use gdsc_core::variant::Variant;
use gdsc_lang::{tokenize, TokenPayload};

/// First-reference-ordered constant table. `Variant` has no `Hash`/`Eq`
/// (floats), so this is a linear scan rather than a `HashMap` - constant
/// tables for a single script are small enough that this never matters.
#[derive(Default)]
struct ConstantTable {
    values: Vec<Variant>,
}

impl ConstantTable {
    fn index_of(&mut self, value: Variant) -> u32 {
        if let Some(pos) = self.values.iter().position(|v| *v == value) {
            return pos as u32;
        }
        self.values.push(value);
        (self.values.len() - 1) as u32
    }
}

pub fn compile_to_state(text: &str, revision: &RevisionDescriptor) -> GdscResult<ScriptState> {
    let is_v2 = revision.is_v2();
    let mut state = ScriptState::new(revision.bytecode_format_version);

    let mut identifier_ids: HashMap<String, u32> = HashMap::new();
    let mut constants = ConstantTable::default();

    for (i, rec) in tokenize(text, revision).enumerate() {
        if rec.global_token == GlobalToken::Error {
            return Err(GdscError::InvalidScriptState(format!(
                "tokenizer error at line {}, column {}: {}",
                rec.line,
                rec.column,
                rec.error_message.unwrap_or_else(|| "unknown lexical error".to_string())
            )));
        }

        let local_id = revision.local_id_of(rec.global_token).ok_or_else(|| {
            GdscError::InvalidScriptState(format!(
                "revision {:#x} does not recognize {:?}, produced at line {}",
                revision.commit_id, rec.global_token, rec.line
            ))
        })?;

        let payload = match (&rec.global_token, &rec.payload) {
            (GlobalToken::Identifier, TokenPayload::Text(name)) => {
                let next_id = identifier_ids.len() as u32;
                *identifier_ids.entry(name.clone()).or_insert_with(|| {
                    state.identifiers.push(name.clone());
                    next_id
                })
            }
            (GlobalToken::Constant, TokenPayload::Constant(value)) => constants.index_of(value.clone()),
            (GlobalToken::Newline, TokenPayload::Newline { space_indent, tab_indent }) => {
                if is_v2 {
                    0
                } else if revision.flags.contains(gdsc_core::revision::RevisionFlags::MIXED_TAB_SPACE_IS_ERROR)
                    && *space_indent > 0
                    && *tab_indent > 0
                {
                    return Err(GdscError::InvalidScriptState(format!(
                        "line {} mixes tabs and spaces for indentation, rejected by this revision",
                        rec.line
                    )));
                } else {
                    *tab_indent + *space_indent
                }
            }
            _ => 0,
        };

        state.tokens.push(EncodedToken::from_parts(local_id, payload));
        state.lines.insert(i as u32, rec.line);
        if is_v2 {
            state.columns.insert(i as u32, rec.column);
            state.end_lines.insert(i as u32, rec.line);
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use std::collections::HashMap as StdHashMap;

    fn test_revision() -> RevisionDescriptor {
        use GlobalToken::*;
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "3.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 13,
            variant_format_major: 1,
            token_table: vec![Empty, Identifier, Constant, Newline, Eof, Var, OpAssign],
            function_table: vec![],
            function_arity_overrides: StdHashMap::new(),
            parent_commit_id: None,
            flags: RevisionFlags::empty(),
        }
    }

    #[test]
    fn minimal_assignment_assembles_matching_spec_scenario_s2() {
        let rev = test_revision();
        let state = compile_to_state("var x = 1\n", &rev).unwrap();
        assert_eq!(state.identifiers, vec!["x".to_string()]);
        assert_eq!(state.constants, vec![Variant::Int(1)]);
        // Var, Identifier, OpAssign, Constant, Newline, Eof.
        assert_eq!(state.tokens.len(), 6);
    }

    #[test]
    fn repeated_identifier_reuses_its_first_reference_index() {
        let rev = test_revision();
        let state = compile_to_state("var x = x\n", &rev).unwrap();
        assert_eq!(state.identifiers, vec!["x".to_string()]);
    }
}
