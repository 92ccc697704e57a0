//! Post-decode structural checks shared by both dialects (spec section
//! 4.3's failure policy and section 8's table-reference invariant).
//!
//! Out-of-range *local token ids* are deliberately NOT checked here - an
//! unrecognized local id is spec section 4.6 rule 2's job (a validation
//! `FAIL`, not a decode-time `CORRUPT`). What decode can and must catch is
//! narrower: when a token's local id *does* map to `Identifier` or
//! `Constant` for this revision, its payload must be a real index into the
//! corresponding table.

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::GlobalToken;

pub fn check_table_references(state: &ScriptState, revision: &RevisionDescriptor) -> GdscResult<()> {
    for (i, tok) in state.tokens.iter().enumerate() {
        let Some(global) = revision.global_of(tok.local_id()) else {
            continue;
        };
        let payload = tok.payload() as usize;
        match global {
            GlobalToken::Identifier if payload >= state.identifiers.len() => {
                return Err(GdscError::InvalidBuffer(format!(
                    "token {i} references identifier {payload}, table has {}",
                    state.identifiers.len()
                )));
            }
            GlobalToken::Constant if payload >= state.constants.len() => {
                return Err(GdscError::InvalidBuffer(format!(
                    "token {i} references constant {payload}, table has {}",
                    state.constants.len()
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
