//! Revision Descriptor and the small set of per-revision behavior flags
//! (spec section 3, "Revision Descriptor"; section 9, "Cross-version
//! dispatch").

use std::collections::HashMap;

use crate::sentinels::GDSCRIPT_2_0_VERSION;
use crate::token::GlobalToken;

bitflags::bitflags! {
    /// Behavior toggles computed once when a revision is registered,
    /// rather than re-derived from ad hoc version comparisons scattered
    /// through the tokenizer and reconstructor (spec section 9, Design
    /// Notes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RevisionFlags: u16 {
        /// `$` is a distinct token, and `@"…"`/`@'…'` node-path literals are
        /// recognized. Spec's open question resolves these two as the same
        /// flag: both are inferred from whether the revision's token table
        /// contains `Dollar` (see DESIGN.md).
        const HAS_DOLLAR_SIGIL         = 1 << 0;
        /// `&&`/`||` lex to distinct tokens instead of `AND`/`OR`.
        const HAS_AMP_AMP_TOKENS       = 1 << 1;
        /// `..` lexes as one `PeriodPeriod` token instead of two `Period`s.
        const HAS_PERIOD_PERIOD        = 1 << 2;
        /// `0b…` binary integer literals are accepted.
        const ACCEPTS_BINARY_LITERALS  = 1 << 3;
        /// `_` digit separators are accepted in numeric literals.
        const ACCEPTS_UNDERSCORE_SEP   = 1 << 4;
        /// Mixing spaces before tabs in one indentation prefix is an error
        /// rather than silently accepted.
        const MIXED_TAB_SPACE_IS_ERROR = 1 << 5;
        /// This revision's buffer format is the v2 (compressed) dialect.
        const IS_V2_DIALECT            = 1 << 6;
        /// The Variant Codec Adapter must be asked to encode full objects
        /// (pre-3.2.0-dev1 compiler behavior) when writing constants.
        const ENCODE_FULL_OBJECTS      = 1 << 7;
    }
}

/// One supported engine revision (spec section 3).
///
/// Constructed at program start for statically-registered revisions, or
/// via [`crate::registry::RevisionRegistry::register_dynamic`] for
/// user-supplied ones. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct RevisionDescriptor {
    pub commit_id: u32,
    pub engine_version_min: String,
    /// `None` means "open-ended" (spec: "`max` may be empty").
    pub engine_version_max: Option<String>,
    pub bytecode_format_version: u32,
    pub variant_format_major: u32,
    /// Index is the revision-local token id; value is the global token it
    /// maps to.
    pub token_table: Vec<GlobalToken>,
    /// Index is the revision-local built-in function id.
    pub function_table: Vec<String>,
    /// Arity override `(min_args, max_args)` for the subset of functions
    /// whose signature changed between revisions.
    pub function_arity_overrides: HashMap<String, (u32, u32)>,
    pub parent_commit_id: Option<u32>,
    pub flags: RevisionFlags,
}

impl RevisionDescriptor {
    pub fn is_v2(&self) -> bool {
        self.bytecode_format_version >= GDSCRIPT_2_0_VERSION
    }

    /// Revision-local id for a global token, if this revision's table
    /// includes it.
    pub fn local_id_of(&self, token: GlobalToken) -> Option<u8> {
        self.token_table
            .iter()
            .position(|t| *t == token)
            .map(|i| i as u8)
    }

    /// Global token for a revision-local id, if in range.
    pub fn global_of(&self, local_id: u8) -> Option<GlobalToken> {
        self.token_table.get(local_id as usize).copied()
    }

    /// Revision-local id for a built-in function name, if known.
    pub fn function_id_of(&self, name: &str) -> Option<u32> {
        self.function_table
            .iter()
            .position(|f| f == name)
            .map(|i| i as u32)
    }

    /// Arity range for a built-in function: the override if one is
    /// registered, else a maximally permissive `(0, u32::MAX)`.
    pub fn arity_of(&self, name: &str) -> (u32, u32) {
        self.function_arity_overrides
            .get(name)
            .copied()
            .unwrap_or((0, u32::MAX))
    }

    /// Validates the invariants spec section 3 lists for a Revision
    /// Descriptor. Used by [`crate::registry::RevisionRegistry::register_dynamic`]
    /// before a dynamic entry is accepted.
    pub fn validate_invariants(&self) -> Result<(), String> {
        if self.token_table.is_empty() {
            return Err("token_table must not be empty".to_string());
        }
        for required in [
            GlobalToken::Identifier,
            GlobalToken::Constant,
            GlobalToken::Newline,
            GlobalToken::Eof,
        ] {
            if !self.token_table.contains(&required) {
                return Err(format!("token_table is missing required token {required:?}"));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for name in &self.function_table {
            if !seen.insert(name) {
                return Err(format!("function_table has duplicate entry {name:?}"));
            }
        }
        Ok(())
    }
}
