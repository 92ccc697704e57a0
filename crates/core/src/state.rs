//! The in-memory product of decoding a buffer, and the input to
//! reconstruction (spec section 3, "ScriptState").

use std::collections::BTreeMap;

use crate::token::EncodedToken;
use crate::variant::Variant;

/// Everything the Buffer Codec extracts from one tokenized buffer.
///
/// `lines`/`end_lines`/`columns` are keyed by token index rather than
/// stored as a parallel `Vec` the length of `tokens`, because the wire
/// format itself is sparse (only some token indices have an entry) - a
/// `BTreeMap` keeps iteration in index order, which the Round-Trip
/// Comparator depends on for its "first divergence index" report.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub bytecode_format_version: u32,
    pub identifiers: Vec<String>,
    pub constants: Vec<Variant>,
    pub tokens: Vec<EncodedToken>,
    pub lines: BTreeMap<u32, u32>,
    pub end_lines: BTreeMap<u32, u32>,
    pub columns: BTreeMap<u32, u32>,
}

impl ScriptState {
    pub fn new(bytecode_format_version: u32) -> Self {
        ScriptState {
            bytecode_format_version,
            ..Default::default()
        }
    }

    /// `true` when every table is empty - the "empty script" policy (spec
    /// section 4.5) applies to a `ScriptState` in this shape.
    pub fn is_empty_script(&self) -> bool {
        self.identifiers.is_empty() && self.constants.is_empty() && self.tokens.is_empty()
    }

    /// `true` for the v2 dialect, which is the only one that populates
    /// `columns`/`end_lines` (spec section 3 invariants).
    pub fn is_v2(&self) -> bool {
        self.bytecode_format_version >= crate::sentinels::GDSCRIPT_2_0_VERSION
    }
}
