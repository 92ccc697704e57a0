//! The statically-registered revision ladder (spec section 4.1
//! implementation notes).
//!
//! This is not the full ~40-entry historical catalog the original tool
//! ships - that catalog is data, not algorithm, and is exactly what
//! `register_dynamic` exists to extend (see DESIGN.md, Open Questions). It
//! is a representative ladder spanning every behavior-flag boundary spec.md
//! names: the legacy/v2 format split, the 2.0 `&&`/`||` split, 3.0's
//! underscore separators, 3.2's binary literals and mixed-indent error, and
//! 4.3's content-header growth.

use std::collections::HashMap;

use crate::revision::{RevisionDescriptor, RevisionFlags};
use crate::token::GlobalToken;
use crate::version::EngineVersion;

/// Behavior flags are derived once from the two axes spec.md actually keys
/// them on: the bytecode format version (legacy vs. v2) and the engine
/// version (everything else). See spec section 9's "Cross-version dispatch"
/// design note.
pub(crate) fn compute_flags(bytecode_format_version: u32, engine_version_min: &str) -> RevisionFlags {
    let is_v2 = bytecode_format_version >= crate::sentinels::GDSCRIPT_2_0_VERSION;
    let v = EngineVersion::parse(engine_version_min);
    let at_least = |min: &str| match (&v, EngineVersion::parse(min)) {
        (Some(v), Some(min)) => *v >= min,
        _ => false,
    };

    let mut flags = RevisionFlags::empty();
    if is_v2 {
        flags |= RevisionFlags::IS_V2_DIALECT;
        // The AND/OR vs &&/|| split and the single-vs-double PERIOD split
        // both ride on the format-version threshold, not a separate engine
        // version check - see spec section 4.4's lexical rules.
        flags |= RevisionFlags::HAS_AMP_AMP_TOKENS;
        flags |= RevisionFlags::HAS_PERIOD_PERIOD;
    }
    if at_least("3.0.0-dev5") {
        flags |= RevisionFlags::HAS_DOLLAR_SIGIL;
    }
    if at_least("3.0.0-stable") {
        flags |= RevisionFlags::ACCEPTS_UNDERSCORE_SEP;
    }
    if at_least("3.2.0-dev1") {
        flags |= RevisionFlags::ACCEPTS_BINARY_LITERALS;
    }
    if at_least("3.2.0-stable") {
        flags |= RevisionFlags::MIXED_TAB_SPACE_IS_ERROR;
    }
    if !at_least("3.2.0-dev1") {
        flags |= RevisionFlags::ENCODE_FULL_OBJECTS;
    }
    flags
}

/// Tokens present in every revision this ladder registers, regardless of
/// era. Ordering here becomes each revision's local-id assignment order
/// unless overridden - harmless, since local ids are per-revision and never
/// compared across revisions.
fn core_tokens() -> Vec<GlobalToken> {
    use GlobalToken::*;
    vec![
        Empty, Identifier, Constant, SelfKw, BuiltInType, BuiltInFunc, ConstPi, ConstInf, ConstNan,
        OpAdd, OpSub, OpMul, OpDiv, OpMod, OpShiftLeft, OpShiftRight, OpBitAnd, OpBitOr, OpBitXor,
        OpBitInvert, OpNot, OpAnd, OpOr, OpEqual, OpNotEqual, OpLess, OpLessEqual, OpGreater,
        OpGreaterEqual, OpAssign, OpAssignAdd, OpAssignSub, OpAssignMul, OpAssignDiv, OpAssignMod,
        If, Elif, Else, For, While, Break, Continue, Pass, Return, Function, Class, Extends,
        Export, Setget, Const, Var, Preload, Assert, Signal, Tool, BracketOpen, BracketClose,
        CurlyBracketOpen, CurlyBracketClose, ParenthesisOpen, ParenthesisClose, Comma, Semicolon,
        Period, Colon, Newline, Indent, Dedent, Eof, Error, Cursor,
    ]
}

/// Extra tokens that accumulate across the legacy 2.x/3.x era, folded onto
/// [`core_tokens`] by each legacy-era builder below.
fn legacy_additions(
    has_static: bool,
    has_onready: bool,
    has_breakpoint: bool,
    has_networking: bool,
    has_match: bool,
    has_class_name_as_arrow: bool,
    has_dollar: bool,
    has_tau: bool,
) -> Vec<GlobalToken> {
    use GlobalToken::*;
    let mut v = vec![];
    if has_static {
        v.push(Static);
    }
    if has_onready {
        v.push(Onready);
    }
    if has_breakpoint {
        v.push(Breakpoint);
    }
    if has_networking {
        v.extend([Remote, Master, Puppet, Remotesync, Mastersync, Puppetsync]);
    }
    if has_match {
        v.extend([Match, Wildcard]);
    }
    if has_class_name_as_arrow {
        v.extend([ClassName, As, ForwardArrow]);
    }
    if has_dollar {
        v.push(Dollar);
    }
    if has_tau {
        v.push(ConstTau);
    }
    v
}

fn v4_tokens() -> Vec<GlobalToken> {
    use GlobalToken::*;
    let mut v = core_tokens();
    // v4.x drops Period-doubled-as-PeriodPeriod and AND/OR-as-&&/|| in
    // favor of their own tokens (flags do the dispatch; the table needs
    // the token present to have a local id at all).
    v.extend([
        AmpersandAmpersand,
        PipePipe,
        PeriodPeriod,
        PeriodPeriodPeriod,
        Static,
        Onready,
        Breakpoint,
        Match,
        Wildcard,
        ClassName,
        As,
        ForwardArrow,
        Dollar,
        ConstTau,
        Enum,
        Yield,
        Await,
        Namespace,
        Super,
        QuestionMark,
        OpAssignShiftLeft,
        OpAssignShiftRight,
        OpAssignBitAnd,
        OpAssignBitOr,
        OpAssignBitXor,
    ]);
    v
}

fn function_table(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn arity(pairs: &[(&str, u32, u32)]) -> HashMap<String, (u32, u32)> {
    pairs
        .iter()
        .map(|(name, lo, hi)| (name.to_string(), (*lo, *hi)))
        .collect()
}

const COMMON_FUNCS: &[&str] = &[
    "sin", "cos", "tan", "sqrt", "abs", "floor", "ceil", "round", "min", "max", "randi", "randf",
    "rand_range", "str", "print", "printerr", "len", "range", "typeof", "load", "instance_from_id",
];

/// Every statically-registered revision, oldest first.
///
/// Order matters for two things the rest of the workspace depends on:
/// [`crate::registry::RevisionRegistry::list_all`] preserves it, and the
/// Resolver's "most recent first" tie-break (spec section 4.6) walks this
/// list in reverse.
pub fn static_revisions() -> Vec<RevisionDescriptor> {
    let mut out = Vec::new();

    // 1.0 - earliest legacy revision this ladder covers. print() takes
    // a single argument plus an optional list of extras in this era; we
    // model it as a wide (0, 8) arity so the S3 "pre-3.1 print has no
    // arity complaint" scenario holds.
    out.push(RevisionDescriptor {
        commit_id: 0x0001_0000,
        engine_version_min: "1.0.0".to_string(),
        engine_version_max: Some("1.1.9".to_string()),
        bytecode_format_version: 1,
        variant_format_major: 1,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                false, false, false, false, false, false, false, false,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: None,
        flags: compute_flags(1, "1.0.0"),
    });

    // 2.0 - introduces `static`, `onready`.
    out.push(RevisionDescriptor {
        commit_id: 0x0002_0000,
        engine_version_min: "2.0.0".to_string(),
        engine_version_max: Some("2.0.4".to_string()),
        bytecode_format_version: 2,
        variant_format_major: 1,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, false, false, false, false, false, false,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0001_0000),
        flags: compute_flags(2, "2.0.0"),
    });

    // 2.1 - networking qualifiers, breakpoint.
    out.push(RevisionDescriptor {
        commit_id: 0x0002_1000,
        engine_version_min: "2.1.0".to_string(),
        engine_version_max: Some("2.1.6".to_string()),
        bytecode_format_version: 3,
        variant_format_major: 1,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, true, true, false, false, false, false,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0002_0000),
        flags: compute_flags(3, "2.1.0"),
    });

    // 3.0 stable - `match`, underscore separators, `$` sigil, `as`/`->`.
    out.push(RevisionDescriptor {
        commit_id: 0x0003_0000,
        engine_version_min: "3.0.0-stable".to_string(),
        engine_version_max: Some("3.0.6".to_string()),
        bytecode_format_version: 13,
        variant_format_major: 2,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, true, true, true, true, true, false,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        // print's arity tightens to a single required argument plus
        // variadic extras starting here - still permissive.
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0002_1000),
        flags: compute_flags(13, "3.0.0-stable"),
    });

    // 3.1 - adds ConstTau.
    out.push(RevisionDescriptor {
        commit_id: 0x0003_1000,
        engine_version_min: "3.1.0".to_string(),
        engine_version_max: Some("3.1.2".to_string()),
        bytecode_format_version: 13,
        variant_format_major: 2,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, true, true, true, true, true, true,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0003_0000),
        flags: compute_flags(13, "3.1.0"),
    });

    // 3.2.0-dev1 - binary literals accepted, print's arity tightens to
    // exactly one required argument (this is the revision S3 names as the
    // post-3.2 revision whose `print` call can FAIL on arity).
    out.push(RevisionDescriptor {
        commit_id: 0x0003_2001,
        engine_version_min: "3.2.0-dev1".to_string(),
        engine_version_max: Some("3.2.0-dev3".to_string()),
        bytecode_format_version: 15,
        variant_format_major: 2,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, true, true, true, true, true, true,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 1, 1)]),
        parent_commit_id: Some(0x0003_1000),
        flags: compute_flags(15, "3.2.0-dev1"),
    });

    // 3.2 stable - mixed tab/space prefixes become an error.
    out.push(RevisionDescriptor {
        commit_id: 0x0003_2000,
        engine_version_min: "3.2.0-stable".to_string(),
        engine_version_max: Some("3.2.3".to_string()),
        bytecode_format_version: 16,
        variant_format_major: 2,
        token_table: {
            let mut t = core_tokens();
            t.extend(legacy_additions(
                true, true, true, true, true, true, true, true,
            ));
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 1, 8)]),
        parent_commit_id: Some(0x0003_2001),
        flags: compute_flags(16, "3.2.0-stable"),
    });

    // 4.0 - the v2 (compressed) dialect begins.
    out.push(RevisionDescriptor {
        commit_id: 0x0004_0000,
        engine_version_min: "4.0.0-stable".to_string(),
        engine_version_max: Some("4.0.3".to_string()),
        bytecode_format_version: 100,
        variant_format_major: 4,
        token_table: v4_tokens(),
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0003_2000),
        flags: compute_flags(100, "4.0.0-stable"),
    });

    // 4.1.
    out.push(RevisionDescriptor {
        commit_id: 0x0004_1000,
        engine_version_min: "4.1.0".to_string(),
        engine_version_max: Some("4.1.4".to_string()),
        bytecode_format_version: 100,
        variant_format_major: 4,
        token_table: {
            let mut t = v4_tokens();
            t.push(GlobalToken::Trait);
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0004_0000),
        flags: compute_flags(100, "4.1.0"),
    });

    // 4.2.
    out.push(RevisionDescriptor {
        commit_id: 0x0004_2000,
        engine_version_min: "4.2.0".to_string(),
        engine_version_max: Some("4.2.2".to_string()),
        bytecode_format_version: 100,
        variant_format_major: 4,
        token_table: {
            let mut t = v4_tokens();
            t.extend([GlobalToken::Trait, GlobalToken::Abstract]);
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0004_1000),
        flags: compute_flags(100, "4.2.0"),
    });

    // 4.3 - the 20-byte v2 content header.
    out.push(RevisionDescriptor {
        commit_id: 0x0004_3000,
        engine_version_min: "4.3.0-stable".to_string(),
        engine_version_max: None,
        bytecode_format_version: crate::sentinels::LATEST_GDSCRIPT_VERSION,
        variant_format_major: 4,
        token_table: {
            let mut t = v4_tokens();
            t.extend([GlobalToken::Trait, GlobalToken::Abstract]);
            t
        },
        function_table: function_table(COMMON_FUNCS),
        function_arity_overrides: arity(&[("print", 0, 8)]),
        parent_commit_id: Some(0x0004_2000),
        flags: compute_flags(
            crate::sentinels::LATEST_GDSCRIPT_VERSION,
            "4.3.0-stable",
        ),
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_static_revision_satisfies_invariants() {
        for rev in static_revisions() {
            rev.validate_invariants()
                .unwrap_or_else(|e| panic!("revision {:#x} invalid: {e}", rev.commit_id));
        }
    }

    #[test]
    fn commit_ids_are_unique() {
        let revs = static_revisions();
        let mut ids: Vec<_> = revs.iter().map(|r| r.commit_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), revs.len());
    }

    #[test]
    fn flags_track_format_and_engine_version() {
        let legacy = compute_flags(1, "1.0.0");
        assert!(!legacy.contains(RevisionFlags::IS_V2_DIALECT));
        assert!(!legacy.contains(RevisionFlags::HAS_AMP_AMP_TOKENS));

        let v2 = compute_flags(100, "4.0.0-stable");
        assert!(v2.contains(RevisionFlags::IS_V2_DIALECT));
        assert!(v2.contains(RevisionFlags::HAS_AMP_AMP_TOKENS));
        assert!(v2.contains(RevisionFlags::HAS_PERIOD_PERIOD));
    }
}
