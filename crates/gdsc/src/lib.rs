//! gdsc: the public facade over the decompiler/compiler (spec section
//! 6.4). Wires the Revision Registry, Buffer Codec, Text
//! Tokenizer/Source Reconstructor, and diagnostic layer behind six free
//! functions.
//!
//! Per spec section 6.4, these operations "do not throw; they return a
//! sentinel and set [a] last-error" - so every one of them returns an
//! `Option`/empty `Vec` on failure rather than `Result`, and stashes the
//! reason in thread-local state retrievable via [`get_last_error`].
//! Grounded on `crates/runtime/src/error.rs`'s thread-local error slot in
//! the teacher workspace, minus the FFI/`CString` half of that file - this
//! facade is plain Rust, not an `extern "C"` boundary.

mod compile;

use std::cell::RefCell;
use std::sync::Arc;

use gdsc_core::registry::registry;
use gdsc_core::revision::RevisionDescriptor;
use gdsc_variant::GdscriptVariantCodec;

pub use gdsc_diagnose::{compare, identify as identify_with_verdicts, resolve_by_commit, resolve_by_version, Report, RevisionRanking, TokenDivergence, Verdict};
pub use gdsc_lang::reconstruct;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_last_error(msg: impl Into<String>) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg.into()));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Retrieves the reason the most recent failed operation on this thread
/// returned its failure sentinel. Empty string if the last operation
/// succeeded or none has run yet (spec section 6.4).
pub fn get_last_error() -> String {
    LAST_ERROR.with(|e| e.borrow().clone()).unwrap_or_default()
}

fn default_codec() -> GdscriptVariantCodec {
    GdscriptVariantCodec
}

/// Decompiles `bytes`, identifying its origin revision first (spec section
/// 6.4: "top-level; identifies revision then reconstructs").
pub fn decompile(bytes: &[u8]) -> Option<String> {
    clear_last_error();
    let codec = default_codec();
    match gdsc_diagnose::identify_best(bytes, &codec) {
        Ok(revision) => decompile_for(bytes, &revision),
        Err(e) => {
            set_last_error(e.to_string());
            None
        }
    }
}

/// Decompiles `bytes` under a caller-chosen `revision`, skipping
/// identification.
pub fn decompile_for(bytes: &[u8], revision: &RevisionDescriptor) -> Option<String> {
    clear_last_error();
    let codec = default_codec();
    let state = match gdsc_codec::decode(bytes, revision, &codec) {
        Ok(s) => s,
        Err(e) => {
            set_last_error(e.to_string());
            return None;
        }
    };
    match gdsc_lang::reconstruct(&state, revision) {
        Ok(text) => Some(text),
        Err(e) => {
            set_last_error(e.to_string());
            None
        }
    }
}

/// Compiles `text` into a revision-specific buffer (spec section 6.4).
pub fn compile(text: &str, revision: &RevisionDescriptor) -> Option<Vec<u8>> {
    clear_last_error();
    let codec = default_codec();
    let state = match compile::compile_to_state(text, revision) {
        Ok(s) => s,
        Err(e) => {
            set_last_error(e.to_string());
            return None;
        }
    };
    match gdsc_codec::encode(&state, revision, &codec) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            set_last_error(e.to_string());
            None
        }
    }
}

/// Ranks every format-compatible registered revision against `bytes` (spec
/// section 6.4/4.6/4.7). Never fails outright - an empty result means no
/// registered revision shares this buffer's declared format version.
pub fn identify(bytes: &[u8]) -> Vec<RevisionRanking> {
    clear_last_error();
    let codec = default_codec();
    let rankings = gdsc_diagnose::identify(bytes, &codec);
    if rankings.is_empty() {
        set_last_error("no registered revision shares this buffer's declared format version".to_string());
    }
    rankings
}

/// Lists every revision known to the process-wide registry (spec section
/// 6.4), static entries first in ladder order then dynamic ones in
/// registration order.
pub fn list_revisions() -> Vec<Arc<RevisionDescriptor>> {
    registry().list_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_revision() -> Arc<RevisionDescriptor> {
        list_revisions()
            .into_iter()
            .find(|r| r.commit_id == 0x0001_0000)
            .expect("1.0 should be a static registry entry")
    }

    #[test]
    fn compile_then_decompile_round_trips_spec_scenario_s2() {
        let rev = v1_revision();
        let source = "var x = 1\n";
        let bytes = compile(source, &rev).expect("compile should succeed");
        let text = decompile_for(&bytes, &rev).expect("decompile_for should succeed");
        assert_eq!(text, source);
    }

    #[test]
    fn decompile_for_surfaces_decode_error_via_get_last_error() {
        let rev = v1_revision();
        let err = decompile_for(b"not a buffer", &rev);
        assert!(err.is_none());
        assert!(!get_last_error().is_empty());
    }

    #[test]
    fn list_revisions_includes_the_static_ladder() {
        assert!(!list_revisions().is_empty());
    }

    #[test]
    fn identify_empty_script_under_every_matching_revision() {
        let rev = v1_revision();
        let bytes = compile("", &rev).unwrap();
        let rankings = identify(&bytes);
        assert!(rankings.iter().any(|r| r.revision.commit_id == rev.commit_id));
    }
}
