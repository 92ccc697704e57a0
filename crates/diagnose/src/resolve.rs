//! The Revision Resolver (spec section 4.7): turns a commit id or version
//! string into a [`RevisionDescriptor`], or ranks candidates for a buffer
//! of unknown origin by delegating to the Validation Engine.

use std::sync::Arc;

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::registry::{registry, RevisionRegistry};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::variant::VariantCodec;
use gdsc_core::version::EngineVersion;

use crate::validate::{validate, Verdict};

/// One entry in an [`identify`] ranking (spec section 4.6's "Using the
/// Validation Engine to identify revisions").
#[derive(Debug, Clone)]
pub struct RevisionRanking {
    pub revision: Arc<RevisionDescriptor>,
    pub verdict: Verdict,
}

pub fn resolve_by_commit(commit: u32) -> Option<Arc<RevisionDescriptor>> {
    registry().find_by_commit(commit)
}

/// The earliest revision stable enough for mixed use with newer 4.x
/// content, per spec section 4.7's `force_latest_major` fallback.
const FORCE_LATEST_MAJOR_FALLBACK_VERSION: &str = "4.3.0-stable";

/// Resolves an engine version string to a revision (spec section 4.7).
///
/// Exact matches (including pre-release tags) are tried first; failing
/// that, the static+dynamic catalog is searched for the range
/// `[engine_version_min, engine_version_max]` that covers `version_string`,
/// preferring a revision whose major series matches the input's. When
/// `force_latest_major` is set and no covering range is found for a 4.x
/// input earlier than 4.3.0-final, the 4.3.0 descriptor is returned instead
/// of `None`.
pub fn resolve_by_version(version_string: &str, force_latest_major: bool) -> Option<Arc<RevisionDescriptor>> {
    let reg = registry();
    if let Some(exact) = reg.find_by_engine_version(version_string, true) {
        return Some(exact);
    }

    let candidate = EngineVersion::parse(version_string)?;
    let covering: Vec<Arc<RevisionDescriptor>> = reg
        .list_all()
        .into_iter()
        .filter(|r| gdsc_core::version::in_range(&candidate, &r.engine_version_min, r.engine_version_max.as_deref()))
        .collect();

    let same_major = covering
        .iter()
        .filter(|r| {
            EngineVersion::parse(&r.engine_version_min)
                .map(|v| v.major == candidate.major)
                .unwrap_or(false)
        })
        .max_by(|a, b| {
            EngineVersion::parse(&a.engine_version_min)
                .cmp(&EngineVersion::parse(&b.engine_version_min))
        })
        .cloned();

    if let Some(found) = same_major.or_else(|| covering.into_iter().next()) {
        return Some(found);
    }

    if force_latest_major && candidate.major == 4 {
        let fallback_threshold = EngineVersion::parse(FORCE_LATEST_MAJOR_FALLBACK_VERSION).expect("valid constant");
        if candidate < fallback_threshold {
            return reg.find_by_engine_version(FORCE_LATEST_MAJOR_FALLBACK_VERSION, true);
        }
    }

    None
}

/// Ranks every registered revision sharing `bytes`'s declared format
/// version by Validation Engine outcome (spec section 4.6/4.7).
///
/// The unique `Pass` wins; multiple passes tie-break by the highest
/// `engine_version_min` (most recent), per spec section 4.7's explicit
/// tie-break rule. With no passes, every `Fail`/`Corrupt` verdict is still
/// returned so the caller can read the most specific reason.
pub fn identify(bytes: &[u8], variant_codec: &dyn VariantCodec) -> Vec<RevisionRanking> {
    if bytes.len() < 8 {
        return Vec::new();
    }
    let declared_format_version = u32::from_le_bytes(bytes[4..8].try_into().expect("checked length above"));

    let reg: &RevisionRegistry = registry();
    let mut rankings: Vec<RevisionRanking> = reg
        .list_all()
        .into_iter()
        .filter(|r| r.bytecode_format_version == declared_format_version)
        .map(|revision| {
            let verdict = validate(bytes, &revision, variant_codec, true);
            RevisionRanking { revision, verdict }
        })
        .collect();

    rankings.sort_by(|a, b| {
        let a_rank = EngineVersion::parse(&a.revision.engine_version_min);
        let b_rank = EngineVersion::parse(&b.revision.engine_version_min);
        b_rank.cmp(&a_rank)
    });
    rankings
}

/// Picks the single best revision for a buffer of unknown origin, by
/// delegating to [`identify`] and taking its top-ranked `Pass` (spec
/// section 4.6: "the unique PASS result wins; multiple PASSes tie-break by
/// registry order [here: recency]").
pub fn identify_best(bytes: &[u8], variant_codec: &dyn VariantCodec) -> GdscResult<Arc<RevisionDescriptor>> {
    let rankings = identify(bytes, variant_codec);
    rankings
        .into_iter()
        .find(|r| r.verdict.is_pass())
        .map(|r| r.revision)
        .ok_or_else(|| {
            GdscError::UnknownRevision(
                "no registered revision's format version both matches the buffer and passes validation".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_by_commit_finds_a_static_entry() {
        let rev = resolve_by_commit(0x0004_0000).expect("4.0 should be registered");
        assert_eq!(rev.bytecode_format_version, 100);
    }

    #[test]
    fn resolve_by_commit_returns_none_for_unknown_commit() {
        assert!(resolve_by_commit(0xFFFF_FFFF).is_none());
    }

    #[test]
    fn resolve_by_version_finds_a_covering_range() {
        let rev = resolve_by_version("4.1.5", false).expect("should resolve within the 4.x ladder");
        assert_eq!(rev.bytecode_format_version, 100);
    }

    #[test]
    fn resolve_by_version_unresolvable_without_force_latest_major() {
        assert!(resolve_by_version("9.9.9", false).is_none());
    }
}
