//! The Revision Registry (spec section 4.1): catalogs every supported
//! revision and accepts user-supplied ones at runtime.
//!
//! Static entries are compiled in (see [`revisions::static_revisions`]);
//! dynamic ones are validated and appended to a process-wide, reader-writer
//! locked list (spec section 5: "the implementation must guard the registry
//! with a reader-writer lock, preferring readers"). The registry is
//! append-only - spec section 4.1 explicitly states removal is not
//! supported.

mod revisions;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::{GdscError, GdscResult};
use crate::revision::RevisionDescriptor;
use crate::token::GlobalToken;
use crate::version::EngineVersion;

/// The keyed-map shape a caller hands `register_dynamic` (spec section 6.3).
///
/// Mirrors `crates/compiler/src/config.rs`'s builder style for
/// extensibility structs: plain fields, a `new`/`with_*` constructor rather
/// than a derive-heavy builder crate, since the workspace has no other need
/// for one.
#[derive(Debug, Clone, Default)]
pub struct DynamicRegistration {
    pub bytecode_version: Option<u32>,
    pub bytecode_rev: Option<u32>,
    pub engine_ver_major: Option<u32>,
    pub variant_ver_major: Option<u32>,
    pub engine_version: Option<String>,
    pub max_engine_version: Option<String>,
    pub date: Option<String>,
    pub parent: Option<u32>,
    pub tk_names: Vec<String>,
    pub func_names: Vec<String>,
}

impl DynamicRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytecode_version(mut self, v: u32) -> Self {
        self.bytecode_version = Some(v);
        self
    }

    pub fn with_bytecode_rev(mut self, v: u32) -> Self {
        self.bytecode_rev = Some(v);
        self
    }

    pub fn with_engine_ver_major(mut self, v: u32) -> Self {
        self.engine_ver_major = Some(v);
        self
    }

    pub fn with_variant_ver_major(mut self, v: u32) -> Self {
        self.variant_ver_major = Some(v);
        self
    }

    pub fn with_engine_version(mut self, v: impl Into<String>) -> Self {
        self.engine_version = Some(v.into());
        self
    }

    pub fn with_max_engine_version(mut self, v: impl Into<String>) -> Self {
        self.max_engine_version = Some(v.into());
        self
    }

    pub fn with_parent(mut self, v: u32) -> Self {
        self.parent = Some(v);
        self
    }

    pub fn with_tk_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tk_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_func_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.func_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validates required fields (spec section 6.3: "Missing any required
    /// field -> `BadRegistration`") and builds the descriptor. Flags are
    /// derived the same way as the static ladder, keyed on the same two
    /// axes (format version, engine version).
    fn into_descriptor(self, existing_commits: &[u32]) -> GdscResult<RevisionDescriptor> {
        let bytecode_format_version = self
            .bytecode_version
            .filter(|v| *v != 0)
            .ok_or_else(|| GdscError::BadRegistration("bytecode_version is required and must be non-zero".into()))?;
        let commit_id = self
            .bytecode_rev
            .filter(|v| *v != 0)
            .ok_or_else(|| GdscError::BadRegistration("bytecode_rev is required and must be non-zero".into()))?;
        self.engine_ver_major
            .filter(|v| *v != 0)
            .ok_or_else(|| GdscError::BadRegistration("engine_ver_major is required and must be non-zero".into()))?;
        let variant_format_major = self
            .variant_ver_major
            .filter(|v| *v != 0)
            .ok_or_else(|| GdscError::BadRegistration("variant_ver_major is required and must be non-zero".into()))?;
        let engine_version_min = self
            .engine_version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GdscError::BadRegistration("engine_version is required and must be non-empty".into()))?;
        if self.tk_names.is_empty() {
            return Err(GdscError::BadRegistration(
                "tk_names is required and must be non-empty".into(),
            ));
        }
        if existing_commits.contains(&commit_id) {
            return Err(GdscError::BadRegistration(format!(
                "commit id {commit_id:#x} is already registered"
            )));
        }

        let mut token_table = Vec::with_capacity(self.tk_names.len());
        for name in &self.tk_names {
            let tok = GlobalToken::from_name(name).ok_or_else(|| {
                GdscError::BadRegistration(format!("tk_names has unknown token name {name:?}"))
            })?;
            token_table.push(tok);
        }

        let flags = revisions::compute_flags(bytecode_format_version, &engine_version_min);

        let descriptor = RevisionDescriptor {
            commit_id,
            engine_version_min,
            engine_version_max: self.max_engine_version,
            bytecode_format_version,
            variant_format_major,
            token_table,
            function_table: self.func_names,
            function_arity_overrides: HashMap::new(),
            parent_commit_id: self.parent,
            flags,
        };
        descriptor
            .validate_invariants()
            .map_err(GdscError::BadRegistration)?;
        Ok(descriptor)
    }
}

/// The process-wide catalog of known revisions (spec section 4.1).
pub struct RevisionRegistry {
    static_entries: Vec<Arc<RevisionDescriptor>>,
    dynamic: RwLock<Vec<Arc<RevisionDescriptor>>>,
}

impl RevisionRegistry {
    fn new() -> Self {
        RevisionRegistry {
            static_entries: revisions::static_revisions()
                .into_iter()
                .map(Arc::new)
                .collect(),
            dynamic: RwLock::new(Vec::new()),
        }
    }

    /// Enumerate every registered revision, static entries first in ladder
    /// order, then dynamic ones in registration order (spec section 4.1).
    pub fn list_all(&self) -> Vec<Arc<RevisionDescriptor>> {
        let mut out = self.static_entries.clone();
        out.extend(self.dynamic.read().expect("registry lock poisoned").iter().cloned());
        out
    }

    pub fn find_by_commit(&self, commit_id: u32) -> Option<Arc<RevisionDescriptor>> {
        self.list_all().into_iter().find(|r| r.commit_id == commit_id)
    }

    /// Exact-match lookup by engine version string: a revision whose
    /// `engine_version_min` or `engine_version_max` equals `version_string`
    /// verbatim. `allow_prerelease_match` additionally permits matching a
    /// bare `MAJOR.MINOR.PATCH` candidate against a revision whose min/max
    /// carries a pre-release tag for the same core version (so `"3.2.0"`
    /// can resolve to the `3.2.0-dev1` entry when no stable entry exists).
    pub fn find_by_engine_version(
        &self,
        version_string: &str,
        allow_prerelease_match: bool,
    ) -> Option<Arc<RevisionDescriptor>> {
        let revs = self.list_all();
        if let Some(exact) = revs.iter().find(|r| {
            r.engine_version_min == version_string
                || r.engine_version_max.as_deref() == Some(version_string)
        }) {
            return Some(exact.clone());
        }
        if !allow_prerelease_match {
            return None;
        }
        let candidate = EngineVersion::parse(version_string)?;
        revs.into_iter()
            .filter(|r| {
                EngineVersion::parse(&r.engine_version_min)
                    .map(|v| (v.major, v.minor, v.patch) == (candidate.major, candidate.minor, candidate.patch))
                    .unwrap_or(false)
            })
            .max_by_key(|r| r.commit_id)
    }

    /// Validate and insert a dynamically-registered revision (spec section
    /// 4.1, 6.3). Returns the new commit id on success.
    pub fn register_dynamic(&self, fields: DynamicRegistration) -> GdscResult<u32> {
        let existing: Vec<u32> = self.list_all().iter().map(|r| r.commit_id).collect();
        let descriptor = fields.into_descriptor(&existing)?;
        let commit_id = descriptor.commit_id;
        self.dynamic
            .write()
            .expect("registry lock poisoned")
            .push(Arc::new(descriptor));
        Ok(commit_id)
    }
}

static REGISTRY: OnceLock<RevisionRegistry> = OnceLock::new();

/// The process-wide registry singleton, built on first use (spec section
/// 5: "initialized once ... and read-only thereafter").
pub fn registry() -> &'static RevisionRegistry {
    REGISTRY.get_or_init(RevisionRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_all_includes_every_static_entry() {
        let reg = RevisionRegistry::new();
        assert_eq!(reg.list_all().len(), revisions::static_revisions().len());
    }

    #[test]
    fn find_by_commit_finds_a_known_revision() {
        let reg = RevisionRegistry::new();
        let rev = reg.find_by_commit(0x0004_0000).expect("4.0 should be registered");
        assert_eq!(rev.bytecode_format_version, 100);
    }

    #[test]
    fn register_dynamic_rejects_missing_fields() {
        let reg = RevisionRegistry::new();
        let err = reg
            .register_dynamic(DynamicRegistration::new().with_bytecode_version(42))
            .unwrap_err();
        assert!(matches!(err, GdscError::BadRegistration(_)));
    }

    #[test]
    fn register_dynamic_accepts_a_well_formed_entry() {
        let reg = RevisionRegistry::new();
        let commit = reg
            .register_dynamic(
                DynamicRegistration::new()
                    .with_bytecode_version(5)
                    .with_bytecode_rev(0xDEAD_BEEF)
                    .with_engine_ver_major(1)
                    .with_variant_ver_major(1)
                    .with_engine_version("1.5.0")
                    .with_tk_names(["Identifier", "Constant", "Newline", "Eof"]),
            )
            .expect("well-formed registration should succeed");
        assert_eq!(commit, 0xDEAD_BEEF);
        assert!(reg.find_by_commit(0xDEAD_BEEF).is_some());
    }

    #[test]
    fn register_dynamic_rejects_duplicate_commit_id() {
        let reg = RevisionRegistry::new();
        let base = || {
            DynamicRegistration::new()
                .with_bytecode_version(5)
                .with_bytecode_rev(0x1234)
                .with_engine_ver_major(1)
                .with_variant_ver_major(1)
                .with_engine_version("1.5.0")
                .with_tk_names(["Identifier", "Constant", "Newline", "Eof"])
        };
        reg.register_dynamic(base()).unwrap();
        let err = reg.register_dynamic(base()).unwrap_err();
        assert!(matches!(err, GdscError::BadRegistration(_)));
    }
}
