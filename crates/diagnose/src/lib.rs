//! gdsc-diagnose: the Validation Engine (spec section 4.6), the Revision
//! Resolver (spec section 4.7), and the Round-Trip Comparator (spec
//! section 4.8) - the diagnostic layer built atop [`gdsc_codec`].

pub mod compare;
pub mod resolve;
pub mod validate;

pub use compare::{compare, Report, TokenDivergence};
pub use resolve::{identify, identify_best, resolve_by_commit, resolve_by_version, RevisionRanking};
pub use validate::{validate, Verdict};
