//! gdsc-core: the shared data model for the gdsc decompiler/compiler.
//!
//! This crate owns the pieces every other `gdsc-*` crate needs a copy of:
//! the closed [`token::GlobalToken`] enumeration, the [`token::EncodedToken`]
//! wire word, the [`revision`] descriptor and its per-revision behavior
//! flags, the [`registry`] that catalogs known revisions, the [`variant`]
//! value type and codec interface, and the single [`error::GdscError`]
//! taxonomy every operation in the workspace returns.
//!
//! Nothing in this crate does I/O or touches a byte buffer directly -
//! that is `gdsc-codec`'s job.

pub mod error;
pub mod registry;
pub mod revision;
pub mod sentinels;
pub mod state;
pub mod token;
pub mod variant;
pub mod version;

pub use error::{GdscError, GdscResult};
pub use registry::{DynamicRegistration, RevisionRegistry, registry};
pub use revision::{RevisionDescriptor, RevisionFlags};
pub use state::ScriptState;
pub use token::{EncodedToken, GlobalToken};
pub use variant::{Variant, VariantCodec};
