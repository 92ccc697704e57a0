//! gdsc-variant: the one concrete Variant Codec Adapter this workspace
//! ships, behind the [`gdsc_core::variant::VariantCodec`] trait (spec
//! section 4.2).
//!
//! Spec section 4.2 treats the adapter as an external collaborator - the
//! core, codec, and diagnose crates only ever depend on the trait. This
//! crate exists so the workspace has something to exercise round trips
//! against end to end.

mod codec;
mod tags;

pub use codec::GdscriptVariantCodec;
