//! The scripting language's dynamic value type, and the interface the core
//! depends on to (de)serialize it (spec section 4.2, "Variant Codec
//! Adapter").
//!
//! Per spec, the adapter's implementation is an external collaborator - the
//! core only depends on the [`VariantCodec`] trait, never on a concrete
//! encoding. `gdsc-variant` provides the one concrete implementation this
//! workspace ships, kept in a separate crate so `gdsc-core` itself stays
//! free of any particular wire-format opinion.

use crate::error::GdscError;

/// A decoded constant-table value.
///
/// This is deliberately not a 1:1 mirror of every historical Variant type -
/// it is the subset the buffer codec, the validator, and the reconstructor
/// actually need to move through the pipeline. Object/Resource-shaped
/// values the adapter does not understand are carried as [`Variant::Raw`]
/// so a round trip still preserves their bytes even when their semantics
/// are opaque to this workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector2(f32, f32),
    Vector3(f32, f32, f32),
    NodePath(String),
    Array(Vec<Variant>),
    Dictionary(Vec<(Variant, Variant)>),
    /// A type this adapter does not decode structurally; its type tag and
    /// raw payload bytes are kept so the byte-for-byte round trip the
    /// buffer codec needs can still succeed.
    Raw { type_tag: i32, bytes: Vec<u8> },
}

/// The contract an external Variant implementation must satisfy (spec
/// section 6.2).
///
/// `format_major` selects which historical Variant wire dialect to use -
/// it is `RevisionDescriptor::variant_format_major`, not the bytecode
/// format version.
pub trait VariantCodec {
    /// Decode one Variant from the front of `bytes`. Returns the value and
    /// how many bytes it consumed. `max_len` bounds how far the adapter may
    /// read, even if a length prefix inside `bytes` claims more.
    fn decode(
        &self,
        format_major: u32,
        bytes: &[u8],
        max_len: usize,
    ) -> Result<(Variant, usize), GdscError>;

    /// Encode a Variant. `encode_full_objects` mirrors the contemporaneous
    /// compiler's behavior for revisions before the 3.2.0-dev1 cutoff (spec
    /// section 4.3, "Encoding invariants").
    fn encode(
        &self,
        format_major: u32,
        value: &Variant,
        encode_full_objects: bool,
    ) -> Result<Vec<u8>, GdscError>;

    /// Human-readable name for a type tag, if this adapter recognizes it.
    fn type_name(&self, format_major: u32, type_tag: i32) -> Option<String>;

    /// Reverse of [`VariantCodec::type_name`].
    fn type_tag(&self, format_major: u32, name: &str) -> Option<i32>;

    /// Map a historical type tag onto the tag the current Variant major
    /// version would use for the same logical type.
    fn convert_type_tag_to_current(&self, format_major: u32, type_tag: i32) -> i32;
}
