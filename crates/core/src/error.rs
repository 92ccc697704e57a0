//! The error taxonomy shared by every `gdsc-*` crate (spec section 7).
//!
//! One flat enum, not one type per layer - the spec's propagation policy is
//! "surfaced from the deepest layer to the public operation boundary as
//! return sentinels", which reads as "don't wrap the same error again at
//! every crate boundary". Shaped after
//! `crates/compiler/src/codegen/error.rs`'s `CodeGenError` in the teacher
//! workspace: a plain enum, hand-written `Display`, no `thiserror`.

use std::fmt;

#[derive(Debug, Clone)]
pub enum GdscError {
    /// Bad magic, truncated buffer, residual bytes, an out-of-range table
    /// index, or any other structurally malformed buffer.
    InvalidBuffer(String),
    /// `bytecode_format_version` is greater than `LATEST_GDSCRIPT_VERSION`.
    UnsupportedFormat(String),
    /// The Variant Codec Adapter failed to decode a constant.
    VariantDecodeError(String),
    /// The Variant Codec Adapter failed to encode a constant.
    VariantEncodeError(String),
    /// zstd (de)compression failed, or the decompressed length did not
    /// match the header's declared length.
    CompressionError(String),
    /// A `ScriptState` references a missing identifier, constant, or
    /// function, or otherwise cannot be reconstructed.
    InvalidScriptState(String),
    /// A dynamic revision registration was rejected.
    BadRegistration(String),
    /// The Revision Resolver could not match a commit id, version string,
    /// or buffer to any registered revision.
    UnknownRevision(String),
}

impl fmt::Display for GdscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GdscError::InvalidBuffer(msg) => write!(f, "invalid buffer: {msg}"),
            GdscError::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            GdscError::VariantDecodeError(msg) => write!(f, "variant decode error: {msg}"),
            GdscError::VariantEncodeError(msg) => write!(f, "variant encode error: {msg}"),
            GdscError::CompressionError(msg) => write!(f, "compression error: {msg}"),
            GdscError::InvalidScriptState(msg) => write!(f, "invalid script state: {msg}"),
            GdscError::BadRegistration(msg) => write!(f, "bad registration: {msg}"),
            GdscError::UnknownRevision(msg) => write!(f, "unknown revision: {msg}"),
        }
    }
}

impl std::error::Error for GdscError {}

pub type GdscResult<T> = Result<T, GdscError>;
