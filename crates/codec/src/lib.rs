//! gdsc-codec: the Buffer Codec (spec section 4.3) - reads and writes the
//! on-disk tokenized buffer in either of the two historical dialects.
//!
//! `decode`/`encode` are free functions, not methods on a struct, dispatching
//! on `bytecode_format_version` to the [`legacy`] or [`v2`] submodule -
//! mirrors how the teacher workspace's codegen module dispatches to an
//! `inline`/`inline_nanbox` submodule by a mode flag rather than by trait
//! object.

pub mod common;
mod common_checks;
pub mod legacy;
pub mod v2;

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::sentinels::{GDSCRIPT_2_0_VERSION, LATEST_GDSCRIPT_VERSION, MAGIC};
use gdsc_core::state::ScriptState;
use gdsc_core::variant::VariantCodec;

fn read_common_header(bytes: &[u8]) -> GdscResult<u32> {
    if bytes.len() < 8 {
        return Err(GdscError::InvalidBuffer(format!(
            "buffer is {} bytes, need at least 8 for the common header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(GdscError::InvalidBuffer(format!(
            "bad magic {:?}, expected {:?}",
            &bytes[0..4],
            MAGIC
        )));
    }
    let format_version = common::read_u32(bytes, 4)?;
    if format_version > LATEST_GDSCRIPT_VERSION {
        return Err(GdscError::UnsupportedFormat(format!(
            "format version {format_version} is newer than the latest supported ({LATEST_GDSCRIPT_VERSION})"
        )));
    }
    Ok(format_version)
}

/// Decode a raw buffer into a [`ScriptState`] (spec section 4.3).
#[tracing::instrument(skip(bytes, revision, variant_codec), fields(commit_id = revision.commit_id))]
pub fn decode(
    bytes: &[u8],
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<ScriptState> {
    let format_version = read_common_header(bytes)?;
    if format_version >= GDSCRIPT_2_0_VERSION {
        tracing::debug!(format_version, "dispatching to v2 dialect");
        v2::decode(bytes, format_version, revision, variant_codec)
    } else {
        tracing::debug!(format_version, "dispatching to legacy dialect");
        legacy::decode(bytes, format_version, revision, variant_codec)
    }
}

/// Encode a [`ScriptState`] into a raw buffer, in `revision`'s dialect
/// (spec section 4.3).
#[tracing::instrument(skip(state, revision, variant_codec), fields(commit_id = revision.commit_id))]
pub fn encode(
    state: &ScriptState,
    revision: &RevisionDescriptor,
    variant_codec: &dyn VariantCodec,
) -> GdscResult<Vec<u8>> {
    if revision.is_v2() {
        v2::encode(state, revision, variant_codec)
    } else {
        legacy::encode(state, revision, variant_codec)
    }
}
