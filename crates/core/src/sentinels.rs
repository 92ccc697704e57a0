//! Named constants from spec section 6.5.
//!
//! These are the handful of magic numbers the buffer format and the token
//! wire encoding are defined in terms of. Keeping them named (rather than
//! inlined at each use site) is what lets the codec and the tokenizer agree
//! on a single definition of "where legacy ends and v2 begins".

/// Bytecode format version at/above which the v2 (compressed) dialect
/// applies. Below this, the legacy dialect applies.
pub const GDSCRIPT_2_0_VERSION: u32 = 100;

/// Highest bytecode format version this workspace knows how to decode.
pub const LATEST_GDSCRIPT_VERSION: u32 = 101;

/// Format version at/above which the v2 content header grows from 16 to
/// 20 bytes (an extra 4 bytes of padding ahead of the token count).
pub const CONTENT_HEADER_SIZE_CHANGED: u32 = 101;

/// Continuation-flag bit on the first byte of a multi-byte encoded token.
pub const TOKEN_BYTE_MASK: u8 = 0x80;

/// Width, in bits, of the local token id field within an encoded token word.
pub const TOKEN_BITS: u32 = 8;

/// Mask isolating the local token id field within an encoded token word.
pub const TOKEN_MASK: u32 = 0xFF;

/// Per-byte XOR mask applied to identifier payload bytes on disk.
pub const IDENTIFIER_XOR: u8 = 0xB6;

/// The 4-byte magic every buffer, legacy or v2, begins with.
pub const MAGIC: &[u8; 4] = b"GDSC";
