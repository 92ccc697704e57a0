//! The one concrete [`VariantCodec`] implementation this workspace ships
//! (spec section 4.2 implementation notes).
//!
//! Wire shapes follow the pattern spec section 4.3 already uses for
//! identifiers: a length prefix, payload bytes, and 4-byte-boundary
//! padding. Numbers split int32/int64 on a one-byte width flag so small
//! integers (the overwhelming majority of constants in real scripts) don't
//! pay for 8 bytes they don't need.

use gdsc_core::error::GdscError;
use gdsc_core::variant::{Variant, VariantCodec};

use crate::tags;

/// Reference Variant Codec Adapter. Holds no state - every call is pure
/// with respect to its arguments, matching spec section 4.2's "the core
/// assumes no shared state across calls".
#[derive(Debug, Default, Clone, Copy)]
pub struct GdscriptVariantCodec;

fn need(bytes: &[u8], max_len: usize, n: usize) -> Result<(), GdscError> {
    if n > max_len || n > bytes.len() {
        return Err(GdscError::VariantDecodeError(format!(
            "need {n} bytes, only {} available",
            bytes.len().min(max_len)
        )));
    }
    Ok(())
}

fn read_u32(bytes: &[u8], max_len: usize) -> Result<(u32, usize), GdscError> {
    need(bytes, max_len, 4)?;
    Ok((u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 4))
}

fn read_i32(bytes: &[u8], max_len: usize) -> Result<(i32, usize), GdscError> {
    let (v, n) = read_u32(bytes, max_len)?;
    Ok((v as i32, n))
}

fn read_f32(bytes: &[u8], max_len: usize) -> Result<(f32, usize), GdscError> {
    need(bytes, max_len, 4)?;
    Ok((f32::from_le_bytes(bytes[0..4].try_into().unwrap()), 4))
}

fn read_f64(bytes: &[u8], max_len: usize) -> Result<(f64, usize), GdscError> {
    need(bytes, max_len, 8)?;
    Ok((f64::from_le_bytes(bytes[0..8].try_into().unwrap()), 8))
}

/// Reads a length-prefixed, null-terminated, 4-byte-padded UTF-8 string -
/// the same shape spec section 4.3 specifies for the legacy identifier
/// table, reused here for string-typed constants.
fn read_string(bytes: &[u8], max_len: usize) -> Result<(String, usize), GdscError> {
    let (len, mut consumed) = read_u32(bytes, max_len)?;
    let len = len as usize;
    let total_payload = len + 1; // null terminator
    let padded = total_payload.div_ceil(4) * 4;
    need(bytes, max_len, consumed + padded)?;
    let s = std::str::from_utf8(&bytes[consumed..consumed + len])
        .map_err(|e| GdscError::VariantDecodeError(format!("string constant is not UTF-8: {e}")))?
        .to_string();
    consumed += padded;
    Ok((s, consumed))
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend((s.len() as u32).to_le_bytes());
    out.extend(s.as_bytes());
    out.push(0);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

impl VariantCodec for GdscriptVariantCodec {
    fn decode(
        &self,
        format_major: u32,
        bytes: &[u8],
        max_len: usize,
    ) -> Result<(Variant, usize), GdscError> {
        let (tag, mut consumed) = read_i32(bytes, max_len)?;
        let rest = &bytes[consumed..];
        let rest_max = max_len - consumed;

        macro_rules! adv {
            ($n:expr) => {
                consumed += $n;
            };
        }

        let value = match tag {
            tags::NIL => Variant::Nil,
            tags::BOOL => {
                let (v, n) = read_u32(rest, rest_max)?;
                adv!(n);
                Variant::Bool(v != 0)
            }
            tags::INT => {
                need(rest, rest_max, 1)?;
                let wide = rest[0] != 0;
                adv!(1);
                let rest2 = &bytes[consumed..];
                let rest2_max = max_len - consumed;
                if wide {
                    need(rest2, rest2_max, 8)?;
                    let v = i64::from_le_bytes(rest2[0..8].try_into().unwrap());
                    adv!(8);
                    Variant::Int(v)
                } else {
                    let (v, n) = read_i32(rest2, rest2_max)?;
                    adv!(n);
                    Variant::Int(v as i64)
                }
            }
            tags::FLOAT => {
                let (v, n) = read_f64(rest, rest_max)?;
                adv!(n);
                Variant::Float(v)
            }
            tags::STRING => {
                let (s, n) = read_string(rest, rest_max)?;
                adv!(n);
                Variant::String(s)
            }
            tags::VECTOR2 => {
                let (x, n1) = read_f32(rest, rest_max)?;
                let (y, n2) = read_f32(&rest[n1..], rest_max - n1)?;
                adv!(n1 + n2);
                Variant::Vector2(x, y)
            }
            t if t == tags::LEGACY_VECTOR3 || t == tags::CURRENT_VECTOR3 => {
                let (x, n1) = read_f32(rest, rest_max)?;
                let (y, n2) = read_f32(&rest[n1..], rest_max - n1)?;
                let (z, n3) = read_f32(&rest[n1 + n2..], rest_max - n1 - n2)?;
                adv!(n1 + n2 + n3);
                Variant::Vector3(x, y, z)
            }
            t if t == tags::LEGACY_NODE_PATH || t == tags::CURRENT_NODE_PATH => {
                let (s, n) = read_string(rest, rest_max)?;
                adv!(n);
                Variant::NodePath(s)
            }
            t if t == tags::LEGACY_ARRAY || t == tags::CURRENT_ARRAY => {
                let (count, mut n) = read_u32(rest, rest_max)?;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (item, used) = self.decode(format_major, &rest[n..], rest_max - n)?;
                    items.push(item);
                    n += used;
                }
                adv!(n);
                Variant::Array(items)
            }
            t if t == tags::LEGACY_DICTIONARY || t == tags::CURRENT_DICTIONARY => {
                let (count, mut n) = read_u32(rest, rest_max)?;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (key, used_k) = self.decode(format_major, &rest[n..], rest_max - n)?;
                    n += used_k;
                    let (val, used_v) = self.decode(format_major, &rest[n..], rest_max - n)?;
                    n += used_v;
                    items.push((key, val));
                }
                adv!(n);
                Variant::Dictionary(items)
            }
            unknown => {
                let (len, n1) = read_u32(rest, rest_max)?;
                let len = len as usize;
                need(&rest[n1..], rest_max - n1, len)?;
                let raw = rest[n1..n1 + len].to_vec();
                adv!(n1 + len);
                Variant::Raw {
                    type_tag: unknown,
                    bytes: raw,
                }
            }
        };

        Ok((value, consumed))
    }

    fn encode(
        &self,
        format_major: u32,
        value: &Variant,
        encode_full_objects: bool,
    ) -> Result<Vec<u8>, GdscError> {
        let tag = tags::tag_for_value(format_major, value);
        let mut out = Vec::new();
        out.extend((tag as u32).to_le_bytes());

        match value {
            Variant::Nil => {}
            Variant::Bool(b) => out.extend((*b as u32).to_le_bytes()),
            Variant::Int(v) => {
                if *v >= i32::MIN as i64 && *v <= i32::MAX as i64 {
                    out.push(0);
                    out.extend((*v as i32).to_le_bytes());
                } else {
                    out.push(1);
                    out.extend(v.to_le_bytes());
                }
            }
            Variant::Float(v) => out.extend(v.to_le_bytes()),
            Variant::String(s) => write_string(&mut out, s),
            Variant::Vector2(x, y) => {
                out.extend(x.to_le_bytes());
                out.extend(y.to_le_bytes());
            }
            Variant::Vector3(x, y, z) => {
                out.extend(x.to_le_bytes());
                out.extend(y.to_le_bytes());
                out.extend(z.to_le_bytes());
            }
            Variant::NodePath(s) => write_string(&mut out, s),
            Variant::Array(items) => {
                out.extend((items.len() as u32).to_le_bytes());
                for item in items {
                    out.extend(self.encode(format_major, item, encode_full_objects)?);
                }
            }
            Variant::Dictionary(items) => {
                out.extend((items.len() as u32).to_le_bytes());
                for (k, v) in items {
                    out.extend(self.encode(format_major, k, encode_full_objects)?);
                    out.extend(self.encode(format_major, v, encode_full_objects)?);
                }
            }
            Variant::Raw { bytes, .. } => {
                out.extend((bytes.len() as u32).to_le_bytes());
                out.extend(bytes);
            }
        }

        Ok(out)
    }

    fn type_name(&self, format_major: u32, type_tag: i32) -> Option<String> {
        tags::name_for(format_major, type_tag)
    }

    fn type_tag(&self, format_major: u32, name: &str) -> Option<i32> {
        tags::tag_for(format_major, name)
    }

    fn convert_type_tag_to_current(&self, format_major: u32, type_tag: i32) -> i32 {
        tags::convert_to_current(format_major, type_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(major: u32, v: Variant) {
        let codec = GdscriptVariantCodec;
        let bytes = codec.encode(major, &v, false).unwrap();
        let (decoded, used) = codec.decode(major, &bytes, bytes.len()).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, v);
    }

    #[test]
    fn round_trips_scalars() {
        roundtrip(2, Variant::Nil);
        roundtrip(2, Variant::Bool(true));
        roundtrip(2, Variant::Int(42));
        roundtrip(2, Variant::Int(i64::MAX));
        roundtrip(2, Variant::Float(3.5));
        roundtrip(2, Variant::String("hi".to_string()));
    }

    #[test]
    fn round_trips_vectors_and_node_path() {
        roundtrip(4, Variant::Vector2(1.0, 2.0));
        roundtrip(4, Variant::Vector3(1.0, 2.0, 3.0));
        roundtrip(4, Variant::NodePath("../Node2D".to_string()));
    }

    #[test]
    fn round_trips_nested_containers() {
        roundtrip(
            4,
            Variant::Array(vec![Variant::Int(1), Variant::String("a".to_string())]),
        );
        roundtrip(
            4,
            Variant::Dictionary(vec![(
                Variant::String("k".to_string()),
                Variant::Int(1),
            )]),
        );
    }

    #[test]
    fn legacy_and_current_tags_differ_for_array() {
        let codec = GdscriptVariantCodec;
        assert_ne!(
            codec.type_tag(2, "Array").unwrap(),
            codec.type_tag(4, "Array").unwrap()
        );
        assert_eq!(
            codec.convert_type_tag_to_current(2, codec.type_tag(2, "Array").unwrap()),
            codec.type_tag(4, "Array").unwrap()
        );
    }

    #[test]
    fn unknown_tag_round_trips_as_raw() {
        let codec = GdscriptVariantCodec;
        let v = Variant::Raw {
            type_tag: 9999,
            bytes: vec![1, 2, 3, 4],
        };
        roundtrip(2, v);
    }

    #[test]
    fn truncated_buffer_is_a_decode_error() {
        let codec = GdscriptVariantCodec;
        let bytes = codec.encode(2, &Variant::Int(500_000), false).unwrap();
        let err = codec.decode(2, &bytes[..bytes.len() - 1], bytes.len() - 1);
        assert!(err.is_err());
    }
}
