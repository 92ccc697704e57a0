//! Per-`variant_format_major` type tag tables (spec section 4.2,
//! `type_name`/`type_tag`/`convert_type_tag_to_current`).
//!
//! Real engine revisions renumbered several Variant type tags across major
//! versions as new built-in types were inserted ahead of them. This table
//! models that shape with two tag families - "legacy" (format majors 1-2,
//! used by every bytecode-format-version-<100 revision in the registry
//! ladder) and "current" (format major 4, used by the v2-dialect
//! revisions) - without claiming to reproduce the real engine's exact
//! historical numbering.

use gdsc_core::variant::Variant;

pub const NIL: i32 = 0;
pub const BOOL: i32 = 1;
pub const INT: i32 = 2;
pub const FLOAT: i32 = 3;
pub const STRING: i32 = 4;
pub const VECTOR2: i32 = 5;

pub const LEGACY_VECTOR3: i32 = 7;
pub const LEGACY_NODE_PATH: i32 = 15;
pub const LEGACY_ARRAY: i32 = 18;
pub const LEGACY_DICTIONARY: i32 = 19;

pub const CURRENT_VECTOR3: i32 = 9;
pub const CURRENT_NODE_PATH: i32 = 17;
pub const CURRENT_DICTIONARY: i32 = 27;
pub const CURRENT_ARRAY: i32 = 28;

fn is_legacy(format_major: u32) -> bool {
    format_major < 4
}

pub fn name_for(format_major: u32, tag: i32) -> Option<String> {
    let legacy = is_legacy(format_major);
    let name = match tag {
        NIL => "Nil",
        BOOL => "bool",
        INT => "int",
        FLOAT => "float",
        STRING => "String",
        VECTOR2 => "Vector2",
        t if legacy && t == LEGACY_VECTOR3 => "Vector3",
        t if !legacy && t == CURRENT_VECTOR3 => "Vector3",
        t if legacy && t == LEGACY_NODE_PATH => "NodePath",
        t if !legacy && t == CURRENT_NODE_PATH => "NodePath",
        t if legacy && t == LEGACY_ARRAY => "Array",
        t if !legacy && t == CURRENT_ARRAY => "Array",
        t if legacy && t == LEGACY_DICTIONARY => "Dictionary",
        t if !legacy && t == CURRENT_DICTIONARY => "Dictionary",
        _ => return None,
    };
    Some(name.to_string())
}

pub fn tag_for(format_major: u32, name: &str) -> Option<i32> {
    let legacy = is_legacy(format_major);
    Some(match name {
        "Nil" => NIL,
        "bool" => BOOL,
        "int" => INT,
        "float" => FLOAT,
        "String" => STRING,
        "Vector2" => VECTOR2,
        "Vector3" => {
            if legacy {
                LEGACY_VECTOR3
            } else {
                CURRENT_VECTOR3
            }
        }
        "NodePath" => {
            if legacy {
                LEGACY_NODE_PATH
            } else {
                CURRENT_NODE_PATH
            }
        }
        "Array" => {
            if legacy {
                LEGACY_ARRAY
            } else {
                CURRENT_ARRAY
            }
        }
        "Dictionary" => {
            if legacy {
                LEGACY_DICTIONARY
            } else {
                CURRENT_DICTIONARY
            }
        }
        _ => return None,
    })
}

/// Map a tag from `format_major`'s family onto the tag major-4 would use
/// for the same logical type.
pub fn convert_to_current(format_major: u32, tag: i32) -> i32 {
    if !is_legacy(format_major) {
        return tag;
    }
    match tag {
        LEGACY_VECTOR3 => CURRENT_VECTOR3,
        LEGACY_NODE_PATH => CURRENT_NODE_PATH,
        LEGACY_ARRAY => CURRENT_ARRAY,
        LEGACY_DICTIONARY => CURRENT_DICTIONARY,
        other => other,
    }
}

/// The tag this adapter would write `value` under for `format_major`.
pub fn tag_for_value(format_major: u32, value: &Variant) -> i32 {
    let legacy = is_legacy(format_major);
    match value {
        Variant::Nil => NIL,
        Variant::Bool(_) => BOOL,
        Variant::Int(_) => INT,
        Variant::Float(_) => FLOAT,
        Variant::String(_) => STRING,
        Variant::Vector2(_, _) => VECTOR2,
        Variant::Vector3(_, _, _) => {
            if legacy {
                LEGACY_VECTOR3
            } else {
                CURRENT_VECTOR3
            }
        }
        Variant::NodePath(_) => {
            if legacy {
                LEGACY_NODE_PATH
            } else {
                CURRENT_NODE_PATH
            }
        }
        Variant::Array(_) => {
            if legacy {
                LEGACY_ARRAY
            } else {
                CURRENT_ARRAY
            }
        }
        Variant::Dictionary(_) => {
            if legacy {
                LEGACY_DICTIONARY
            } else {
                CURRENT_DICTIONARY
            }
        }
        Variant::Raw { type_tag, .. } => *type_tag,
    }
}
