//! Type descriptor grammar: `u64`, `[]string`, `[4]bytes`, `map[K]V`, `ClassName`.

use moi_polo::Schema;

use crate::ManifestError;

pub const PRIMITIVE_TYPES: [&str; 10] = [
    "null", "bool", "bytes", "address", "string", "u64", "u256", "i64", "i256", "bigint",
];

/// Structural kind of a type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Primitive(String),
    /// `length` is informational; it is not enforced on encode or decode.
    Array {
        length: Option<u64>,
        element: String,
    },
    Map {
        key: String,
        value: String,
    },
    Class(String),
}

pub fn is_primitive_type(ty: &str) -> bool {
    PRIMITIVE_TYPES.contains(&ty)
}

/// Matches a leading `[` digits* `]` group.
pub fn is_array(ty: &str) -> bool {
    array_prefix_len(ty).is_some()
}

pub fn is_map(ty: &str) -> bool {
    ty.starts_with("map")
}

fn array_prefix_len(ty: &str) -> Option<usize> {
    let rest = ty.strip_prefix('[')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    (rest.as_bytes().get(digits) == Some(&b']')).then_some(digits + 2)
}

/// Classifies `ty` in precedence order: primitive, array, map, then class
/// membership as decided by `is_class`.
pub fn classify(ty: &str, is_class: impl Fn(&str) -> bool) -> Result<Classification, ManifestError> {
    if is_primitive_type(ty) {
        return Ok(Classification::Primitive(ty.to_string()));
    }
    if let Some(prefix) = array_prefix_len(ty) {
        let length = ty[1..prefix - 1].parse().ok();
        return Ok(Classification::Array {
            length,
            element: extract_array_element_type(ty)?,
        });
    }
    if is_map(ty) {
        let (key, value) = extract_map_key_value(ty)?;
        return Ok(Classification::Map { key, value });
    }
    if is_class(ty) {
        return Ok(Classification::Class(ty.to_string()));
    }
    Err(ManifestError::UnsupportedType(ty.to_string()))
}

pub fn extract_array_element_type(ty: &str) -> Result<String, ManifestError> {
    let prefix = array_prefix_len(ty)
        .ok_or_else(|| ManifestError::InvalidArgument(format!("'{ty}' is not an array type")))?;
    let element = &ty[prefix..];
    if element.is_empty() {
        return Err(ManifestError::InvalidArgument(format!(
            "array type '{ty}' has no element type"
        )));
    }
    Ok(element.to_string())
}

/// Splits `map[K]V` into `(K, V)`.
///
/// The key is found by a bracket-depth scan from the first `[`; the value is
/// what remains after removing the first occurrence of `map[K]`.
pub fn extract_map_key_value(ty: &str) -> Result<(String, String), ManifestError> {
    let mut depth = 0usize;
    let mut start = None;
    let mut end = None;
    for (idx, byte) in ty.bytes().enumerate() {
        match byte {
            b'[' => {
                start.get_or_insert(idx + 1);
                depth += 1;
            }
            b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let key = match (start, end) {
        (Some(start), Some(end)) if end > start => &ty[start..end],
        _ => "",
    };
    let value = if key.is_empty() {
        String::new()
    } else {
        ty.replacen(&format!("map[{key}]"), "", 1)
    };
    if key.is_empty() || value.is_empty() {
        return Err(ManifestError::InvalidArgument(format!(
            "cannot determine key and value types of map '{ty}'"
        )));
    }
    Ok((key.to_string(), value))
}

/// Maps a primitive token to its codec schema.
pub fn convert_primitive(ty: &str) -> Result<Schema, ManifestError> {
    Ok(match ty {
        "null" => Schema::Null,
        "bool" => Schema::Bool,
        "bytes" | "address" => Schema::Bytes,
        "string" => Schema::String,
        "u64" | "u256" | "i64" | "i256" | "bigint" => Schema::Integer,
        other => {
            return Err(ManifestError::UnsupportedOperation(format!(
                "unsupported primitive type '{other}'"
            )));
        }
    })
}
