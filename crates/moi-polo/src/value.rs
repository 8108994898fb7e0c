use std::cmp::Ordering;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{Num, ToPrimitive};
use serde_json::Value as JsonValue;

use crate::{PoloError, Schema, SchemaResolver, decode_hex, encode_to_string};

/// Dynamically typed value produced and consumed by the POLO codec.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(BigInt),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    /// Map entries. [`Value::map`] keeps them in wire key order; equality
    /// ignores entry order either way.
    Map(Vec<(Value, Value)>),
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Human-readable kind string used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    /// Convenience helper to build a struct from label/value pairs.
    pub fn structure(fields: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Value::Struct(
            fields
                .into_iter()
                .map(|(label, value)| (label.into(), value))
                .collect(),
        )
    }

    pub fn array(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| compare_keys(&a.0, &b.0));
        Value::Map(entries)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(ToPrimitive::to_u64)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Field of a struct value by label.
    pub fn get(&self, label: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.get(label),
            _ => None,
        }
    }

    /// Looks up a map entry by key.
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Builds a value from JSON, guided by `schema`.
    ///
    /// Integers accept JSON numbers and decimal or `0x`-hex strings; bytes
    /// accept `0x`-hex strings or arrays of octets; maps accept JSON objects
    /// (keys re-parsed against the key schema) or arrays of `[key, value]`.
    pub fn from_json(
        json: &JsonValue,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> Result<Value, PoloError> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        let mismatch = || PoloError::IncompatibleValue {
            expected: schema.kind(),
            found: json_kind(json),
        };
        match schema {
            Schema::Null => Err(mismatch()),
            Schema::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            Schema::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
            Schema::Integer => match json {
                JsonValue::Number(n) => parse_integer(&n.to_string()).ok_or_else(mismatch),
                JsonValue::String(s) => parse_integer(s).ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            Schema::Bytes => match json {
                JsonValue::String(s) => Ok(Value::Bytes(decode_hex(s)?)),
                JsonValue::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(mismatch)
                    })
                    .collect::<Result<Vec<u8>, _>>()
                    .map(Value::Bytes),
                _ => Err(mismatch()),
            },
            Schema::Array(values) => json
                .as_array()
                .ok_or_else(mismatch)?
                .iter()
                .map(|item| Value::from_json(item, values, resolver))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Schema::Map { keys, values } => match json {
                JsonValue::Object(object) => object
                    .iter()
                    .map(|(k, v)| {
                        let key = match keys.as_ref() {
                            Schema::String => Value::String(k.clone()),
                            other => Value::from_json(&JsonValue::String(k.clone()), other, resolver)?,
                        };
                        Ok((key, Value::from_json(v, values, resolver)?))
                    })
                    .collect::<Result<Vec<_>, PoloError>>()
                    .map(Value::map),
                JsonValue::Array(pairs) => pairs
                    .iter()
                    .map(|pair| match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((
                            Value::from_json(k, keys, resolver)?,
                            Value::from_json(v, values, resolver)?,
                        )),
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<Vec<_>, PoloError>>()
                    .map(Value::map),
                _ => Err(mismatch()),
            },
            Schema::Struct(fields) => {
                let object = json.as_object().ok_or_else(mismatch)?;
                if let Some(extra) = object.keys().find(|k| !fields.contains_key(*k)) {
                    return Err(PoloError::UnknownField(extra.clone()));
                }
                fields
                    .iter()
                    .map(|(label, field)| {
                        let value = match object.get(label) {
                            Some(v) => Value::from_json(v, field, resolver)?,
                            None => Value::Null,
                        };
                        Ok((label.clone(), value))
                    })
                    .collect::<Result<IndexMap<_, _>, PoloError>>()
                    .map(Value::Struct)
            }
            Schema::Ref(name) => {
                let resolved = resolver
                    .resolve(name)
                    .ok_or_else(|| PoloError::UnresolvedRef(name.clone()))?;
                Value::from_json(json, &resolved, resolver)
            }
        }
    }

    /// Renders the value as JSON. Integers outside the `i64`/`u64` range and
    /// map keys are rendered as strings; bytes as arrays of octets.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => {
                if let Some(u) = i.to_u64() {
                    JsonValue::from(u)
                } else if let Some(s) = i.to_i64() {
                    JsonValue::from(s)
                } else {
                    JsonValue::String(i.to_string())
                }
            }
            Value::Bytes(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (key_string(k), v.to_json()))
                    .collect(),
            ),
            Value::Struct(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(label, v)| (label.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a.len() == b.len() && sorted(a) == sorted(b),
            (Value::Struct(a), Value::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Map entries in wire key order.
pub(crate) fn sorted(entries: &[(Value, Value)]) -> Vec<&(Value, Value)> {
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by(|a, b| compare_keys(&a.0, &b.0));
    sorted
}

/// First key that occurs twice among entries already in wire key order.
pub(crate) fn duplicate_key<'v>(
    sorted: impl IntoIterator<Item = &'v (Value, Value)>,
) -> Option<&'v Value> {
    let mut previous: Option<&Value> = None;
    for (key, _) in sorted {
        if previous == Some(key) {
            return Some(key);
        }
        previous = Some(key);
    }
    None
}

fn parse_integer(text: &str) -> Option<Value> {
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => BigInt::from_str_radix(hex, 16).ok()?,
        None => BigInt::from_str_radix(text, 10).ok()?,
    };
    Some(Value::Integer(parsed))
}

fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Bytes(b) => encode_to_string(b),
        other => other.to_json().to_string(),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Ordering of map keys on the wire: integers numerically, strings and
/// bytes lexicographically. Keys of different kinds order by kind.
pub(crate) fn compare_keys(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Bytes(_) => 3,
            Value::String(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
            Value::Struct(_) => 7,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_keys(l, r))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Integer(value.into())
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoRefs;
    use serde_json::json;

    #[test]
    fn json_conversion_follows_schema() {
        let schema = Schema::structure([
            ("owner", Schema::Bytes),
            ("supply", Schema::Integer),
            ("holders", Schema::map(Schema::String, Schema::Integer)),
        ]);
        let value = Value::from_json(
            &json!({
                "owner": "0x0102",
                "supply": "0xff",
                "holders": {"alice": 10}
            }),
            &schema,
            &NoRefs,
        )
        .expect("from json");
        assert_eq!(
            value,
            Value::structure([
                ("owner", Value::Bytes(vec![1, 2])),
                ("supply", Value::from(255u64)),
                ("holders", Value::map([(Value::from("alice"), Value::from(10u64))])),
            ])
        );
        assert_eq!(value.to_json()["holders"], json!({"alice": 10}));
    }

    #[test]
    fn unknown_struct_fields_are_rejected() {
        let schema = Schema::structure([("a", Schema::Bool)]);
        let err = Value::from_json(&json!({"a": true, "b": 1}), &schema, &NoRefs).unwrap_err();
        assert!(matches!(err, PoloError::UnknownField(field) if field == "b"));
    }

    #[test]
    fn integer_keys_order_numerically() {
        let mut keys = vec![Value::from(256u64), Value::from(2u64), Value::from(-1i64)];
        keys.sort_by(compare_keys);
        assert_eq!(keys, vec![Value::from(-1i64), Value::from(2u64), Value::from(256u64)]);
    }
}
