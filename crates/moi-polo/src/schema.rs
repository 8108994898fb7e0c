use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{PoloError, Value};

/// Structural description of a POLO value.
///
/// Serializes to the `{ "kind": ..., "fields": { ... } }` shape used by
/// manifest tooling: arrays carry `fields.values`, maps carry
/// `fields.keys`/`fields.values`, structs carry one entry per label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub enum Schema {
    Null,
    Bool,
    Bytes,
    String,
    Integer,
    Array(Box<Schema>),
    Map {
        keys: Box<Schema>,
        values: Box<Schema>,
    },
    Struct(IndexMap<String, Schema>),
    /// Named back-reference, expanded on demand through a [`SchemaResolver`].
    Ref(String),
}

impl Schema {
    pub fn array(values: Schema) -> Self {
        Schema::Array(Box::new(values))
    }

    pub fn map(keys: Schema, values: Schema) -> Self {
        Schema::Map {
            keys: Box::new(keys),
            values: Box::new(values),
        }
    }

    pub fn structure(fields: impl IntoIterator<Item = (impl Into<String>, Schema)>) -> Self {
        Schema::Struct(
            fields
                .into_iter()
                .map(|(label, schema)| (label.into(), schema))
                .collect(),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Schema::Null => "null",
            Schema::Bool => "bool",
            Schema::Bytes => "bytes",
            Schema::String => "string",
            Schema::Integer => "integer",
            Schema::Array(_) => "array",
            Schema::Map { .. } => "map",
            Schema::Struct(_) => "struct",
            Schema::Ref(_) => "ref",
        }
    }

    /// Field schema of a struct by label.
    pub fn field(&self, label: &str) -> Option<&Schema> {
        match self {
            Schema::Struct(fields) => fields.get(label),
            _ => None,
        }
    }

    /// Value produced when a `null` wire is decoded against this schema.
    pub fn zero_value(&self) -> Value {
        match self {
            Schema::Null | Schema::Ref(_) => Value::Null,
            Schema::Bool => Value::Bool(false),
            Schema::Bytes => Value::Bytes(Vec::new()),
            Schema::String => Value::String(String::new()),
            Schema::Integer => Value::Integer(0.into()),
            Schema::Array(_) => Value::Array(Vec::new()),
            Schema::Map { .. } => Value::Map(Vec::new()),
            Schema::Struct(fields) => Value::Struct(
                fields
                    .iter()
                    .map(|(label, schema)| (label.clone(), schema.zero_value()))
                    .collect(),
            ),
        }
    }
}

/// Expands [`Schema::Ref`] nodes while encoding or decoding.
pub trait SchemaResolver {
    fn resolve(&self, name: &str) -> Option<Schema>;
}

/// Resolver for schemas that contain no references.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefs;

impl SchemaResolver for NoRefs {
    fn resolve(&self, _name: &str) -> Option<Schema> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSchema {
    kind: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    fields: IndexMap<String, RawSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl RawSchema {
    fn leaf(kind: &str) -> Self {
        RawSchema {
            kind: kind.to_string(),
            fields: IndexMap::new(),
            name: None,
        }
    }
}

impl TryFrom<RawSchema> for Schema {
    type Error = PoloError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let RawSchema {
            kind,
            mut fields,
            name,
        } = raw;
        Ok(match kind.as_str() {
            "null" => Schema::Null,
            "bool" => Schema::Bool,
            "bytes" => Schema::Bytes,
            "string" => Schema::String,
            "integer" => Schema::Integer,
            "array" => Schema::array(take_field(&mut fields, &kind, "values")?),
            "map" => {
                let keys = take_field(&mut fields, &kind, "keys")?;
                let values = take_field(&mut fields, &kind, "values")?;
                Schema::map(keys, values)
            }
            "struct" => Schema::Struct(
                fields
                    .into_iter()
                    .map(|(label, field)| Ok((label, Schema::try_from(field)?)))
                    .collect::<Result<_, PoloError>>()?,
            ),
            "ref" => Schema::Ref(
                name.ok_or_else(|| PoloError::InvalidSchema("ref schema missing 'name'".into()))?,
            ),
            other => return Err(PoloError::InvalidSchema(format!("unknown kind '{other}'"))),
        })
    }
}

fn take_field(
    fields: &mut IndexMap<String, RawSchema>,
    kind: &str,
    label: &str,
) -> Result<Schema, PoloError> {
    let field = fields
        .shift_remove(label)
        .ok_or_else(|| PoloError::InvalidSchema(format!("{kind} schema missing '{label}'")))?;
    Schema::try_from(field)
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        let kind = schema.kind();
        match schema {
            Schema::Null | Schema::Bool | Schema::Bytes | Schema::String | Schema::Integer => {
                RawSchema::leaf(kind)
            }
            Schema::Array(values) => RawSchema {
                fields: IndexMap::from([("values".to_string(), RawSchema::from(*values))]),
                ..RawSchema::leaf(kind)
            },
            Schema::Map { keys, values } => RawSchema {
                fields: IndexMap::from([
                    ("keys".to_string(), RawSchema::from(*keys)),
                    ("values".to_string(), RawSchema::from(*values)),
                ]),
                ..RawSchema::leaf(kind)
            },
            Schema::Struct(fields) => RawSchema {
                fields: fields
                    .into_iter()
                    .map(|(label, field)| (label, RawSchema::from(field)))
                    .collect(),
                ..RawSchema::leaf(kind)
            },
            Schema::Ref(name) => RawSchema {
                name: Some(name),
                ..RawSchema::leaf(kind)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_shape_matches_manifest_tooling() {
        let schema = Schema::structure([
            ("name", Schema::String),
            ("tags", Schema::array(Schema::String)),
            ("scores", Schema::map(Schema::String, Schema::Integer)),
        ]);
        let value = serde_json::to_value(&schema).expect("serialize");
        assert_eq!(
            value,
            json!({
                "kind": "struct",
                "fields": {
                    "name": {"kind": "string"},
                    "tags": {"kind": "array", "fields": {"values": {"kind": "string"}}},
                    "scores": {"kind": "map", "fields": {
                        "keys": {"kind": "string"},
                        "values": {"kind": "integer"}
                    }}
                }
            })
        );
        let back: Schema = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, schema);
    }

    #[test]
    fn rejects_array_without_values() {
        let err = serde_json::from_value::<Schema>(json!({"kind": "array", "fields": {}}));
        assert!(err.is_err());
        assert!(serde_json::from_value::<Schema>(json!({"kind": "float"})).is_err());
    }

    #[test]
    fn struct_zero_value_stops_at_refs() {
        let schema = Schema::structure([
            ("value", Schema::Integer),
            ("next", Schema::Ref("Node".into())),
        ]);
        assert_eq!(
            schema.zero_value(),
            Value::structure([("value", Value::from(0u64)), ("next", Value::Null)])
        );
    }
}
