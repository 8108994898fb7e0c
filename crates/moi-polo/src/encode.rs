use num_bigint::{BigInt, Sign};

use crate::{
    NoRefs, PoloError, Schema, SchemaResolver, Value,
    value::{duplicate_key, sorted},
    wire::{WireType, write_load, write_varint},
};

/// Serialize a value against its schema into a single POLO wire.
pub fn polorize(value: &Value, schema: &Schema) -> Result<Vec<u8>, PoloError> {
    polorize_with(value, schema, &NoRefs)
}

/// Like [`polorize`], expanding schema references through `resolver`.
pub fn polorize_with(
    value: &Value,
    schema: &Schema,
    resolver: &dyn SchemaResolver,
) -> Result<Vec<u8>, PoloError> {
    let encoder = Encoder {
        resolver,
        documents: false,
    };
    let (wire, data) = encoder.encode(value, schema)?;
    Ok(to_wire(wire, &data))
}

/// Serialize a value with every struct encoded as a keyed document.
pub fn document_encode(value: &Value, schema: &Schema) -> Result<Vec<u8>, PoloError> {
    document_encode_with(value, schema, &NoRefs)
}

pub fn document_encode_with(
    value: &Value,
    schema: &Schema,
    resolver: &dyn SchemaResolver,
) -> Result<Vec<u8>, PoloError> {
    let encoder = Encoder {
        resolver,
        documents: true,
    };
    let (wire, data) = encoder.encode(value, schema)?;
    Ok(to_wire(wire, &data))
}

fn to_wire(wire: WireType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 1);
    write_varint(&mut out, wire as u64);
    out.extend_from_slice(data);
    out
}

fn integer_wire(value: &BigInt) -> (WireType, Vec<u8>) {
    match value.sign() {
        Sign::NoSign => (WireType::PosInt, Vec::new()),
        Sign::Plus => (WireType::PosInt, value.magnitude().to_bytes_be()),
        Sign::Minus => (WireType::NegInt, value.magnitude().to_bytes_be()),
    }
}

struct Encoder<'a> {
    resolver: &'a dyn SchemaResolver,
    documents: bool,
}

impl Encoder<'_> {
    fn encode(&self, value: &Value, schema: &Schema) -> Result<(WireType, Vec<u8>), PoloError> {
        if let Value::Null = value {
            return Ok((WireType::Null, Vec::new()));
        }
        if let Schema::Ref(name) = schema {
            let resolved = self
                .resolver
                .resolve(name)
                .ok_or_else(|| PoloError::UnresolvedRef(name.clone()))?;
            return self.encode(value, &resolved);
        }
        let mismatch = || PoloError::IncompatibleValue {
            expected: schema.kind(),
            found: value.kind(),
        };
        match (schema, value) {
            (Schema::Bool, Value::Bool(false)) => Ok((WireType::False, Vec::new())),
            (Schema::Bool, Value::Bool(true)) => Ok((WireType::True, Vec::new())),
            (Schema::Integer, Value::Integer(i)) => Ok(integer_wire(i)),
            (Schema::String, Value::String(s)) => Ok((WireType::Word, s.as_bytes().to_vec())),
            (Schema::Bytes, Value::Bytes(b)) => Ok((WireType::Word, b.clone())),
            (Schema::Array(values), Value::Array(items)) => {
                let entries = items
                    .iter()
                    .map(|item| self.encode(item, values))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((WireType::Pack, write_load(&entries)))
            }
            (Schema::Map { keys, values }, Value::Map(pairs)) => {
                let sorted = sorted(pairs);
                if let Some(key) = duplicate_key(sorted.iter().copied()) {
                    return Err(PoloError::DuplicateKey(key.to_json().to_string()));
                }
                let mut entries = Vec::with_capacity(sorted.len() * 2);
                for (k, v) in sorted {
                    entries.push(self.encode(k, keys)?);
                    entries.push(self.encode(v, values)?);
                }
                Ok((WireType::Pack, write_load(&entries)))
            }
            (Schema::Struct(fields), Value::Struct(object)) => {
                if let Some(extra) = object.keys().find(|k| !fields.contains_key(*k)) {
                    return Err(PoloError::UnknownField(extra.clone()));
                }
                if self.documents {
                    self.encode_document(fields, object)
                } else {
                    let entries = fields
                        .iter()
                        .map(|(label, field)| {
                            self.encode(object.get(label).unwrap_or(&Value::Null), field)
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok((WireType::Pack, write_load(&entries)))
                }
            }
            _ => Err(mismatch()),
        }
    }

    fn encode_document(
        &self,
        fields: &indexmap::IndexMap<String, Schema>,
        object: &indexmap::IndexMap<String, Value>,
    ) -> Result<(WireType, Vec<u8>), PoloError> {
        let mut labels: Vec<&String> = fields.keys().collect();
        labels.sort();
        let mut entries = Vec::with_capacity(labels.len() * 2);
        for label in labels {
            let (wire, data) = self.encode(object.get(label).unwrap_or(&Value::Null), &fields[label])?;
            entries.push((WireType::Word, label.as_bytes().to_vec()));
            entries.push((WireType::Raw, to_wire(wire, &data)));
        }
        Ok((WireType::Doc, write_load(&entries)))
    }
}

/// Ordered writer for heterogeneous POLO sequences.
///
/// A single polorized element is emitted as a plain wire, several as a pack.
#[derive(Debug, Clone, Default)]
pub struct Polorizer {
    entries: Vec<(WireType, Vec<u8>)>,
}

impl Polorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn polorize_bool(&mut self, value: bool) {
        let wire = if value { WireType::True } else { WireType::False };
        self.entries.push((wire, Vec::new()));
    }

    pub fn polorize_integer(&mut self, value: impl Into<BigInt>) {
        self.entries.push(integer_wire(&value.into()));
    }

    pub fn polorize_string(&mut self, value: &str) {
        self.entries.push((WireType::Word, value.as_bytes().to_vec()));
    }

    pub fn polorize_bytes(&mut self, value: &[u8]) {
        self.entries.push((WireType::Word, value.to_vec()));
    }

    pub fn polorize(&mut self, value: &Value, schema: &Schema) -> Result<(), PoloError> {
        self.polorize_with(value, schema, &NoRefs)
    }

    pub fn polorize_with(
        &mut self,
        value: &Value,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> Result<(), PoloError> {
        let encoder = Encoder {
            resolver,
            documents: false,
        };
        self.entries.push(encoder.encode(value, schema)?);
        Ok(())
    }

    /// Appends the contents of `other` as one nested pack element.
    pub fn polorize_packed(&mut self, other: &Polorizer) {
        self.entries.push((WireType::Pack, write_load(&other.entries)));
    }

    /// Emits the buffer: `null` when empty, the lone wire for one element,
    /// otherwise a pack.
    pub fn bytes(&self) -> Vec<u8> {
        match self.entries.as_slice() {
            [] => to_wire(WireType::Null, &[]),
            [(wire, data)] => to_wire(*wire, data),
            _ => self.packed(),
        }
    }

    /// Emits the buffer as a pack regardless of element count.
    pub fn packed(&self) -> Vec<u8> {
        to_wire(WireType::Pack, &write_load(&self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_struct_field_matches_routine_output_vector() {
        let schema = Schema::structure([("balance", Schema::Integer)]);
        let value = Value::structure([("balance", Value::from(100_000_000u64))]);
        assert_eq!(
            polorize(&value, &schema).expect("encode"),
            vec![0x0e, 0x1f, 0x03, 0x05, 0xf5, 0xe1, 0x00]
        );
    }

    #[test]
    fn atoms_encode_with_their_wire_tag() {
        assert_eq!(polorize(&Value::from("foo"), &Schema::String).unwrap(), b"\x06foo".to_vec());
        assert_eq!(polorize(&Value::from(0u64), &Schema::Integer).unwrap(), vec![0x03]);
        assert_eq!(polorize(&Value::from(-300i64), &Schema::Integer).unwrap(), vec![0x04, 0x01, 0x2c]);
        assert_eq!(polorize(&Value::Bool(true), &Schema::Bool).unwrap(), vec![0x02]);
        assert_eq!(polorize(&Value::Null, &Schema::String).unwrap(), vec![0x00]);
    }

    #[test]
    fn map_entries_are_sorted_by_key() {
        let schema = Schema::map(Schema::Integer, Schema::Bool);
        let unsorted = Value::Map(vec![
            (Value::from(300u64), Value::Bool(true)),
            (Value::from(2u64), Value::Bool(false)),
        ]);
        let sorted = Value::map([
            (Value::from(2u64), Value::Bool(false)),
            (Value::from(300u64), Value::Bool(true)),
        ]);
        assert_eq!(polorize(&unsorted, &schema).unwrap(), polorize(&sorted, &schema).unwrap());
    }

    #[test]
    fn duplicate_map_keys_are_rejected() {
        let schema = Schema::map(Schema::String, Schema::Integer);
        let value = Value::Map(vec![
            (Value::from("alice"), Value::from(1u64)),
            (Value::from("bob"), Value::from(2u64)),
            (Value::from("alice"), Value::from(3u64)),
        ]);
        let err = polorize(&value, &schema).unwrap_err();
        assert!(matches!(err, PoloError::DuplicateKey(key) if key == "\"alice\""));
    }

    #[test]
    fn document_keys_are_sorted_and_values_raw() {
        let schema = Schema::structure([("b", Schema::Bool), ("a", Schema::Integer)]);
        let value = Value::structure([("b", Value::Bool(true)), ("a", Value::from(1u64))]);
        let bytes = document_encode(&value, &schema).expect("document");
        // doc tag, load with 4 head entries: word "a", raw 0x0301, word "b", raw 0x02
        assert_eq!(
            bytes,
            vec![0x0d, 0x4f, 0x06, 0x15, 0x36, 0x45, b'a', 0x03, 0x01, b'b', 0x02]
        );
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let err = polorize(&Value::from("x"), &Schema::Integer).unwrap_err();
        assert!(matches!(
            err,
            PoloError::IncompatibleValue {
                expected: "integer",
                found: "string"
            }
        ));
    }

    #[test]
    fn polorizer_emits_single_wire_or_pack() {
        let mut one = Polorizer::new();
        one.polorize_string("balance");
        assert_eq!(one.bytes(), b"\x06balance".to_vec());

        let mut two = Polorizer::new();
        two.polorize_integer(1u64);
        two.polorize_bool(false);
        assert_eq!(two.bytes(), vec![0x0e, 0x2f, 0x03, 0x11, 0x01]);
        assert_eq!(Polorizer::new().bytes(), vec![0x00]);
    }
}
