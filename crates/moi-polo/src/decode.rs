use std::collections::VecDeque;

use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};

use crate::{
    NoRefs, PoloError, Schema, SchemaResolver, Value,
    value::duplicate_key,
    wire::{ReadBuffer, WireType},
};

/// Decode a single POLO wire against `schema`.
pub fn depolorize(bytes: &[u8], schema: &Schema) -> Result<Value, PoloError> {
    depolorize_with(bytes, schema, &NoRefs)
}

/// Like [`depolorize`], expanding schema references through `resolver`.
pub fn depolorize_with(
    bytes: &[u8],
    schema: &Schema,
    resolver: &dyn SchemaResolver,
) -> Result<Value, PoloError> {
    let buffer = ReadBuffer::from_wire(bytes)?;
    Decoder { resolver }.decode(&buffer, schema, 0)
}

/// Nesting limit for raw wires, compound elements and schema references.
pub const MAX_DEPTH: usize = 512;

struct Decoder<'a> {
    resolver: &'a dyn SchemaResolver,
}

impl Decoder<'_> {
    fn decode(&self, buffer: &ReadBuffer<'_>, schema: &Schema, depth: usize) -> Result<Value, PoloError> {
        if depth > MAX_DEPTH {
            return Err(PoloError::DepthExceeded(MAX_DEPTH));
        }
        let depth = depth + 1;
        match buffer.wire {
            WireType::Null => return Ok(schema.zero_value()),
            WireType::Raw => {
                return self.decode(&ReadBuffer::from_wire(buffer.data)?, schema, depth);
            }
            _ => {}
        }
        if let Schema::Ref(name) = schema {
            let resolved = self
                .resolver
                .resolve(name)
                .ok_or_else(|| PoloError::UnresolvedRef(name.clone()))?;
            return self.decode(buffer, &resolved, depth);
        }
        let unexpected = || PoloError::UnexpectedWire {
            expected: schema.kind(),
            found: buffer.wire,
        };
        match (schema, buffer.wire) {
            (Schema::Bool, WireType::False) => Ok(Value::Bool(false)),
            (Schema::Bool, WireType::True) => Ok(Value::Bool(true)),
            (Schema::Integer, WireType::PosInt) => {
                Ok(Value::Integer(BigInt::from_bytes_be(Sign::Plus, buffer.data)))
            }
            (Schema::Integer, WireType::NegInt) => {
                Ok(Value::Integer(BigInt::from_bytes_be(Sign::Minus, buffer.data)))
            }
            (Schema::String, WireType::Word) => Ok(Value::String(String::from_utf8(buffer.data.to_vec())?)),
            (Schema::Bytes, WireType::Word) => Ok(Value::Bytes(buffer.data.to_vec())),
            (Schema::Array(values), WireType::Pack) => buffer
                .unpack()?
                .iter()
                .map(|element| self.decode(element, values, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Schema::Map { keys, values }, WireType::Pack) => {
                let elements = buffer.unpack()?;
                if elements.len() % 2 != 0 {
                    return Err(PoloError::MalformedLoad(format!(
                        "map pack has odd element count {}",
                        elements.len()
                    )));
                }
                let value = elements
                    .chunks(2)
                    .map(|pair| {
                        Ok((
                            self.decode(&pair[0], keys, depth)?,
                            self.decode(&pair[1], values, depth)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, PoloError>>()
                    .map(Value::map)?;
                if let Value::Map(entries) = &value {
                    if let Some(key) = duplicate_key(entries) {
                        return Err(PoloError::DuplicateKey(key.to_json().to_string()));
                    }
                }
                Ok(value)
            }
            (Schema::Struct(fields), WireType::Pack) => {
                let mut elements = buffer.unpack()?.into_iter();
                fields
                    .iter()
                    .map(|(label, field)| {
                        let value = match elements.next() {
                            Some(element) => self.decode(&element, field, depth)?,
                            None => field.zero_value(),
                        };
                        Ok((label.clone(), value))
                    })
                    .collect::<Result<IndexMap<_, _>, PoloError>>()
                    .map(Value::Struct)
            }
            (Schema::Struct(fields), WireType::Doc) => self.decode_document(buffer, fields, depth),
            _ => Err(unexpected()),
        }
    }

    fn decode_document(
        &self,
        buffer: &ReadBuffer<'_>,
        fields: &IndexMap<String, Schema>,
        depth: usize,
    ) -> Result<Value, PoloError> {
        let elements = buffer.unpack()?;
        if elements.len() % 2 != 0 {
            return Err(PoloError::MalformedLoad(format!(
                "document has odd element count {}",
                elements.len()
            )));
        }
        let mut entries = IndexMap::new();
        for pair in elements.chunks(2) {
            if pair[0].wire != WireType::Word {
                return Err(PoloError::UnexpectedWire {
                    expected: "word",
                    found: pair[0].wire,
                });
            }
            entries.insert(String::from_utf8(pair[0].data.to_vec())?, &pair[1]);
        }
        fields
            .iter()
            .map(|(label, field)| {
                let value = match entries.get(label) {
                    Some(element) => self.decode(element, field, depth)?,
                    None => field.zero_value(),
                };
                Ok((label.clone(), value))
            })
            .collect::<Result<IndexMap<_, _>, PoloError>>()
            .map(Value::Struct)
    }
}

/// Sequential reader over the elements of a POLO pack.
///
/// A non-pack wire is read as a sequence of one element.
#[derive(Debug, Clone)]
pub struct Depolorizer<'a> {
    elements: VecDeque<ReadBuffer<'a>>,
}

impl<'a> Depolorizer<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, PoloError> {
        let buffer = ReadBuffer::from_wire(bytes)?;
        let elements = if buffer.wire == WireType::Pack {
            buffer.unpack()?.into()
        } else {
            VecDeque::from([buffer])
        };
        Ok(Self { elements })
    }

    pub fn is_done(&self) -> bool {
        self.elements.is_empty()
    }

    fn next(&mut self) -> Result<ReadBuffer<'a>, PoloError> {
        self.elements.pop_front().ok_or(PoloError::InsufficientWire)
    }

    pub fn depolorize_bool(&mut self) -> Result<bool, PoloError> {
        self.depolorize(&Schema::Bool).map(|v| v.as_bool().unwrap_or_default())
    }

    pub fn depolorize_integer(&mut self) -> Result<BigInt, PoloError> {
        match self.depolorize(&Schema::Integer)? {
            Value::Integer(i) => Ok(i),
            _ => Ok(BigInt::default()),
        }
    }

    pub fn depolorize_string(&mut self) -> Result<String, PoloError> {
        match self.depolorize(&Schema::String)? {
            Value::String(s) => Ok(s),
            _ => Ok(String::new()),
        }
    }

    pub fn depolorize(&mut self, schema: &Schema) -> Result<Value, PoloError> {
        self.depolorize_with(schema, &NoRefs)
    }

    pub fn depolorize_with(
        &mut self,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> Result<Value, PoloError> {
        let buffer = self.next()?;
        Decoder { resolver }.decode(&buffer, schema, 0)
    }

    /// Reads the next element as a nested pack.
    pub fn depolorize_packed(&mut self) -> Result<Depolorizer<'a>, PoloError> {
        let buffer = self.next()?;
        match buffer.wire {
            WireType::Pack => Ok(Depolorizer {
                elements: buffer.unpack()?.into(),
            }),
            WireType::Null => Ok(Depolorizer {
                elements: VecDeque::new(),
            }),
            found => Err(PoloError::UnexpectedWire {
                expected: "pack",
                found,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Polorizer, document_encode, polorize};

    #[test]
    fn decodes_routine_output_vector() {
        let schema = Schema::structure([("balance", Schema::Integer)]);
        let value = depolorize(&[0x0e, 0x1f, 0x03, 0x05, 0xf5, 0xe1, 0x00], &schema).expect("decode");
        assert_eq!(value, Value::structure([("balance", Value::from(100_000_000u64))]));
    }

    #[test]
    fn null_wire_yields_zero_value() {
        let schema = Schema::structure([
            ("name", Schema::String),
            ("tags", Schema::array(Schema::String)),
        ]);
        assert_eq!(depolorize(&[0x00], &schema).expect("decode"), schema.zero_value());
        assert_eq!(depolorize(&[0x03], &Schema::Integer).expect("decode"), Value::from(0u64));
    }

    #[test]
    fn struct_decodes_from_document_or_pack() {
        let schema = Schema::structure([
            ("owner", Schema::Bytes),
            ("supply", Schema::Integer),
            ("symbol", Schema::String),
        ]);
        let value = Value::structure([
            ("owner", Value::Bytes(vec![0xaa; 4])),
            ("supply", Value::from(-7i64)),
            ("symbol", Value::from("MOI")),
        ]);
        let doc = document_encode(&value, &schema).expect("doc");
        let pack = polorize(&value, &schema).expect("pack");
        assert_eq!(depolorize(&doc, &schema).expect("decode doc"), value);
        assert_eq!(depolorize(&pack, &schema).expect("decode pack"), value);
    }

    #[test]
    fn nested_map_of_arrays_survives_encoding() {
        let schema = Schema::map(Schema::Integer, Schema::array(Schema::Bool));
        let value = Value::map([
            (Value::from(1u64), Value::array([true, false])),
            (Value::from(40u64), Value::array(Vec::<bool>::new())),
        ]);
        let bytes = polorize(&value, &schema).expect("encode");
        assert_eq!(depolorize(&bytes, &schema).expect("decode"), value);
    }

    #[test]
    fn wrong_wire_is_reported() {
        let err = depolorize(&[0x06, b'a'], &Schema::Integer).unwrap_err();
        assert!(matches!(
            err,
            PoloError::UnexpectedWire {
                expected: "integer",
                found: WireType::Word
            }
        ));
    }

    #[test]
    fn depolorizer_reads_in_order() {
        let mut inner = Polorizer::new();
        inner.polorize_string("x");
        let mut outer = Polorizer::new();
        outer.polorize_integer(42u64);
        outer.polorize_packed(&inner);
        outer.polorize_bool(true);

        let bytes = outer.bytes();
        let mut reader = Depolorizer::new(&bytes).expect("reader");
        assert_eq!(reader.depolorize_integer().expect("int"), BigInt::from(42));
        let mut nested = reader.depolorize_packed().expect("packed");
        assert_eq!(nested.depolorize_string().expect("string"), "x");
        assert!(nested.is_done());
        assert!(reader.depolorize_bool().expect("bool"));
        assert!(reader.is_done());
        assert!(matches!(reader.depolorize_bool(), Err(PoloError::InsufficientWire)));
    }

    #[test]
    fn unsorted_map_decodes_equal_to_itself() {
        let schema = Schema::map(Schema::String, Schema::Integer);
        let value = Value::Map(vec![
            (Value::from("b"), Value::from(1u64)),
            (Value::from("a"), Value::from(2u64)),
        ]);
        let decoded = depolorize(&polorize(&value, &schema).expect("encode"), &schema).expect("decode");
        assert_eq!(decoded, value);
        let Value::Map(entries) = decoded else {
            panic!("expected map");
        };
        assert_eq!(entries[0].0, Value::from("a"));
    }

    #[test]
    fn repeated_key_on_the_wire_is_rejected() {
        let mut pack = Polorizer::new();
        pack.polorize_string("k");
        pack.polorize_integer(1u64);
        pack.polorize_string("k");
        pack.polorize_integer(2u64);
        let schema = Schema::map(Schema::String, Schema::Integer);
        let err = depolorize(&pack.packed(), &schema).unwrap_err();
        assert!(matches!(err, PoloError::DuplicateKey(key) if key == "\"k\""));
    }

    #[test]
    fn raw_wires_unwrap_to_their_content() {
        assert_eq!(depolorize(&[0x05, 0x05, 0x03, 0x07], &Schema::Integer).expect("decode"), Value::from(7u64));
    }

    #[test]
    fn deep_raw_nesting_is_bounded() {
        let bytes = [vec![0x05; 200_000], vec![0x03]].concat();
        let err = depolorize(&bytes, &Schema::Integer).unwrap_err();
        assert!(matches!(err, PoloError::DepthExceeded(MAX_DEPTH)));
    }

    #[test]
    fn deep_array_nesting_is_bounded() {
        let mut schema = Schema::Integer;
        let mut value = Value::from(1u64);
        for _ in 0..=MAX_DEPTH {
            schema = Schema::array(schema);
            value = Value::Array(vec![value]);
        }
        let bytes = polorize(&value, &schema).expect("encode");
        let err = depolorize(&bytes, &schema).unwrap_err();
        assert!(matches!(err, PoloError::DepthExceeded(_)));
    }
}
