//! Storage slot derivation. A path into state is a base slot followed by a
//! chain of accessors, each mapping one slot to the next.

use std::fmt;

use moi_polo::{Hash, Schema, Value, encode_to_string, polorize};
use num_bigint::BigUint;
use num_traits::One;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::LogicError;

static SLOT_MODULUS: Lazy<BigUint> = Lazy::new(|| BigUint::one() << 256u32);

/// A 256-bit storage address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHash(BigUint);

impl SlotHash {
    /// Reduces `value` modulo 2^256.
    pub fn new(value: impl Into<BigUint>) -> Self {
        Self(value.into() % &*SLOT_MODULUS)
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let digits = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - digits.len()..].copy_from_slice(&digits);
        out
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let digits = self.0.to_bytes_le();
        let mut out = [0u8; 32];
        out[..digits.len()].copy_from_slice(&digits);
        out
    }

    /// `0x`-prefixed big-endian hex, always 64 digits. This is the storage key.
    pub fn to_hex(&self) -> String {
        encode_to_string(self.to_be_bytes())
    }

    fn wrapping_add(self, offset: u64) -> Self {
        Self::new(self.0 + offset)
    }
}

impl From<u64> for SlotHash {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Debug for SlotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotHash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for SlotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// One step of a storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Length of an array or map, stored at the collection's own slot.
    Length,
    /// Map entry; holds the POLO encoding of the key.
    Property(Vec<u8>),
    ArrayIndex(u64),
    /// Class member at its declared field slot.
    ClassField(u64),
}

impl Accessor {
    /// Map entry accessor for a string, integer, boolean or bytes key.
    pub fn property(key: &Value) -> Result<Self, LogicError> {
        let schema = match key {
            Value::String(_) => Schema::String,
            Value::Integer(_) => Schema::Integer,
            Value::Bool(_) => Schema::Bool,
            Value::Bytes(_) => Schema::Bytes,
            other => {
                return Err(LogicError::InvalidArgument(format!(
                    "map keys must be primitive, got {}",
                    other.kind()
                )));
            }
        };
        Ok(Accessor::Property(polorize(key, &schema)?))
    }

    pub fn access(&self, slot: SlotHash) -> SlotHash {
        match self {
            Accessor::Length => slot,
            Accessor::Property(key) => {
                // little-endian slot, unlike the index accessors
                let mut buffer = Vec::with_capacity(33 + key.len());
                buffer.extend_from_slice(&slot.to_le_bytes());
                buffer.push(b'.');
                buffer.extend_from_slice(key);
                SlotHash::from_be_bytes(Hash::of_bytes(&buffer).as_bytes())
            }
            Accessor::ArrayIndex(offset) | Accessor::ClassField(offset) => {
                let hash = Hash::of_bytes(&slot.to_be_bytes());
                SlotHash::from_be_bytes(hash.as_bytes()).wrapping_add(*offset)
            }
        }
    }
}

/// Ordered accessors, folded left to right over a base slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorChain {
    accessors: Vec<Accessor>,
}

impl AccessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, accessor: Accessor) {
        self.accessors.push(accessor);
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn resolve(&self, base: SlotHash) -> SlotHash {
        self.accessors.iter().fold(base, |slot, accessor| {
            let next = accessor.access(slot);
            trace!(?accessor, slot = %next, "accessor step");
            next
        })
    }
}

impl FromIterator<Accessor> for AccessorChain {
    fn from_iter<I: IntoIterator<Item = Accessor>>(iter: I) -> Self {
        Self {
            accessors: iter.into_iter().collect(),
        }
    }
}
