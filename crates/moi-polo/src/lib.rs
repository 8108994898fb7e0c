//! POLO wire codec and blake2b-256 hashing utilities shared by the MOI crates.

mod decode;
mod encode;
mod schema;
mod value;
pub mod wire;

pub use decode::{Depolorizer, MAX_DEPTH, depolorize, depolorize_with};
pub use encode::{Polorizer, document_encode, document_encode_with, polorize, polorize_with};
pub use schema::{NoRefs, Schema, SchemaResolver};
pub use value::Value;
pub use wire::WireType;

use blake2::{Blake2b, Digest, digest::consts::U32};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Prefix for hex-encoded byte strings on the wire.
pub const HEX_PREFIX: &str = "0x";

/// Renders bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_to_string(bytes: impl AsRef<[u8]>) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(bytes))
}

/// Parses a hex string, with or without the `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, PoloError> {
    let rest = s.strip_prefix(HEX_PREFIX).unwrap_or(s);
    hex::decode(rest).map_err(PoloError::InvalidHex)
}

#[derive(Debug, thiserror::Error)]
pub enum PoloError {
    #[error("insufficient wire: no more elements to read")]
    InsufficientWire,
    #[error("malformed varint")]
    MalformedVarint,
    #[error("malformed load: {0}")]
    MalformedLoad(String),
    #[error("unknown wire type {0}")]
    UnknownWireType(u8),
    #[error("unexpected wire: expected {expected}, found {found}")]
    UnexpectedWire {
        expected: &'static str,
        found: WireType,
    },
    #[error("incompatible value: schema expects {expected}, got {found}")]
    IncompatibleValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown struct field '{0}'")]
    UnknownField(String),
    #[error("unresolved schema reference '{0}'")]
    UnresolvedRef(String),
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("duplicate map key {0}")]
    DuplicateKey(String),
    #[error("nesting exceeds {0} levels")]
    DepthExceeded(usize),
    #[error("invalid utf-8 in word: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Wrapper around a 32-byte blake2b digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Compute the blake2b-256 hash of the provided byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Blake2b256::digest(bytes);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&digest);
        Hash(arr)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        encode_to_string(self.0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashLengthError> {
        if bytes.len() != 32 {
            return Err(HashLengthError(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(value: [u8; 32]) -> Self {
        Hash(value)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(value: Hash) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Error returned when attempting to create a hash from the wrong byte length.
#[derive(Debug, thiserror::Error)]
#[error("hash must be 32 bytes, got {0}")]
pub struct HashLengthError(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_256_known_vector() {
        // blake2b-256 of the empty input
        assert_eq!(
            Hash::of_bytes(b"").to_hex(),
            "0x0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn hex_helpers_round_trip() {
        assert_eq!(encode_to_string([0xde, 0xad]), "0xdead");
        assert_eq!(decode_hex("0xdead").expect("hex"), vec![0xde, 0xad]);
        assert_eq!(decode_hex("beef").expect("hex"), vec![0xbe, 0xef]);
        assert!(decode_hex("0xzz").is_err());
        assert!(Hash::from_bytes(&[0u8; 31]).is_err());
    }
}
