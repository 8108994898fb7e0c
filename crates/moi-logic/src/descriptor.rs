use std::fmt;
use std::str::FromStr;

use moi_manifest::{
    ContextStateMatrix, ElementDescriptor, ElementPtr, Manifest, StateDef, StateMode,
};
use moi_polo::{decode_hex, encode_to_string};

use crate::LogicError;

/// Identifier of a deployed logic, kept as lowercase `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicId(String);

impl LogicId {
    pub fn new(id: &str) -> Result<Self, LogicError> {
        let bytes = decode_hex(id)
            .map_err(|err| LogicError::InvalidArgument(format!("logic id '{id}': {err}")))?;
        if bytes.is_empty() {
            return Err(LogicError::InvalidArgument("logic id is empty".into()));
        }
        Ok(Self(encode_to_string(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LogicId {
    type Err = LogicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for LogicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deployed logic: its identifier and the indexed elements of its manifest.
#[derive(Debug, Clone)]
pub struct LogicDescriptor {
    id: LogicId,
    elements: ElementDescriptor,
}

impl LogicDescriptor {
    pub fn new(id: LogicId, manifest: &Manifest) -> Result<Self, LogicError> {
        let elements = ElementDescriptor::new(manifest.elements.iter().cloned())?;
        Ok(Self::from_elements(id, elements))
    }

    pub fn from_elements(id: LogicId, elements: ElementDescriptor) -> Self {
        Self { id, elements }
    }

    pub fn id(&self) -> &LogicId {
        &self.id
    }

    pub fn elements(&self) -> &ElementDescriptor {
        &self.elements
    }

    pub fn state_matrix(&self) -> &ContextStateMatrix {
        self.elements.state_matrix()
    }

    pub fn state(&self, mode: StateMode) -> Option<(ElementPtr, &StateDef)> {
        self.elements.state(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logic_id_normalizes_hex() {
        let id = LogicId::new("0xABCDEF01").unwrap();
        assert_eq!(id.as_str(), "0xabcdef01");
        assert_eq!(id, "abcdef01".parse::<LogicId>().unwrap());
    }

    #[test]
    fn logic_id_rejects_invalid_hex() {
        for bad in ["0xnothex", "", "0x"] {
            let err = LogicId::new(bad).unwrap_err();
            assert_eq!(err.code(), moi_manifest::ErrorCode::InvalidArgument, "{bad}");
        }
    }
}
