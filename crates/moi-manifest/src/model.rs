use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ManifestError;

pub type ElementPtr = u64;

/// Declarative description of a deployed logic: engine, state layout,
/// classes, routines and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub syntax: u64,
    pub engine: EngineConfig,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub elements: Vec<Element>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub ptr: ElementPtr,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deps: Vec<ElementPtr>,
    #[serde(flatten)]
    pub data: ElementData,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }
}

/// Kind-specific element payload, tagged by `kind` next to `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ElementData {
    Constant(Constant),
    Typedef(String),
    Class(ClassDef),
    State(StateDef),
    Routine(Routine),
    Method(Method),
    Event(Event),
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementData::Constant(_) => ElementKind::Constant,
            ElementData::Typedef(_) => ElementKind::Typedef,
            ElementData::Class(_) => ElementKind::Class,
            ElementData::State(_) => ElementKind::State,
            ElementData::Routine(_) => ElementKind::Routine,
            ElementData::Method(_) => ElementKind::Method,
            ElementData::Event(_) => ElementKind::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Constant,
    Typedef,
    Class,
    State,
    Routine,
    Method,
    Event,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Constant => "constant",
            ElementKind::Typedef => "typedef",
            ElementKind::Class => "class",
            ElementKind::State => "state",
            ElementKind::Routine => "routine",
            ElementKind::Method => "method",
            ElementKind::Event => "event",
        }
    }

    pub fn parse(kind: &str) -> Result<Self, ManifestError> {
        Ok(match kind {
            "constant" => ElementKind::Constant,
            "typedef" => ElementKind::Typedef,
            "class" => ElementKind::Class,
            "state" => ElementKind::State,
            "routine" => ElementKind::Routine,
            "method" => ElementKind::Method,
            "event" => ElementKind::Event,
            other => {
                return Err(ManifestError::UnsupportedOperation(format!(
                    "unsupported element kind '{other}'"
                )));
            }
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled, typed member of a class, state, routine or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeField {
    pub slot: u64,
    pub label: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypeField {
    pub fn new(slot: u64, label: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            slot,
            label: label.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodField {
    pub ptr: ElementPtr,
    pub code: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<TypeField>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub methods: Vec<MethodField>,
}

impl ClassDef {
    pub fn field(&self, label: &str) -> Option<&TypeField> {
        self.fields.iter().find(|field| field.label == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMode {
    Persistent,
    Ephemeral,
}

impl fmt::Display for StateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateMode::Persistent => f.write_str("persistent"),
            StateMode::Ephemeral => f.write_str("ephemeral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
    pub mode: StateMode,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<TypeField>,
}

impl StateDef {
    pub fn field(&self, label: &str) -> Option<&TypeField> {
        self.fields.iter().find(|field| field.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

/// Compiled code of a routine or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bin: Vec<u8>,
    #[serde(default)]
    pub hex: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub asm: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    pub mode: String,
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub accepts: Vec<TypeField>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub returns: Vec<TypeField>,
    #[serde(default)]
    pub executes: Instructions,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub catches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub accepts: Vec<TypeField>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub returns: Vec<TypeField>,
    #[serde(default)]
    pub executes: Instructions,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub catches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub topics: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<TypeField>,
}

/// Error raised by a routine call, as reported in a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub class: String,
    pub error: String,
    pub revert: bool,
    #[serde(default)]
    pub trace: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
