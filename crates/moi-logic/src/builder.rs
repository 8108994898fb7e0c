use moi_manifest::{
    ElementDescriptor, StateDef,
    grammar::{Classification, classify},
};
use moi_polo::Value;

use crate::{Accessor, AccessorChain, LogicError, SlotHash};

/// Entry point of a storage path: picks a field of a state element.
#[derive(Debug, Clone, Copy)]
pub struct EntityBuilder<'a> {
    elements: &'a ElementDescriptor,
    state: &'a StateDef,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(elements: &'a ElementDescriptor, state: &'a StateDef) -> Self {
        Self { elements, state }
    }

    /// Starts a path at the state field `label`, anchored at its slot.
    pub fn entity(self, label: &str) -> AccessorBuilder<'a> {
        match self.state.field(label) {
            Some(field) => AccessorBuilder {
                elements: self.elements,
                base: SlotHash::from(field.slot),
                ty: field.ty.clone(),
                chain: AccessorChain::new(),
                error: None,
            },
            None => AccessorBuilder {
                elements: self.elements,
                base: SlotHash::from(0),
                ty: String::new(),
                chain: AccessorChain::new(),
                error: Some(LogicError::PropertyNotDefined(format!(
                    "'{label}' is not a member of {} state",
                    self.state.mode
                ))),
            },
        }
    }
}

/// Fluent path into a state field.
///
/// Each step checks the type reached so far and records the accessor. The
/// first failing step is kept and reported by [`AccessorBuilder::generate`]
/// or [`AccessorBuilder::resolve`]; later steps are ignored.
#[derive(Debug)]
pub struct AccessorBuilder<'a> {
    elements: &'a ElementDescriptor,
    base: SlotHash,
    ty: String,
    chain: AccessorChain,
    error: Option<LogicError>,
}

impl AccessorBuilder<'_> {
    /// Length of the array or map reached so far.
    pub fn length(self) -> Self {
        self.step("length", |ty, _| match ty {
            Classification::Array { .. } | Classification::Map { .. } => {
                Some(Ok((Accessor::Length, "u64".to_string())))
            }
            _ => None,
        })
    }

    /// Entry of the map reached so far.
    pub fn property(self, key: impl Into<Value>) -> Self {
        let key = key.into();
        self.step("property", |ty, _| match ty {
            Classification::Map { value, .. } => {
                Some(Accessor::property(&key).map(|accessor| (accessor, value)))
            }
            _ => None,
        })
    }

    /// Element `index` of the array reached so far.
    pub fn at(self, index: u64) -> Self {
        self.step("index", |ty, _| match ty {
            Classification::Array { element, .. } => {
                Some(Ok((Accessor::ArrayIndex(index), element)))
            }
            _ => None,
        })
    }

    /// Member `label` of the class reached so far.
    pub fn field(self, label: &str) -> Self {
        self.step("field", |ty, elements| match ty {
            Classification::Class(name) => Some(class_field(elements, &name, label)),
            _ => None,
        })
    }

    /// Type descriptor of the value the path points at.
    pub fn storage_type(&self) -> &str {
        &self.ty
    }

    pub fn generate(self) -> Result<AccessorChain, LogicError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.chain),
        }
    }

    /// Folds the accessors over the base slot.
    pub fn resolve(self) -> Result<SlotHash, LogicError> {
        let base = self.base.clone();
        Ok(self.generate()?.resolve(base))
    }

    /// Applies one step; `apply` yields `None` when the current type does
    /// not support the operation.
    fn step<F>(mut self, op: &str, apply: F) -> Self
    where
        F: FnOnce(Classification, &ElementDescriptor) -> Option<Result<(Accessor, String), LogicError>>,
    {
        if self.error.is_some() {
            return self;
        }
        let outcome = match classify(&self.ty, |name| self.elements.has_class(name)) {
            Ok(classification) => apply(classification, self.elements),
            Err(err) => Some(Err(err.into())),
        };
        match outcome {
            Some(Ok((accessor, ty))) => {
                self.chain.push(accessor);
                self.ty = ty;
            }
            Some(Err(err)) => self.error = Some(err),
            None => {
                self.error = Some(LogicError::UnsupportedOperation(format!(
                    "{op} access on type '{}'",
                    self.ty
                )));
            }
        }
        self
    }
}

fn class_field(
    elements: &ElementDescriptor,
    class: &str,
    label: &str,
) -> Result<(Accessor, String), LogicError> {
    let field = elements.class(class)?.field(label).ok_or_else(|| {
        LogicError::PropertyNotDefined(format!("'{label}' is not a member of class '{class}'"))
    })?;
    Ok((Accessor::ClassField(field.slot), field.ty.clone()))
}
