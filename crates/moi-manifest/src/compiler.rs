use std::collections::HashMap;
use std::sync::RwLock;

use moi_polo::{Schema, SchemaResolver};
use tracing::trace;

use crate::{
    ElementDescriptor, ManifestError, TypeField,
    grammar::{Classification, classify, convert_primitive},
};

/// Compiled schemas keyed by type descriptor.
pub type SchemaCache = RwLock<HashMap<String, Schema>>;

/// Turns type descriptors into codec schemas against a manifest's classes.
///
/// Class expansion keeps a stack of the classes being expanded; reaching a
/// class already on the stack yields [`Schema::Ref`], which the codec expands
/// on demand through the [`SchemaResolver`] impl below.
#[derive(Clone, Copy)]
pub struct SchemaCompiler<'a> {
    descriptor: &'a ElementDescriptor,
    cache: Option<&'a SchemaCache>,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(descriptor: &'a ElementDescriptor) -> Self {
        Self {
            descriptor,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a SchemaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn compile(&self, ty: &str) -> Result<Schema, ManifestError> {
        let Some(cache) = self.cache else {
            return self.compile_type(ty, &mut Vec::new());
        };
        if let Some(schema) = cache.read().ok().and_then(|c| c.get(ty).cloned()) {
            trace!(ty, "schema cache hit");
            return Ok(schema);
        }
        trace!(ty, "schema cache miss");
        let schema = self.compile_type(ty, &mut Vec::new())?;
        if let Ok(mut guard) = cache.write() {
            guard.insert(ty.to_string(), schema.clone());
        }
        Ok(schema)
    }

    /// Wraps a flat field list into one struct schema, one entry per label.
    pub fn compile_fields(&self, fields: &[TypeField]) -> Result<Schema, ManifestError> {
        let mut compiled = indexmap::IndexMap::with_capacity(fields.len());
        for field in fields {
            if field.label.is_empty() || field.ty.is_empty() {
                return Err(ManifestError::InvalidArgument(format!(
                    "field at slot {} must have a label and a type",
                    field.slot
                )));
            }
            compiled.insert(field.label.clone(), self.compile(&field.ty)?);
        }
        Ok(Schema::Struct(compiled))
    }

    fn compile_type(&self, ty: &str, expanding: &mut Vec<String>) -> Result<Schema, ManifestError> {
        match classify(ty, |name| self.descriptor.has_class(name))? {
            Classification::Primitive(primitive) => convert_primitive(&primitive),
            Classification::Array { element, .. } => {
                Ok(Schema::array(self.compile_type(&element, expanding)?))
            }
            Classification::Map { key, value } => Ok(Schema::map(
                self.compile_type(&key, expanding)?,
                self.compile_type(&value, expanding)?,
            )),
            Classification::Class(name) => self.compile_class(&name, expanding),
        }
    }

    fn compile_class(&self, name: &str, expanding: &mut Vec<String>) -> Result<Schema, ManifestError> {
        if expanding.iter().any(|open| open == name) {
            return Ok(Schema::Ref(name.to_string()));
        }
        let class = self.descriptor.class(name)?;
        expanding.push(name.to_string());
        let fields = class
            .fields
            .iter()
            .map(|field| Ok((field.label.clone(), self.compile_type(&field.ty, expanding)?)))
            .collect::<Result<indexmap::IndexMap<_, _>, ManifestError>>();
        expanding.pop();
        Ok(Schema::Struct(fields?))
    }
}

impl SchemaResolver for SchemaCompiler<'_> {
    fn resolve(&self, name: &str) -> Option<Schema> {
        self.compile_class(name, &mut Vec::new()).ok()
    }
}
