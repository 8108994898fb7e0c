use std::collections::HashMap;
use std::sync::RwLock;

use indexmap::IndexMap;
use moi_polo::{
    Depolorizer, NoRefs, Polorizer, Schema, SchemaResolver, Value, decode_hex, depolorize,
    depolorize_with, document_encode_with, encode_to_string,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::{
    CoderConfig, Element, ElementData, ElementDescriptor, ElementKind, EngineConfig, Exception,
    Manifest, ManifestError, SchemaCompiler, TypeField, compiler::SchemaCache, schemas,
};

/// Encodes and decodes manifests, call arguments, outputs, events and state
/// values for one manifest.
///
/// Holds only immutable lookup tables and an optional schema cache, so a
/// single coder can be shared between concurrent callers.
#[derive(Debug)]
pub struct ManifestCoder {
    descriptor: ElementDescriptor,
    cache: Option<SchemaCache>,
}

impl ManifestCoder {
    pub fn new(manifest: &Manifest) -> Result<Self, ManifestError> {
        Self::with_config(manifest, &CoderConfig::default())
    }

    pub fn with_config(manifest: &Manifest, config: &CoderConfig) -> Result<Self, ManifestError> {
        let descriptor = ElementDescriptor::new(manifest.elements.iter().cloned())?;
        Ok(Self::from_descriptor(descriptor, config))
    }

    pub fn from_descriptor(descriptor: ElementDescriptor, config: &CoderConfig) -> Self {
        Self {
            descriptor,
            cache: config
                .cache_schemas
                .then(|| RwLock::new(HashMap::new())),
        }
    }

    pub fn descriptor(&self) -> &ElementDescriptor {
        &self.descriptor
    }

    pub fn compiler(&self) -> SchemaCompiler<'_> {
        let compiler = SchemaCompiler::new(&self.descriptor);
        match &self.cache {
            Some(cache) => compiler.with_cache(cache),
            None => compiler,
        }
    }

    /// Serializes a manifest as `0x`-prefixed hex: syntax, engine, then a pack
    /// of `[ptr, deps, kind, payload]` element packs.
    pub fn encode_manifest(manifest: &Manifest) -> Result<String, ManifestError> {
        debug!(elements = manifest.elements.len(), "encoding manifest");
        let mut polorizer = Polorizer::new();
        polorizer.polorize_integer(manifest.syntax);
        polorizer.polorize(&to_value(&manifest.engine, schemas::engine())?, schemas::engine())?;

        let mut elements = Polorizer::new();
        for element in &manifest.elements {
            let mut entry = Polorizer::new();
            entry.polorize_integer(element.ptr);
            entry.polorize(&to_value(&element.deps, schemas::deps())?, schemas::deps())?;
            entry.polorize_string(element.kind().as_str());
            let schema = schemas::element(element.kind());
            let payload = Value::from_json(&payload_json(&element.data)?, schema, &NoRefs)?;
            entry.polorize(&payload, schema)?;
            elements.polorize_packed(&entry);
        }
        polorizer.polorize_packed(&elements);

        Ok(encode_to_string(polorizer.bytes()))
    }

    /// Inverse of [`ManifestCoder::encode_manifest`]; accepts raw bytes.
    pub fn decode_manifest(bytes: &[u8]) -> Result<Manifest, ManifestError> {
        let mut reader = Depolorizer::new(bytes)?;
        let syntax = read_u64(&mut reader, "syntax")?;
        let engine: EngineConfig = from_value(reader.depolorize(schemas::engine())?)?;

        let mut elements = Vec::new();
        if !reader.is_done() {
            let mut list = reader.depolorize_packed()?;
            while !list.is_done() {
                let mut entry = list.depolorize_packed()?;
                let ptr = read_u64(&mut entry, "element pointer")?;
                let deps: Vec<u64> = from_value(entry.depolorize(schemas::deps())?)?;
                let kind = ElementKind::parse(&entry.depolorize_string()?)?;
                let payload = entry.depolorize(schemas::element(kind))?;
                elements.push(Element {
                    ptr,
                    deps,
                    data: payload_from_value(kind, payload)?,
                });
            }
        }
        debug!(elements = elements.len(), "decoded manifest");

        Ok(Manifest {
            syntax,
            engine,
            elements,
        })
    }

    /// Like [`ManifestCoder::decode_manifest`], from `0x`-prefixed hex.
    pub fn decode_manifest_hex(encoded: &str) -> Result<Manifest, ManifestError> {
        Self::decode_manifest(&decode_hex(encoded)?)
    }

    /// Encodes `args` positionally against `fields` as a document.
    pub fn encode_arguments(&self, fields: &[TypeField], args: &[Value]) -> Result<Vec<u8>, ManifestError> {
        if fields.len() != args.len() {
            return Err(ManifestError::MissingArgument {
                expected: fields.len(),
                got: args.len(),
            });
        }
        let compiler = self.compiler();
        let schema = compiler.compile_fields(fields)?;
        let mut calldata = IndexMap::with_capacity(fields.len());
        for (field, arg) in fields.iter().zip(args) {
            let field_schema = schema
                .field(&field.label)
                .ok_or_else(|| ManifestError::not_found("field", &field.label))?;
            calldata.insert(field.label.clone(), coerce(arg, field_schema, &compiler)?);
        }
        Ok(document_encode_with(&Value::Struct(calldata), &schema, &compiler)?)
    }

    /// Encodes the arguments of the routine `name` as `0x`-prefixed hex.
    pub fn encode_routine_arguments(&self, name: &str, args: &[Value]) -> Result<String, ManifestError> {
        let routine = self.descriptor.routine(name)?;
        Ok(encode_to_string(self.encode_arguments(&routine.accepts, args)?))
    }

    /// Decodes calldata of the routine `name` into its arguments in declared
    /// order; `None` when the routine accepts nothing.
    pub fn decode_arguments(&self, name: &str, calldata: &[u8]) -> Result<Option<Vec<Value>>, ManifestError> {
        let routine = self.descriptor.routine(name)?;
        if routine.accepts.is_empty() {
            return Ok(None);
        }
        let compiler = self.compiler();
        let schema = compiler.compile_fields(&routine.accepts)?;
        let decoded = depolorize_with(calldata, &schema, &compiler)?;
        Ok(Some(
            routine
                .accepts
                .iter()
                .map(|field| decoded.get(&field.label).cloned().unwrap_or(Value::Null))
                .collect(),
        ))
    }

    /// Decodes output against `fields`; `None` for empty output.
    pub fn decode_output(&self, output: &[u8], fields: &[TypeField]) -> Result<Option<Value>, ManifestError> {
        if output.is_empty() || fields.is_empty() {
            return Ok(None);
        }
        let compiler = self.compiler();
        let schema = compiler.compile_fields(fields)?;
        Ok(Some(depolorize_with(output, &schema, &compiler)?))
    }

    pub fn decode_routine_output(&self, name: &str, output: &[u8]) -> Result<Option<Value>, ManifestError> {
        let routine = self.descriptor.routine(name)?;
        self.decode_output(output, &routine.returns)
    }

    /// Decodes the log data of the event `name`; `None` for empty data.
    pub fn decode_event_output(&self, name: &str, data: &[u8]) -> Result<Option<Value>, ManifestError> {
        let event = self.descriptor.event(name)?;
        self.decode_output(data, &event.fields)
    }

    /// Decodes an exception raised by a routine call; `None` for empty input.
    pub fn decode_exception(error: &[u8]) -> Result<Option<Exception>, ManifestError> {
        if error.is_empty() {
            return Ok(None);
        }
        let value = depolorize(error, schemas::exception())?;
        Ok(Some(from_value(value)?))
    }

    /// Decodes `data` as the struct described by `fields` and projects out `label`.
    pub fn decode_state(
        &self,
        data: &[u8],
        label: &str,
        fields: &[TypeField],
    ) -> Result<Option<Value>, ManifestError> {
        if data.is_empty() {
            return Ok(None);
        }
        if !fields.iter().any(|field| field.label == label) {
            return Err(ManifestError::not_found("state field", label));
        }
        let compiler = self.compiler();
        let schema = compiler.compile_fields(fields)?;
        let decoded = depolorize_with(data, &schema, &compiler)?;
        Ok(decoded.get(label).cloned())
    }

    /// Decodes a single value of type descriptor `ty`.
    pub fn decode_value(&self, ty: &str, data: &[u8]) -> Result<Value, ManifestError> {
        let compiler = self.compiler();
        let schema = compiler.compile(ty)?;
        Ok(depolorize_with(data, &schema, &compiler)?)
    }
}

/// Applies argument conversions the codec does not: `0x`-hex strings given
/// where bytes are expected become bytes.
fn coerce(value: &Value, schema: &Schema, resolver: &dyn SchemaResolver) -> Result<Value, ManifestError> {
    Ok(match (schema, value) {
        (Schema::Ref(name), _) => match resolver.resolve(name) {
            Some(resolved) => coerce(value, &resolved, resolver)?,
            None => value.clone(),
        },
        (Schema::Bytes, Value::String(s)) => Value::Bytes(decode_hex(s)?),
        (Schema::Array(inner), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| coerce(item, inner, resolver))
                .collect::<Result<_, _>>()?,
        ),
        (Schema::Map { keys, values }, Value::Map(entries)) => Value::map(
            entries
                .iter()
                .map(|(k, v)| Ok((coerce(k, keys, resolver)?, coerce(v, values, resolver)?)))
                .collect::<Result<Vec<_>, ManifestError>>()?,
        ),
        (Schema::Struct(fields), Value::Struct(object)) => Value::Struct(
            object
                .iter()
                .map(|(label, v)| {
                    let v = match fields.get(label) {
                        Some(field) => coerce(v, field, resolver)?,
                        None => v.clone(),
                    };
                    Ok((label.clone(), v))
                })
                .collect::<Result<_, ManifestError>>()?,
        ),
        _ => value.clone(),
    })
}

fn read_u64(reader: &mut Depolorizer, what: &str) -> Result<u64, ManifestError> {
    reader
        .depolorize(&Schema::Integer)?
        .as_u64()
        .ok_or_else(|| ManifestError::InvalidArgument(format!("{what} does not fit in u64")))
}

fn to_value<T: serde::Serialize>(item: &T, schema: &Schema) -> Result<Value, ManifestError> {
    Ok(Value::from_json(&serde_json::to_value(item)?, schema, &NoRefs)?)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ManifestError> {
    Ok(serde_json::from_value(value.to_json())?)
}

fn payload_json(data: &ElementData) -> Result<JsonValue, serde_json::Error> {
    match data {
        ElementData::Constant(constant) => serde_json::to_value(constant),
        ElementData::Typedef(ty) => serde_json::to_value(ty),
        ElementData::Class(class) => serde_json::to_value(class),
        ElementData::State(state) => serde_json::to_value(state),
        ElementData::Routine(routine) => serde_json::to_value(routine),
        ElementData::Method(method) => serde_json::to_value(method),
        ElementData::Event(event) => serde_json::to_value(event),
    }
}

fn payload_from_value(kind: ElementKind, payload: Value) -> Result<ElementData, ManifestError> {
    Ok(match kind {
        ElementKind::Constant => ElementData::Constant(from_value(payload)?),
        ElementKind::Typedef => ElementData::Typedef(from_value(payload)?),
        ElementKind::Class => ElementData::Class(from_value(payload)?),
        ElementKind::State => ElementData::State(from_value(payload)?),
        ElementKind::Routine => ElementData::Routine(from_value(payload)?),
        ElementKind::Method => ElementData::Method(from_value(payload)?),
        ElementKind::Event => ElementData::Event(from_value(payload)?),
    })
}
