use std::sync::Arc;

use moi_manifest::{SchemaCompiler, StateMode, is_primitive_type};
use moi_polo::{Value, decode_hex, depolorize};
use tracing::debug;

use crate::{AccessorBuilder, EntityBuilder, LogicDescriptor, LogicError, SlotHash, StorageReader};

/// Reads primitive values out of a logic's persistent state.
#[derive(Clone)]
pub struct PersistentState {
    logic: Arc<LogicDescriptor>,
    storage: Arc<dyn StorageReader>,
}

impl PersistentState {
    pub fn new(logic: Arc<LogicDescriptor>, storage: Arc<dyn StorageReader>) -> Self {
        Self { logic, storage }
    }

    /// Reads the value at the path built by `path`, e.g.
    /// `state.get(|s| s.entity("balances").property(addr))`.
    pub async fn get<'s, F>(&'s self, path: F) -> Result<Value, LogicError>
    where
        F: FnOnce(EntityBuilder<'s>) -> AccessorBuilder<'s>,
    {
        let (ty, slot) = locate(&self.logic, StateMode::Persistent, path)?;
        debug!(logic = %self.logic.id(), %slot, ty = %ty, "reading persistent state");
        let raw = self
            .storage
            .get_storage_at(self.logic.id(), &slot.to_hex())
            .await
            .map_err(|source| LogicError::Storage {
                slot: slot.to_hex(),
                source,
            })?;
        decode_slot(&self.logic, &ty, &raw)
    }
}

/// Reads primitive values out of a participant's ephemeral state.
#[derive(Clone)]
pub struct EphemeralState {
    logic: Arc<LogicDescriptor>,
    storage: Arc<dyn StorageReader>,
}

impl EphemeralState {
    pub fn new(logic: Arc<LogicDescriptor>, storage: Arc<dyn StorageReader>) -> Self {
        Self { logic, storage }
    }

    pub async fn get<'s, F>(&'s self, address: &str, path: F) -> Result<Value, LogicError>
    where
        F: FnOnce(EntityBuilder<'s>) -> AccessorBuilder<'s>,
    {
        if decode_hex(address).map_or(true, |bytes| bytes.is_empty()) {
            return Err(LogicError::InvalidArgument(format!(
                "participant address '{address}' is not hex"
            )));
        }
        let (ty, slot) = locate(&self.logic, StateMode::Ephemeral, path)?;
        debug!(logic = %self.logic.id(), address, %slot, ty = %ty, "reading ephemeral state");
        let raw = self
            .storage
            .get_ephemeral_storage_at(address, self.logic.id(), &slot.to_hex())
            .await
            .map_err(|source| LogicError::Storage {
                slot: slot.to_hex(),
                source,
            })?;
        decode_slot(&self.logic, &ty, &raw)
    }
}

/// Builds the path against the state element of `mode` and returns the
/// terminal type with its slot. Only primitive terminals can be read.
fn locate<'s, F>(
    logic: &'s LogicDescriptor,
    mode: StateMode,
    path: F,
) -> Result<(String, SlotHash), LogicError>
where
    F: FnOnce(EntityBuilder<'s>) -> AccessorBuilder<'s>,
{
    let (_, state) = logic.state(mode).ok_or(LogicError::NotInitialized(mode))?;
    let builder = path(EntityBuilder::new(logic.elements(), state));
    let ty = builder.storage_type().to_string();
    let slot = builder.resolve()?;
    if !is_primitive_type(&ty) {
        return Err(LogicError::UnsupportedOperation(format!(
            "cannot read '{ty}' directly; read its primitive members instead"
        )));
    }
    Ok((ty, slot))
}

/// Decodes a slot's bytes; an unset slot yields the type's zero value.
fn decode_slot(logic: &LogicDescriptor, ty: &str, raw: &[u8]) -> Result<Value, LogicError> {
    let schema = SchemaCompiler::new(logic.elements()).compile(ty)?;
    if raw.is_empty() {
        return Ok(schema.zero_value());
    }
    Ok(depolorize(raw, &schema)?)
}
