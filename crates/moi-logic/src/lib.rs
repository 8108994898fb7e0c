//! Storage slot derivation and state reads for deployed MOI logics.

mod accessor;
mod builder;
mod descriptor;
mod error;
mod state;
mod storage;

pub use accessor::{Accessor, AccessorChain, SlotHash};
pub use builder::{AccessorBuilder, EntityBuilder};
pub use descriptor::{LogicDescriptor, LogicId};
pub use error::LogicError;
pub use state::{EphemeralState, PersistentState};
pub use storage::{MemStorage, StorageReader};

#[cfg(test)]
mod tests;
