//! Manifest model, type grammar and schema compilation for MOI logics.

mod coder;
mod compiler;
mod config;
mod descriptor;
mod error;
pub mod grammar;
mod model;
pub mod schemas;

pub use coder::ManifestCoder;
pub use compiler::{SchemaCache, SchemaCompiler};
pub use config::CoderConfig;
pub use descriptor::{ContextStateMatrix, ElementDescriptor};
pub use error::{ErrorCode, ManifestError};
pub use grammar::{Classification, is_array, is_map, is_primitive_type};
pub use model::*;

#[cfg(test)]
mod tests;
