//! Static codec schemas for manifest element payloads. Source of truth lives
//! under `spec/schemas/`.

use std::collections::HashMap;

use moi_polo::Schema;
use once_cell::sync::Lazy;

use crate::ElementKind;

pub const ELEMENTS: &str = include_str!("../../../spec/schemas/elements.schema.json");

static ELEMENT_SCHEMAS: Lazy<HashMap<String, Schema>> = Lazy::new(|| {
    serde_json::from_str(ELEMENTS).expect("spec/schemas/elements.schema.json must parse")
});

fn named(name: &str) -> &'static Schema {
    ELEMENT_SCHEMAS
        .get(name)
        .unwrap_or_else(|| panic!("spec/schemas/elements.schema.json must define '{name}'"))
}

pub fn engine() -> &'static Schema {
    named("engine")
}

pub fn deps() -> &'static Schema {
    named("deps")
}

pub fn exception() -> &'static Schema {
    named("exception")
}

/// Payload schema of an element kind.
pub fn element(kind: ElementKind) -> &'static Schema {
    named(kind.as_str())
}
