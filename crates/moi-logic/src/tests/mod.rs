use moi_manifest::{ElementDescriptor, Manifest, StateMode};

use crate::{AccessorBuilder, EntityBuilder};

mod builder;

pub(crate) const LEDGER: &str = include_str!("../../../../spec/manifests/ledger.json");
pub(crate) const STORAGE: &str = include_str!("../../../../spec/manifests/storage.json");

pub(crate) fn elements(json: &str) -> ElementDescriptor {
    let manifest = Manifest::from_json(json).expect("fixture manifest must parse");
    ElementDescriptor::new(manifest.elements).expect("fixture manifest must index")
}

/// Builds a persistent-state path against `elements`.
pub(crate) fn path<'a>(
    elements: &'a ElementDescriptor,
    build: impl FnOnce(EntityBuilder<'a>) -> AccessorBuilder<'a>,
) -> AccessorBuilder<'a> {
    let (_, state) = elements
        .state(StateMode::Persistent)
        .expect("fixture declares persistent state");
    build(EntityBuilder::new(elements, state))
}
