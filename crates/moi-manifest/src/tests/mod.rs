use crate::{Manifest, ManifestCoder};

mod descriptor;

pub(crate) const LEDGER: &str = include_str!("../../../../spec/manifests/ledger.json");
pub(crate) const STORAGE: &str = include_str!("../../../../spec/manifests/storage.json");
pub(crate) const RECURSIVE: &str = include_str!("../../../../spec/manifests/recursive.json");

pub(crate) fn load(json: &str) -> Manifest {
    Manifest::from_json(json).expect("fixture manifest must parse")
}

pub(crate) fn coder(json: &str) -> ManifestCoder {
    ManifestCoder::new(&load(json)).expect("fixture manifest must index")
}
