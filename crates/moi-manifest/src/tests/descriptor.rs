use serde_json::json;

use super::{LEDGER, STORAGE, load};
use crate::{ElementDescriptor, ElementKind, ErrorCode, Manifest, StateMode};

#[test]
fn indexes_elements_by_name() {
    let manifest = load(LEDGER);
    let descriptor = ElementDescriptor::new(manifest.elements).expect("descriptor");

    let routine = descriptor.routine("BalanceOf").expect("routine");
    assert_eq!(routine.returns[0].label, "balance");
    assert_eq!(descriptor.event("Transfer").expect("event").topics, 2);
    assert_eq!(descriptor.element(3).expect("typedef").kind(), ElementKind::Typedef);

    let err = descriptor.routine("Transfer").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(descriptor.element(99).unwrap_err().code(), ErrorCode::NotFound);
}

#[test]
fn state_matrix_records_both_modes() {
    let descriptor = ElementDescriptor::new(load(LEDGER).elements).expect("descriptor");
    let matrix = descriptor.state_matrix();
    assert!(matrix.persistent());
    assert!(matrix.ephemeral());
    assert_eq!(matrix.get(StateMode::Persistent), Some(0));
    assert_eq!(matrix.get(StateMode::Ephemeral), Some(1));

    let (ptr, state) = descriptor.state(StateMode::Ephemeral).expect("ephemeral state");
    assert_eq!(ptr, 1);
    assert_eq!(state.fields[0].label, "spendable");

    let storage = ElementDescriptor::new(load(STORAGE).elements).expect("descriptor");
    assert!(!storage.state_matrix().ephemeral());
    assert!(storage.state(StateMode::Ephemeral).is_none());
}

#[test]
fn class_methods_are_grouped_by_class() {
    let descriptor = ElementDescriptor::new(load(STORAGE).elements).expect("descriptor");
    let methods = descriptor.class_methods("Person").expect("methods");
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name, "Person.Greet");
    assert!(descriptor.class_methods("Book").expect("no methods").is_empty());
    assert_eq!(
        descriptor.class_methods("Ghost").unwrap_err().code(),
        ErrorCode::NotFound
    );
    assert_eq!(
        descriptor.method("Person.Greet").expect("method").class,
        "Person"
    );
}

#[test]
fn rejects_duplicate_pointers_and_states() {
    let duplicate_ptr: Manifest = serde_json::from_value(json!({
        "syntax": 1,
        "engine": {"kind": "PISA", "flags": []},
        "elements": [
            {"ptr": 0, "kind": "typedef", "data": "u64"},
            {"ptr": 0, "kind": "typedef", "data": "string"}
        ]
    }))
    .expect("manifest");
    let err = ElementDescriptor::new(duplicate_ptr.elements).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let duplicate_state: Manifest = serde_json::from_value(json!({
        "syntax": 1,
        "engine": {"kind": "PISA", "flags": []},
        "elements": [
            {"ptr": 0, "kind": "state", "data": {"mode": "persistent", "fields": []}},
            {"ptr": 1, "kind": "state", "data": {"mode": "persistent", "fields": []}}
        ]
    }))
    .expect("manifest");
    assert!(ElementDescriptor::new(duplicate_state.elements).is_err());
}

#[test]
fn rejects_duplicate_class_names() {
    let manifest: Manifest = serde_json::from_value(json!({
        "syntax": 1,
        "engine": {"kind": "PISA", "flags": []},
        "elements": [
            {"ptr": 0, "kind": "class", "data": {"name": "Person", "fields": []}},
            {"ptr": 1, "kind": "class", "data": {
                "name": "Person",
                "fields": [{"slot": 0, "label": "age", "type": "u64"}]
            }}
        ]
    }))
    .expect("manifest");
    let err = ElementDescriptor::new(manifest.elements).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert!(err.to_string().contains("duplicate class name 'Person'"));
}

#[test]
fn unknown_element_kind_does_not_parse() {
    let result = serde_json::from_value::<Manifest>(json!({
        "syntax": 1,
        "engine": {"kind": "PISA"},
        "elements": [{"ptr": 0, "kind": "asset", "data": {}}]
    }));
    assert!(result.is_err());
}
