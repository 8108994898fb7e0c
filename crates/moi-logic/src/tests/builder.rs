use moi_manifest::ErrorCode;
use moi_polo::Value;

use super::{LEDGER, STORAGE, elements, path};
use crate::{Accessor, SlotHash};

#[test]
fn entity_anchors_at_field_slot() {
    let ledger = elements(LEDGER);
    let supply = path(&ledger, |s| s.entity("supply"));
    assert_eq!(supply.storage_type(), "u256");
    assert_eq!(supply.resolve().unwrap(), SlotHash::from(1));
}

#[test]
fn unknown_entity_is_not_defined() {
    let ledger = elements(LEDGER);
    let err = path(&ledger, |s| s.entity("owner").length())
        .resolve()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PropertyNotDefined);
}

#[test]
fn map_entry_by_address_key() {
    let ledger = elements(LEDGER);
    let balance = path(&ledger, |s| s.entity("balances").property(vec![0xab; 32]));
    assert_eq!(balance.storage_type(), "u256");
    assert_eq!(
        balance.resolve().unwrap().to_hex(),
        "0x8cd67a4282bee2901db9b1f020be0191171c2a7e629744626648cc153898df0b"
    );
}

#[test]
fn class_field_uses_declared_slot() {
    let storage = elements(STORAGE);
    let age = path(&storage, |s| s.entity("value2").field("age"));
    assert_eq!(age.storage_type(), "u64");
    assert_eq!(
        age.resolve().unwrap().to_hex(),
        "0x33e423980c9b37d048bd5fadbd4a2aeb95146922045405accc2f468d0ef96989"
    );
}

#[test]
fn class_inside_map() {
    let storage = elements(STORAGE);
    let age = path(&storage, |s| s.entity("value3").property("alice").field("age"));
    let name = path(&storage, |s| s.entity("value3").property("alice").field("name"));
    assert_eq!(name.storage_type(), "string");
    assert_eq!(
        age.resolve().unwrap().to_hex(),
        "0xb9fb7c31cabb703fdd3a7e9e7aea7cdd713cc06a8aaf31f0a6668d2db57b37bd"
    );
    assert_eq!(
        name.resolve().unwrap().to_hex(),
        "0xb9fb7c31cabb703fdd3a7e9e7aea7cdd713cc06a8aaf31f0a6668d2db57b37bc"
    );
}

#[test]
fn nested_arrays_inside_class_array() {
    let storage = elements(STORAGE);
    let chapter = path(&storage, |s| {
        s.entity("value4").at(0).field("chapters").at(1).at(2)
    });
    assert_eq!(chapter.storage_type(), "u64");
    let chain = path(&storage, |s| {
        s.entity("value4").at(0).field("chapters").at(1).at(2)
    })
    .generate()
    .unwrap();
    assert_eq!(
        chain.accessors(),
        &[
            Accessor::ArrayIndex(0),
            Accessor::ClassField(1),
            Accessor::ArrayIndex(1),
            Accessor::ArrayIndex(2),
        ]
    );
    assert_eq!(
        chapter.resolve().unwrap().to_hex(),
        "0x4a38b3ca5d1f43dc5ff40b2832b53e1a6eda4201569caf05f0e8aeb35d170db3"
    );
    let title = path(&storage, |s| s.entity("value4").at(0).field("title"));
    assert_eq!(
        title.resolve().unwrap().to_hex(),
        "0x1539892bc442d3db62b556863511630e595ac4d5833ea485bca9fb12272ae093"
    );
}

#[test]
fn length_reads_collection_slot() {
    let storage = elements(STORAGE);
    let len = path(&storage, |s| s.entity("value4").length());
    assert_eq!(len.storage_type(), "u64");
    assert_eq!(len.resolve().unwrap(), SlotHash::from(3));

    let inner = path(&storage, |s| s.entity("value1").property("x").length());
    assert_eq!(
        inner.resolve().unwrap().to_hex(),
        "0x5b66f00e92e61ac3fc8fc281578b877d53860506a14948b5bf9a46b5ca7f1b95"
    );
    let flag = path(&storage, |s| s.entity("value1").property("x").at(3));
    assert_eq!(flag.storage_type(), "bool");
    assert_eq!(
        flag.resolve().unwrap().to_hex(),
        "0x362c4b889538ead7a7fe1f139c410222a045aaeed4c6a80be992c634d3308619"
    );
}

#[test]
fn non_string_map_keys() {
    let storage = elements(STORAGE);
    let by_int = path(&storage, |s| s.entity("value5").property(7u64));
    assert_eq!(by_int.storage_type(), "string");
    assert_eq!(
        by_int.resolve().unwrap().to_hex(),
        "0x763f347656ca440fd72ede873edb37038f3d5bbf5d14ab649ccb6b7fe0dfd139"
    );
    let by_bytes = path(&storage, |s| s.entity("value6").property(vec![0x01, 0x02]));
    assert_eq!(by_bytes.storage_type(), "bool");
    assert_eq!(
        by_bytes.resolve().unwrap().to_hex(),
        "0x99b4c4f0da4be6a48359e239dd0a5203418ffa5e8c771d7f059c96a773f46daa"
    );
}

#[test]
fn operations_are_checked_against_the_current_type() {
    let ledger = elements(LEDGER);
    let cases = [
        path(&ledger, |s| s.entity("supply").at(0)),
        path(&ledger, |s| s.entity("supply").length()),
        path(&ledger, |s| s.entity("symbol").property("a")),
        path(&ledger, |s| s.entity("balances").field("x")),
    ];
    for builder in cases {
        assert_eq!(builder.resolve().unwrap_err().code(), ErrorCode::UnsupportedOperation);
    }
}

#[test]
fn first_failure_is_kept() {
    let storage = elements(STORAGE);
    let err = path(&storage, |s| s.entity("value2").at(1).field("nope"))
        .resolve()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedOperation);

    let err = path(&storage, |s| s.entity("value2").field("height").at(0))
        .resolve()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PropertyNotDefined);
}

#[test]
fn composite_map_keys_are_rejected() {
    let storage = elements(STORAGE);
    let err = path(&storage, |s| {
        s.entity("value3").property(Value::array(["a", "b"]))
    })
    .resolve()
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}
