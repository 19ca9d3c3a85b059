use serde_json::json;
use statecast::{
    BufferError, FieldSchema, Path, Scalar, Schema, StateError, StateTree, WireType, Writer,
};

fn two_uints() -> Schema {
    Schema::structure([
        FieldSchema::new(1, "a", Schema::Uint),
        FieldSchema::new(2, "b", Schema::Uint),
    ])
}

fn inventory() -> Schema {
    Schema::structure([
        FieldSchema::new(1, "hp", Schema::Uint),
        FieldSchema::new(2, "items", Schema::list(Schema::String)),
        FieldSchema::new(3, "bag", Schema::map(Schema::Int)),
    ])
}

fn inventory_bytes() -> Vec<u8> {
    let mut items = Writer::new();
    items.key(1, WireType::Sized);
    items.sized(b"a");
    items.key(2, WireType::Sized);
    items.sized(b"bc");

    let mut bag = Writer::new();
    bag.key(5, WireType::Varint);
    Scalar::Int(-2).encode(&mut bag);

    let mut writer = Writer::new();
    writer.key(1, WireType::Varint);
    writer.varint32(7);
    writer.key(2, WireType::Sized);
    writer.sized(&items.flush());
    writer.key(3, WireType::Sized);
    writer.sized(&bag.flush());
    writer.flush()
}

#[test]
fn flat_struct_snapshot() {
    let tree = StateTree::deserialize(two_uints(), &[0x08, 0x01, 0x10, 0x02]).unwrap();
    assert_eq!(tree.view(), json!({"a": 1, "b": 2}));
    let record = tree.root().as_struct().unwrap();
    assert_eq!(record.field("b").unwrap().scalar(), Some(&Scalar::Uint(2)));
    assert_eq!(record.field("b").unwrap().path(), &Path::from([2]));
}

#[test]
fn same_bytes_as_a_list() {
    let tree = StateTree::deserialize(Schema::list(Schema::Uint), &[0x08, 0x01, 0x10, 0x02]).unwrap();
    assert_eq!(tree.view(), json!([1, 2]));
    let list = tree.root().as_list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.items()[1].path(), &Path::from([1]));
}

#[test]
fn nested_containers() {
    let tree = StateTree::deserialize(inventory(), &inventory_bytes()).unwrap();
    assert_eq!(
        tree.view(),
        json!({"hp": 7, "items": ["a", "bc"], "bag": {"5": -2}})
    );
    assert_eq!(tree.resolve(&[2, 1]).unwrap().path(), &Path::from([2, 1]));
    assert_eq!(
        tree.resolve(&[3, 5]).unwrap().scalar(),
        Some(&Scalar::Int(-2))
    );
}

#[test]
fn encode_reproduces_snapshot() {
    let bytes = inventory_bytes();
    let tree = StateTree::deserialize(inventory(), &bytes).unwrap();
    assert_eq!(tree.encode(), bytes);

    let list = StateTree::deserialize(Schema::list(Schema::Uint), &[0x08, 0x01, 0x10, 0x02]).unwrap();
    assert_eq!(list.encode(), vec![0x08, 0x01, 0x10, 0x02]);
}

#[test]
fn unknown_fields_are_skipped() {
    let mut writer = Writer::new();
    writer.key(9, WireType::Fixed64);
    writer.fixed64(0xdead_beef);
    writer.key(4, WireType::Sized);
    writer.sized(&[1, 2, 3]);
    writer.key(1, WireType::Varint);
    writer.varint32(5);
    let bytes = writer.flush();

    let schema = Schema::structure([FieldSchema::new(1, "a", Schema::Uint)]);
    let tree = StateTree::deserialize(schema, &bytes).unwrap();
    assert_eq!(tree.view(), json!({"a": 5}));
}

#[test]
fn missing_fields_keep_defaults() {
    let schema = Schema::structure([
        FieldSchema::new(1, "a", Schema::Uint),
        FieldSchema::new(2, "name", Schema::String),
        FieldSchema::new(3, "tags", Schema::list(Schema::Bool)),
    ]);
    let tree = StateTree::deserialize(schema, &[]).unwrap();
    assert_eq!(tree.view(), json!({"a": 0, "name": "", "tags": []}));
}

#[test]
fn truncated_nested_value_aborts_decode() {
    let schema = Schema::structure([FieldSchema::new(2, "xs", Schema::list(Schema::Uint))]);
    let err = StateTree::deserialize(schema, &[0x12, 0x05, 0x08, 0x01]).unwrap_err();
    assert_eq!(err, StateError::Buffer(BufferError::UnexpectedEof));
}

#[test]
fn malformed_input_errors() {
    let list = Schema::list(Schema::Uint);
    assert_eq!(
        StateTree::deserialize(list.clone(), &[0x08, 0x80]).unwrap_err(),
        StateError::Buffer(BufferError::MalformedVarint)
    );
    assert_eq!(
        StateTree::deserialize(list.clone(), &[0x0b]).unwrap_err(),
        StateError::Buffer(BufferError::UnknownWireType(3))
    );
    assert_eq!(
        StateTree::deserialize(list, &[0x08]).unwrap_err(),
        StateError::Buffer(BufferError::UnexpectedEof)
    );
}

#[test]
fn wire_type_must_match_schema() {
    let schema = Schema::structure([FieldSchema::new(1, "xs", Schema::list(Schema::Uint))]);
    let err = StateTree::deserialize(schema, &[0x08, 0x01]).unwrap_err();
    assert_eq!(
        err,
        StateError::WireTypeMismatch {
            path: Path::from([1]),
            expected: WireType::Sized,
            actual: WireType::Varint,
        }
    );
}

#[test]
fn root_must_be_a_container() {
    assert!(matches!(
        StateTree::deserialize(Schema::Uint, &[0x01]),
        Err(StateError::TypeMismatch { kind: "uint", .. })
    ));
    assert!(matches!(
        StateTree::new(Schema::String),
        Err(StateError::TypeMismatch { .. })
    ));
}

#[test]
fn leaves_have_no_nested_state() {
    let tree = StateTree::deserialize(two_uints(), &[0x08, 0x01]).unwrap();
    let leaf = tree.resolve(&[1]).unwrap();
    assert_eq!(
        leaf.get_nested(0).unwrap_err(),
        StateError::TypeMismatch {
            path: Path::from([1]),
            kind: "leaf",
        }
    );
    assert_eq!(
        tree.resolve(&[1, 0]).unwrap_err(),
        StateError::TypeMismatch {
            path: Path::from([1]),
            kind: "leaf",
        }
    );
    assert_eq!(
        tree.resolve(&[7]).unwrap_err(),
        StateError::PathNotFound(Path::from([7]))
    );
}

#[test]
fn schema_loaded_from_json() {
    let schema = Schema::from_json_str(
        r#"{"kind": "struct", "fields": [
            {"tag": 1, "name": "score", "schema": {"kind": "float"}},
            {"tag": 2, "name": "names", "schema": {"kind": "map", "values": {"kind": "string"}}}
        ]}"#,
    )
    .unwrap();

    let mut names = Writer::new();
    names.key(3, WireType::Sized);
    names.sized(b"ann");
    let mut writer = Writer::new();
    writer.key(1, WireType::Fixed64);
    writer.fixed64(1.5f64.to_bits());
    writer.key(2, WireType::Sized);
    writer.sized(&names.flush());

    let tree = statecast::deserialize(schema, &writer.flush()).unwrap();
    assert_eq!(tree.view(), json!({"score": 1.5, "names": {"3": "ann"}}));
}
