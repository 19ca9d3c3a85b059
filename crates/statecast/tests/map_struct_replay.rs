use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use statecast::{
    encode_list_pop, encode_list_push, encode_map_remove, encode_update, ContainerBody,
    FieldSchema, Path, Scalar, Schema, StateError, StateTree, WireType, Writer, MAX_TAG,
};

fn lobby() -> Schema {
    let player = Schema::structure([
        FieldSchema::new(1, "hp", Schema::Uint),
        FieldSchema::new(2, "inv", Schema::list(Schema::String)),
    ]);
    Schema::structure([
        FieldSchema::new(1, "players", Schema::map(player)),
        FieldSchema::new(2, "round", Schema::Uint),
    ])
}

fn player_body(hp: u32) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.key(1, WireType::Varint);
    writer.varint32(hp);
    writer.flush()
}

#[test]
fn map_insert_then_remove() {
    let mut tree = StateTree::new(Schema::map(Schema::String)).unwrap();
    let updates: Arc<Mutex<Vec<(u32, Value, Option<Value>)>>> = Arc::default();
    let removes: Arc<Mutex<Vec<(u32, Value, bool)>>> = Arc::default();
    {
        let map = tree.root_mut().as_map_mut().unwrap();
        let sink = Arc::clone(&updates);
        map.on_update(move |ev| {
            sink.lock()
                .unwrap()
                .push((ev.tag, ev.new_value.view(), ev.old_value.map(|v| v.view())));
        });
        let sink = Arc::clone(&removes);
        map.on_remove(move |ev| {
            sink.lock()
                .unwrap()
                .push((ev.key, ev.value.view(), ev.map.contains_key(ev.key)));
        });
    }

    tree.replay(&encode_update(&Path::from([7]), &Scalar::from("seven"))).unwrap();
    tree.replay(&encode_update(&Path::from([7]), &Scalar::from("SEVEN"))).unwrap();
    assert_eq!(tree.view(), json!({"7": "SEVEN"}));
    assert_eq!(
        updates.lock().unwrap().as_slice(),
        &[
            (7, json!("seven"), None),
            (7, json!("SEVEN"), Some(json!("seven"))),
        ]
    );

    tree.replay(&encode_map_remove(&Path::root(), 7)).unwrap();
    assert_eq!(tree.view(), json!({}));
    // the entry is still visible while observers run
    assert_eq!(
        removes.lock().unwrap().as_slice(),
        &[(7, json!("SEVEN"), true)]
    );
}

#[test]
fn map_insert_rejects_keys_that_cannot_be_encoded() {
    let mut tree = StateTree::new(Schema::map(Schema::Uint)).unwrap();
    let err = tree
        .replay(&encode_update(&Path::from([u32::MAX]), &Scalar::Uint(7)))
        .unwrap_err();
    assert_eq!(
        err,
        StateError::TagTooLarge {
            path: Path::root(),
            tag: u32::MAX,
        }
    );
    assert_eq!(
        tree.replay(&encode_update(&Path::from([MAX_TAG + 1]), &Scalar::Uint(7))),
        Err(StateError::TagTooLarge {
            path: Path::root(),
            tag: MAX_TAG + 1,
        })
    );
    assert_eq!(tree.view(), json!({}));

    tree.replay(&encode_update(&Path::from([MAX_TAG]), &Scalar::Uint(7)))
        .unwrap();
    let decoded = StateTree::deserialize(Schema::map(Schema::Uint), &tree.encode()).unwrap();
    assert_eq!(decoded.root(), tree.root());
    let view = decoded.view();
    assert_eq!(view.as_object().map(|o| o.len()), Some(1));
    assert_eq!(view[MAX_TAG.to_string()], json!(7));
}

#[test]
fn map_remove_missing_key() {
    let mut tree = StateTree::new(Schema::map(Schema::Uint)).unwrap();
    assert_eq!(
        tree.replay(&encode_map_remove(&Path::root(), 7)).unwrap_err(),
        StateError::KeyNotFound {
            path: Path::root(),
            key: 7,
        }
    );
}

#[test]
fn struct_rejects_list_and_map_operations() {
    let mut tree = StateTree::new(lobby()).unwrap();
    assert!(matches!(
        tree.replay(&encode_map_remove(&Path::root(), 1)),
        Err(StateError::UnsupportedOperation { kind: "struct", .. })
    ));
    assert!(matches!(
        tree.replay(&encode_list_pop(&Path::root())),
        Err(StateError::UnsupportedOperation { kind: "struct", .. })
    ));
    assert!(matches!(
        tree.replay(&encode_list_push(&Path::root(), &Scalar::Uint(1))),
        Err(StateError::UnsupportedOperation { kind: "struct", .. })
    ));
}

#[test]
fn struct_replace_of_unknown_tag_is_ignored() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let calls = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&calls);
    tree.root_mut().as_struct_mut().unwrap().on_update(move |_| {
        *sink.lock().unwrap() += 1;
    });

    let before = tree.view();
    tree.replay(&encode_update(&Path::from([9]), &Scalar::from("ignored"))).unwrap();
    assert_eq!(tree.view(), before);
    assert_eq!(*calls.lock().unwrap(), 0);

    tree.replay(&encode_update(&Path::from([2]), &Scalar::Uint(3))).unwrap();
    assert_eq!(tree.view()["round"], json!(3));
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn struct_replace_with_wrong_wire_type() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let err = tree
        .replay(&encode_update(&Path::from([2]), &Scalar::from("three")))
        .unwrap_err();
    assert_eq!(
        err,
        StateError::WireTypeMismatch {
            path: Path::from([2]),
            expected: WireType::Varint,
            actual: WireType::Sized,
        }
    );
}

#[test]
fn nested_paths() {
    let mut tree = StateTree::new(lobby()).unwrap();
    tree.replay(&encode_update(&Path::from([1, 42]), &ContainerBody(&player_body(10))))
        .unwrap();
    tree.replay(&encode_list_push(&Path::from([1, 42, 2]), &Scalar::from("sword")))
        .unwrap();
    tree.replay(&encode_update(&Path::from([1, 42, 1]), &Scalar::Uint(9)))
        .unwrap();

    assert_eq!(
        tree.view(),
        json!({"players": {"42": {"hp": 9, "inv": ["sword"]}}, "round": 0})
    );
    assert_eq!(
        tree.resolve(&[1, 42, 2, 0]).unwrap().path(),
        &Path::from([1, 42, 2, 0])
    );
}

#[test]
fn nested_observer_sees_its_own_container() {
    let mut tree = StateTree::new(lobby()).unwrap();
    tree.replay(&encode_update(&Path::from([1, 3]), &ContainerBody(&player_body(1))))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tree.resolve_mut(&[1, 3, 2])
        .unwrap()
        .as_list_mut()
        .unwrap()
        .on_push(move |ev| {
            sink.lock().unwrap().push((ev.list.path().to_string(), ev.tag));
        });

    tree.replay(&encode_list_push(&Path::from([1, 3, 2]), &Scalar::from("a")))
        .unwrap();
    tree.replay(&encode_list_push(&Path::from([1, 3, 2]), &Scalar::from("b")))
        .unwrap();
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("/1/3/2".to_owned(), 0), ("/1/3/2".to_owned(), 1)]
    );
}

#[test]
fn replacing_a_container_drops_its_observers() {
    let mut tree = StateTree::new(lobby()).unwrap();
    tree.replay(&encode_update(&Path::from([1, 3]), &ContainerBody(&player_body(1))))
        .unwrap();
    let calls = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&calls);
    tree.resolve_mut(&[1, 3, 2])
        .unwrap()
        .as_list_mut()
        .unwrap()
        .on_push(move |_| *sink.lock().unwrap() += 1);

    tree.replay(&encode_update(&Path::from([1, 3]), &ContainerBody(&player_body(2))))
        .unwrap();
    tree.replay(&encode_list_push(&Path::from([1, 3, 2]), &Scalar::from("a")))
        .unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn replace_inside_a_leaf() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let err = tree
        .replay(&encode_update(&Path::from([2, 0]), &Scalar::Uint(1)))
        .unwrap_err();
    assert_eq!(
        err,
        StateError::TypeMismatch {
            path: Path::from([2]),
            kind: "leaf",
        }
    );
}

#[test]
fn unknown_path() {
    let mut tree = StateTree::new(lobby()).unwrap();
    assert_eq!(
        tree.replay(&encode_list_push(&Path::from([1, 99, 2]), &Scalar::from("x")))
            .unwrap_err(),
        StateError::PathNotFound(Path::from([1, 99]))
    );
}

#[test]
fn trailing_bytes_reject_the_record() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let mut bytes = encode_update(&Path::from([2]), &Scalar::Uint(5));
    bytes.push(0x00);
    assert_eq!(tree.replay(&bytes).unwrap_err(), StateError::TrailingBytes(1));
    assert_eq!(tree.view()["round"], json!(0));
}

#[test]
fn replay_log_applies_in_order() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let mut log = Vec::new();
    log.extend(encode_update(&Path::from([1, 1]), &ContainerBody(&player_body(4))));
    log.extend(encode_list_push(&Path::from([1, 1, 2]), &Scalar::from("bow")));
    log.extend(encode_update(&Path::from([2]), &Scalar::Uint(2)));
    log.extend(encode_map_remove(&Path::from([1]), 1));

    assert_eq!(tree.replay_log(&log), Ok(4));
    assert_eq!(tree.view(), json!({"players": {}, "round": 2}));
}

#[test]
fn replay_log_stops_at_first_failure() {
    let mut tree = StateTree::new(lobby()).unwrap();
    let mut log = Vec::new();
    log.extend(encode_update(&Path::from([2]), &Scalar::Uint(2)));
    log.extend(encode_map_remove(&Path::from([1]), 8));
    log.extend(encode_update(&Path::from([2]), &Scalar::Uint(3)));

    assert_eq!(
        tree.replay_log(&log),
        Err(StateError::KeyNotFound {
            path: Path::from([1]),
            key: 8,
        })
    );
    assert_eq!(tree.view()["round"], json!(2));
}
