use std::rc::Rc;

use alloy_primitives::Bytes;
use ndb_common::{
    content_hash, format_content_hash, test_utils::MockStorage, ScriptHash, StackItem,
    StorageEntry, StorageView,
};
use ndb_engine::{Container, ContainerKind, DebuggerConfig, VariableError, VariableSession};
use tracing::info;

fn byte_buffer(bytes: Vec<u8>) -> Container {
    Container::new(ContainerKind::ByteBuffer { bytes: Bytes::from(bytes), hashed: false }, "buf")
}

#[test]
fn test_byte_buffer_expands_to_one_leaf_per_byte() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = VariableSession::new();

    for len in [0usize, 1, 7, 64] {
        let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let stub = session.register(byte_buffer(bytes.clone()));
        assert_eq!(stub.type_label, format!("Byte[{len}]"));
        assert_eq!(stub.indexed_count, Some(len));

        let children = session.expand(stub.handle).unwrap();
        assert_eq!(children.len(), len);
        for (i, child) in children.iter().enumerate() {
            assert!(child.is_leaf());
            assert_eq!(child.name, i.to_string());
            assert_eq!(child.value, format!("0x{:02x}", bytes[i]));
        }
    }
}

#[test]
fn test_map_entries_expand_to_key_and_value() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = VariableSession::new();

    let map = StackItem::map([
        (StackItem::from("b"), StackItem::integer(2)),
        (StackItem::from("a"), StackItem::array(vec![true.into()])),
        (StackItem::integer(9), StackItem::from("nine")),
    ]);
    let stub = session.item_stub("m", Some("m".to_string()), &map);
    assert_eq!(stub.type_label, "Map[3]");
    assert_eq!(stub.value, "Map[3]");

    let entries = session.expand(stub.handle).unwrap();
    assert_eq!(entries.len(), 3);
    let mut keys = Vec::new();
    for entry in &entries {
        assert!(entry.name.is_empty());
        assert!(!entry.is_leaf());
        let children = session.expand(entry.handle).unwrap();
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "value"]);
        keys.push(children[0].value.clone());
    }
    // insertion order
    assert_eq!(keys, vec!["0x62", "0x61", "9"]);
}

#[test]
fn test_composite_children_paths_and_previews() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = VariableSession::new();

    let inner = StackItem::structure(vec![1.into(), 2.into()]);
    let outer = StackItem::array(vec![inner, StackItem::from("hi"), 5.into()]);
    let stub = session.item_stub("items", Some("items".to_string()), &outer);
    assert_eq!(stub.type_label, "Array[3]");

    let children = session.expand(stub.handle).unwrap();
    assert_eq!(children[0].type_label, "Struct[2]");
    assert_eq!(children[0].value, "Struct[2]");
    assert_eq!(children[0].evaluate_path.as_deref(), Some("items[0]"));
    assert_eq!(children[1].type_label, "Byte[2]");
    assert_eq!(children[1].value, "0x6869");
    assert!(children[2].is_leaf());
    assert_eq!(children[2].evaluate_path.as_deref(), Some("items[2]"));

    let nested = session.expand(children[0].handle).unwrap();
    assert_eq!(nested[1].evaluate_path.as_deref(), Some("items[0][1]"));
}

#[test]
fn test_expansion_reads_through_live_values() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = VariableSession::new();

    let array = StackItem::array(vec![1.into()]);
    let stub = session.item_stub("a", None, &array);
    assert_eq!(session.expand(stub.handle).unwrap().len(), 1);

    array.as_array().unwrap().borrow_mut().push(2.into());
    let children = session.expand(stub.handle).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].value, "2");
}

#[test]
fn test_stale_handles_fail_after_clear() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = VariableSession::new();

    let stub = session.register(byte_buffer(vec![1, 2, 3]));
    assert_eq!(session.expand(stub.handle).unwrap(), session.expand(stub.handle).unwrap());

    session.clear();
    assert_eq!(session.expand(stub.handle), Err(VariableError::UnknownHandle(stub.handle)));
    assert_eq!(session.expand(0), Err(VariableError::UnknownHandle(0)));
}

#[test]
fn test_storage_snapshot_reads_through_store() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let hash = ScriptHash::new([5; 20]);
    let storage = Rc::new(MockStorage::new());
    storage.put(hash, StorageEntry::new(b"owner".to_vec(), b"alice".to_vec()).constant());

    let mut session = VariableSession::new();
    let view: Rc<dyn StorageView> = storage.clone();
    let snapshot = session.register(Container::new(
        ContainerKind::StorageSnapshot { storage: view, script_hash: hash },
        "storage",
    ));

    let entries = session.expand(snapshot.handle).unwrap();
    assert_eq!(entries.len(), 1);
    let key_hash = format_content_hash(content_hash(b"owner"));
    assert_eq!(entries[0].name, key_hash);
    assert_eq!(entries[0].evaluate_path, Some(format!("$storage[{key_hash}]")));
    assert_eq!(entries[0].named_count, Some(3));

    let fields = session.expand(entries[0].handle).unwrap();
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["key", "value", "constant"]);
    assert_eq!(fields[0].value, "0x6f776e6572");
    assert_eq!(fields[1].evaluate_path, Some(format!("$storage[{key_hash}].value")));
    let value_hash = format_content_hash(content_hash(b"alice"));
    assert_eq!(fields[1].type_label, format!("Byte[5] #{value_hash}"));
    assert_eq!(fields[2].value, "true");

    storage.put(hash, StorageEntry::new(b"total".to_vec(), vec![0x10]));
    assert_eq!(session.expand(snapshot.handle).unwrap().len(), 2);

    storage.clear(&hash);
    assert!(session.expand(snapshot.handle).unwrap().is_empty());
    assert_eq!(session.expand(entries[0].handle).unwrap()[1].value, "0x616c696365");
}

#[test]
fn test_unhashed_storage_buffers() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let hash = ScriptHash::new([5; 20]);
    let storage = Rc::new(MockStorage::new());
    storage.put(hash, StorageEntry::new(b"k".to_vec(), b"v".to_vec()));

    let config = DebuggerConfig::default().with_hash_storage_buffers(false);
    let mut session = VariableSession::from_config(&config);
    let snapshot = session.register(Container::new(
        ContainerKind::StorageSnapshot { storage, script_hash: hash },
        "storage",
    ));
    let entries = session.expand(snapshot.handle).unwrap();
    let fields = session.expand(entries[0].handle).unwrap();
    assert_eq!(fields[0].type_label, "Byte[1]");
}
