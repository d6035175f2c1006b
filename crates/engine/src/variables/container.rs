// NDB - Neo Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Expandable value containers.
//!
//! A container references the live value it describes. Its children are
//! computed from that value every time it is expanded; nothing is cached, so
//! a second expansion observes whatever the virtual machine changed in between.

use std::{fmt, rc::Rc};

use alloy_primitives::{hex, Bytes};
use ndb_common::{
    content_hash, format_content_hash, ArrayRef, MapRef, ScriptHash, StackItem, StorageEntry,
    StorageView, VariableDecl,
};

use super::{path::is_evaluable_name, VariableSession, VariableStub};

/// What a container describes
#[derive(Clone)]
pub enum ContainerKind {
    /// Raw byte string; `hashed` tags the label with the content hash
    ByteBuffer {
        /// Buffer contents
        bytes: Bytes,
        /// Whether the type label carries the content hash
        hashed: bool,
    },
    /// Array or struct, both iterated by index
    CompositeArray {
        /// Shared element storage
        items: ArrayRef,
        /// Label as `Struct[N]` instead of `Array[N]`
        is_struct: bool,
    },
    /// Map iterated in insertion order
    Map(MapRef),
    /// One key/value pair of a map
    MapEntry {
        /// Entry key
        key: StackItem,
        /// Entry value
        value: StackItem,
    },
    /// Local slots of one invocation, zipped against declared names
    Frame {
        /// The locals array, absent when the frame keeps none
        locals: Option<ArrayRef>,
        /// Declared parameters then variables
        slots: Vec<VariableDecl>,
    },
    /// Every storage entry of one contract
    StorageSnapshot {
        /// Live store
        storage: Rc<dyn StorageView>,
        /// Owning contract
        script_hash: ScriptHash,
    },
    /// One storage entry
    StorageEntry(StorageEntry),
}

impl fmt::Debug for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteBuffer { bytes, hashed } => {
                f.debug_struct("ByteBuffer").field("bytes", bytes).field("hashed", hashed).finish()
            }
            Self::CompositeArray { items, is_struct } => f
                .debug_struct("CompositeArray")
                .field("len", &items.borrow().len())
                .field("is_struct", is_struct)
                .finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(&entries.borrow().len()).finish(),
            Self::MapEntry { key, value } => {
                f.debug_struct("MapEntry").field("key", key).field("value", value).finish()
            }
            Self::Frame { locals, slots } => f
                .debug_struct("Frame")
                .field("locals", &locals.as_ref().map(|l| l.borrow().len()))
                .field("slots", slots)
                .finish(),
            Self::StorageSnapshot { script_hash, .. } => {
                f.debug_struct("StorageSnapshot").field("script_hash", script_hash).finish()
            }
            Self::StorageEntry(entry) => f.debug_tuple("StorageEntry").field(entry).finish(),
        }
    }
}

/// A registered, expandable node of the variable tree
#[derive(Debug, Clone)]
pub struct Container {
    /// What is being shown
    pub kind: ContainerKind,
    /// Display name
    pub name: String,
    /// Expression re-selecting the value, if it is addressable
    pub evaluate_path: Option<String>,
}

impl Container {
    /// Create an unaddressable container
    pub fn new(kind: ContainerKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into(), evaluate_path: None }
    }

    /// Set the evaluate path
    pub fn with_evaluate_path(mut self, path: Option<String>) -> Self {
        self.evaluate_path = path;
        self
    }

    /// Type label shown next to the name
    pub fn type_label(&self) -> String {
        match &self.kind {
            ContainerKind::ByteBuffer { bytes, hashed } => {
                let label = format!("Byte[{}]", bytes.len());
                if *hashed {
                    format!("{label} #{}", format_content_hash(content_hash(bytes)))
                } else {
                    label
                }
            }
            ContainerKind::CompositeArray { items, is_struct } => {
                let kind = if *is_struct { "Struct" } else { "Array" };
                format!("{kind}[{}]", items.borrow().len())
            }
            ContainerKind::Map(entries) => format!("Map[{}]", entries.borrow().len()),
            ContainerKind::MapEntry { .. } => "MapEntry".to_string(),
            ContainerKind::Frame { .. } => "Frame".to_string(),
            ContainerKind::StorageSnapshot { .. } => "Storage".to_string(),
            ContainerKind::StorageEntry(_) => "StorageEntry".to_string(),
        }
    }

    /// Value preview; composites show their type label
    pub fn preview(&self) -> String {
        match &self.kind {
            ContainerKind::ByteBuffer { bytes, .. } => hex::encode_prefixed(bytes),
            ContainerKind::CompositeArray { .. } | ContainerKind::Map(_) => self.type_label(),
            ContainerKind::MapEntry { key, value } => {
                format!("{}: {}", key.preview(), value.preview())
            }
            ContainerKind::Frame { .. } => String::new(),
            ContainerKind::StorageSnapshot { script_hash, .. } => script_hash.to_string(),
            ContainerKind::StorageEntry(entry) => hex::encode_prefixed(&entry.value),
        }
    }

    /// Indexed and named child counts
    fn counts(&self, byte_limit: Option<usize>) -> (Option<usize>, Option<usize>) {
        match &self.kind {
            ContainerKind::ByteBuffer { bytes, .. } => {
                let shown = byte_limit.map_or(bytes.len(), |limit| bytes.len().min(limit));
                (Some(shown), None)
            }
            ContainerKind::CompositeArray { items, .. } => (Some(items.borrow().len()), None),
            ContainerKind::Map(entries) => (Some(entries.borrow().len()), None),
            ContainerKind::MapEntry { .. } => (None, Some(2)),
            ContainerKind::Frame { locals, .. } => {
                (None, Some(locals.as_ref().map_or(0, |items| items.borrow().len())))
            }
            ContainerKind::StorageSnapshot { storage, script_hash } => {
                (None, Some(storage.entries(script_hash).len()))
            }
            ContainerKind::StorageEntry(_) => (None, Some(3)),
        }
    }

    pub(crate) fn to_stub(&self, handle: i64, byte_limit: Option<usize>) -> VariableStub {
        let (indexed_count, named_count) = self.counts(byte_limit);
        VariableStub {
            name: self.name.clone(),
            type_label: self.type_label(),
            value: self.preview(),
            handle,
            indexed_count,
            named_count,
            evaluate_path: self.evaluate_path.clone(),
        }
    }

    /// Compute the children from the live value, registering nested containers
    pub(crate) fn children(&self, session: &mut VariableSession) -> Vec<VariableStub> {
        let path = self.evaluate_path.as_deref();
        match &self.kind {
            ContainerKind::ByteBuffer { bytes, .. } => {
                let limit = session.byte_child_limit().unwrap_or(usize::MAX);
                bytes
                    .iter()
                    .take(limit)
                    .enumerate()
                    .map(|(i, byte)| {
                        VariableStub::leaf(i.to_string(), "Byte", format!("0x{byte:02x}"))
                    })
                    .collect()
            }
            ContainerKind::CompositeArray { items, .. } => {
                let items = items.borrow().clone();
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        session.item_stub(i.to_string(), path.map(|p| format!("{p}[{i}]")), item)
                    })
                    .collect()
            }
            ContainerKind::Map(entries) => {
                let entries: Vec<_> =
                    entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        session.register(Self::new(ContainerKind::MapEntry { key, value }, ""))
                    })
                    .collect()
            }
            ContainerKind::MapEntry { key, value } => {
                vec![session.item_stub("key", None, key), session.item_stub("value", None, value)]
            }
            ContainerKind::Frame { locals, slots } => {
                let Some(locals) = locals else {
                    return Vec::new();
                };
                let values = locals.borrow().clone();
                values
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match slots.get(i) {
                        Some(decl) => {
                            let path = is_evaluable_name(&decl.name).then(|| decl.name.clone());
                            session.item_stub(decl.name.clone(), path, item)
                        }
                        None => session.item_stub(format!("<variable {i}>"), None, item),
                    })
                    .collect()
            }
            ContainerKind::StorageSnapshot { storage, script_hash } => storage
                .entries(script_hash)
                .into_iter()
                .map(|entry| {
                    let hash = format_content_hash(entry.key_hash());
                    let path = format!("$storage[{hash}]");
                    let container = Self::new(ContainerKind::StorageEntry(entry), hash)
                        .with_evaluate_path(Some(path));
                    session.register(container)
                })
                .collect(),
            ContainerKind::StorageEntry(entry) => {
                let hashed = session.hash_storage_buffers();
                let field = |name: &str, bytes: &Bytes| {
                    Self::new(ContainerKind::ByteBuffer { bytes: bytes.clone(), hashed }, name)
                        .with_evaluate_path(path.map(|p| format!("{p}.{name}")))
                };
                vec![
                    session.register(field("key", &entry.key)),
                    session.register(field("value", &entry.value)),
                    VariableStub::leaf("constant", "Boolean", entry.is_constant.to_string()),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_buffer_labels() {
        let plain = Container::new(
            ContainerKind::ByteBuffer { bytes: Bytes::from_static(b"ab"), hashed: false },
            "b",
        );
        assert_eq!(plain.type_label(), "Byte[2]");
        assert_eq!(plain.preview(), "0x6162");

        let hashed = Container::new(
            ContainerKind::ByteBuffer { bytes: Bytes::from_static(b"ab"), hashed: true },
            "b",
        );
        let expected = format!("Byte[2] #{}", format_content_hash(content_hash(b"ab")));
        assert_eq!(hashed.type_label(), expected);
    }

    #[test]
    fn test_composite_preview_is_label() {
        let StackItem::Struct(items) = StackItem::structure(vec![1.into(), 2.into()]) else {
            unreachable!()
        };
        let container =
            Container::new(ContainerKind::CompositeArray { items, is_struct: true }, "s");
        assert_eq!(container.type_label(), "Struct[2]");
        assert_eq!(container.preview(), "Struct[2]");
    }

    #[test]
    fn test_byte_limit_caps_indexed_count() {
        let container = Container::new(
            ContainerKind::ByteBuffer { bytes: Bytes::from(vec![0u8; 10]), hashed: false },
            "b",
        );
        assert_eq!(container.to_stub(1, Some(4)).indexed_count, Some(4));
        assert_eq!(container.to_stub(1, None).indexed_count, Some(10));
    }
}
