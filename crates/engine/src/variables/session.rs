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

//! Handle table of one suspension.

use std::collections::HashMap;

use ndb_common::StackItem;
use tracing::{debug, trace};

use super::{Container, ContainerKind, VariableError, VariableStub};
use crate::DebuggerConfig;

/// Handles handed out while execution is suspended.
///
/// Handles identify container instances, not values: registering two
/// containers over equal bytes yields two handles. They are allocated from a
/// counter that survives [`clear`](Self::clear), so a handle issued before a
/// resume never names a container registered after it.
#[derive(Debug)]
pub struct VariableSession {
    containers: HashMap<i64, Container>,
    next_handle: i64,
    hash_storage_buffers: bool,
    byte_child_limit: Option<usize>,
}

impl Default for VariableSession {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableSession {
    /// Create an empty session with default settings
    pub fn new() -> Self {
        Self::from_config(&DebuggerConfig::default())
    }

    /// Create an empty session honoring `config`
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            containers: HashMap::new(),
            next_handle: 1,
            hash_storage_buffers: config.hash_storage_buffers,
            byte_child_limit: config.byte_child_limit(),
        }
    }

    /// Register a container and return its stub.
    ///
    /// # Panics
    ///
    /// Panics if the allocated handle is already taken, which means the handle
    /// table is corrupt.
    pub fn register(&mut self, container: Container) -> VariableStub {
        let handle = self.next_handle;
        self.next_handle += 1;

        let stub = container.to_stub(handle, self.byte_child_limit);
        trace!(handle, name = %stub.name, label = %stub.type_label, "Registered container");
        let previous = self.containers.insert(handle, container);
        assert!(previous.is_none(), "variable handle {handle} registered twice");
        stub
    }

    /// Children of the container behind `handle`, computed from the live value
    pub fn expand(&mut self, handle: i64) -> Result<Vec<VariableStub>, VariableError> {
        let container =
            self.containers.get(&handle).cloned().ok_or(VariableError::UnknownHandle(handle))?;
        let children = container.children(self);
        debug!(handle, children = children.len(), "Expanded container");
        Ok(children)
    }

    /// Container registered under `handle`
    pub fn get(&self, handle: i64) -> Option<&Container> {
        self.containers.get(&handle)
    }

    /// Whether `handle` is currently valid
    pub fn contains(&self, handle: i64) -> bool {
        self.containers.contains_key(&handle)
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no handle is live
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Drop every container. Must be called whenever execution resumes.
    pub fn clear(&mut self) {
        debug!(released = self.containers.len(), "Clearing variable session");
        self.containers.clear();
    }

    /// Stub for a stack item, registering a container when it has children
    pub fn item_stub(
        &mut self,
        name: impl Into<String>,
        evaluate_path: Option<String>,
        item: &StackItem,
    ) -> VariableStub {
        let kind = match item {
            StackItem::ByteArray(bytes) => {
                ContainerKind::ByteBuffer { bytes: bytes.clone(), hashed: false }
            }
            StackItem::Array(items) => {
                ContainerKind::CompositeArray { items: items.clone(), is_struct: false }
            }
            StackItem::Struct(items) => {
                ContainerKind::CompositeArray { items: items.clone(), is_struct: true }
            }
            StackItem::Map(entries) => ContainerKind::Map(entries.clone()),
            StackItem::Boolean(_) | StackItem::Integer(_) | StackItem::InteropInterface(_) => {
                return VariableStub::leaf(name, item.type_name(), item.preview())
                    .with_evaluate_path(evaluate_path);
            }
        };
        self.register(Container::new(kind, name).with_evaluate_path(evaluate_path))
    }

    /// Whether storage key and value buffers carry the content hash tag
    pub fn hash_storage_buffers(&self) -> bool {
        self.hash_storage_buffers
    }

    /// Maximum number of per-byte children
    pub fn byte_child_limit(&self) -> Option<usize> {
        self.byte_child_limit
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;

    use super::*;

    fn buffer(bytes: &'static [u8]) -> Container {
        Container::new(
            ContainerKind::ByteBuffer { bytes: Bytes::from_static(bytes), hashed: false },
            "buf",
        )
    }

    #[test]
    fn test_handles_identify_instances() {
        let mut session = VariableSession::new();
        let a = session.register(buffer(b"same"));
        let b = session.register(buffer(b"same"));
        assert_ne!(a.handle, b.handle);
        assert_eq!(session.len(), 2);
        assert_eq!(session.get(a.handle).map(|c| c.name.as_str()), Some("buf"));
        assert!(session.get(0).is_none());
    }

    #[test]
    fn test_expand_is_stable() {
        let mut session = VariableSession::new();
        let stub = session.register(buffer(b"\x01\x02"));
        let first = session.expand(stub.handle).unwrap();
        let second = session.expand(stub.handle).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[1].value, "0x02");
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut session = VariableSession::new();
        let stub = session.register(buffer(b"\x01"));
        session.clear();
        assert!(session.is_empty());
        assert!(session.get(stub.handle).is_none());
        assert_eq!(session.expand(stub.handle), Err(VariableError::UnknownHandle(stub.handle)));

        let fresh = session.register(buffer(b"\x01"));
        assert_ne!(fresh.handle, stub.handle);
        assert!(!session.contains(stub.handle));
    }

    #[test]
    fn test_primitive_items_are_leaves() {
        let mut session = VariableSession::new();
        let stub = session.item_stub("n", Some("n".to_string()), &StackItem::integer(7));
        assert!(stub.is_leaf());
        assert_eq!(stub.type_label, "Integer");
        assert_eq!(stub.value, "7");
        assert!(session.is_empty());
    }

    #[test]
    fn test_byte_child_limit() {
        let config = DebuggerConfig::default().with_max_byte_children(2);
        let mut session = VariableSession::from_config(&config);
        let stub = session.register(buffer(b"\x01\x02\x03"));
        assert_eq!(session.expand(stub.handle).unwrap().len(), 2);
    }
}
