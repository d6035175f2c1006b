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

//! NeoVM stack item model as seen by the debugger.
//!
//! Composite items are reference counted so that a debugger view shares the
//! same backing storage the virtual machine mutates. Reading through a
//! [`StackItem::Array`] after the engine appended to it observes the new
//! element; nothing here takes a snapshot.

use std::{
    cell::RefCell,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use alloy_primitives::{hex, Bytes, I256};
use indexmap::IndexMap;

/// Shared backing storage of an array or struct
pub type ArrayRef = Rc<RefCell<Vec<StackItem>>>;

/// Shared backing storage of a map, iterated in insertion order
pub type MapRef = Rc<RefCell<IndexMap<StackItem, StackItem>>>;

/// A value living on the evaluation stack, alt stack, or inside a composite
#[derive(Clone)]
pub enum StackItem {
    /// Boolean constant
    Boolean(bool),
    /// Arbitrary precision integer, bounded to 256 bits by the engine
    Integer(I256),
    /// Immutable byte string
    ByteArray(Bytes),
    /// Mutable array, compared by reference
    Array(ArrayRef),
    /// Mutable struct, compared by reference
    Struct(ArrayRef),
    /// Mutable map, compared by reference
    Map(MapRef),
    /// Opaque handle to an interop object, carrying its type name
    InteropInterface(String),
}

impl StackItem {
    /// Build an integer item
    pub fn integer(value: i64) -> Self {
        Self::Integer(I256::unchecked_from(value))
    }

    /// Build a byte array item
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::ByteArray(value.into())
    }

    /// Build an array item with fresh backing storage
    pub fn array(items: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    /// Build a struct item with fresh backing storage
    pub fn structure(items: Vec<Self>) -> Self {
        Self::Struct(Rc::new(RefCell::new(items)))
    }

    /// Build a map item preserving the order of `entries`
    pub fn map(entries: impl IntoIterator<Item = (Self, Self)>) -> Self {
        Self::Map(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// NeoVM type name of this item
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::ByteArray(_) => "ByteArray",
            Self::Array(_) => "Array",
            Self::Struct(_) => "Struct",
            Self::Map(_) => "Map",
            Self::InteropInterface(_) => "InteropInterface",
        }
    }

    /// Backing storage of an array or struct
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(items) | Self::Struct(items) => Some(items),
            _ => None,
        }
    }

    /// Short textual preview used for leaf values
    pub fn preview(&self) -> String {
        match self {
            Self::Boolean(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::ByteArray(bytes) => hex::encode_prefixed(bytes),
            Self::Array(items) => format!("Array[{}]", items.borrow().len()),
            Self::Struct(items) => format!("Struct[{}]", items.borrow().len()),
            Self::Map(entries) => format!("Map[{}]", entries.borrow().len()),
            Self::InteropInterface(name) => format!("<{name}>"),
        }
    }
}

impl fmt::Debug for StackItem {
    // Composites print their shape only; the graph may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.preview())
    }
}

impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::InteropInterface(a), Self::InteropInterface(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Struct(a), Self::Struct(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for StackItem {}

impl Hash for StackItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Boolean(value) => value.hash(state),
            Self::Integer(value) => value.hash(state),
            Self::ByteArray(bytes) => bytes.hash(state),
            Self::InteropInterface(name) => name.hash(state),
            Self::Array(items) | Self::Struct(items) => Rc::as_ptr(items).hash(state),
            Self::Map(entries) => Rc::as_ptr(entries).hash(state),
        }
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for StackItem {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<&str> for StackItem {
    fn from(value: &str) -> Self {
        Self::bytes(value.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites_compare_by_reference() {
        let a = StackItem::array(vec![1.into()]);
        let b = StackItem::array(vec![1.into()]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_primitives_compare_by_value() {
        assert_eq!(StackItem::from("abc"), StackItem::bytes(b"abc".to_vec()));
        assert_eq!(StackItem::integer(-5), StackItem::from(-5i64));
        assert_ne!(StackItem::from(true), StackItem::integer(1));
    }

    #[test]
    fn test_shared_array_reads_through() {
        let item = StackItem::array(vec![]);
        let alias = item.clone();
        alias.as_array().unwrap().borrow_mut().push(StackItem::from(true));
        assert_eq!(item.preview(), "Array[1]");
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let item = StackItem::map([
            (StackItem::from("z"), 1.into()),
            (StackItem::from("a"), 2.into()),
        ]);
        let StackItem::Map(entries) = &item else { panic!("expected map") };
        let keys: Vec<_> = entries.borrow().keys().map(StackItem::preview).collect();
        assert_eq!(keys, vec!["0x7a", "0x61"]);
    }

    #[test]
    fn test_integer_covers_i64_extremes() {
        assert_eq!(StackItem::integer(i64::MIN).preview(), i64::MIN.to_string());
        assert_eq!(StackItem::integer(i64::MAX).preview(), i64::MAX.to_string());
        assert_eq!(StackItem::integer(-1).preview(), "-1");
    }

    #[test]
    fn test_previews() {
        assert_eq!(StackItem::integer(42).preview(), "42");
        assert_eq!(StackItem::from(false).preview(), "false");
        assert_eq!(StackItem::from("ab").preview(), "0x6162");
        assert_eq!(StackItem::InteropInterface("Block".into()).preview(), "<Block>");
    }
}
