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

//! Contract storage entries and the content hash used to label them.

use alloy_primitives::{keccak256, Bytes};
use serde::{Deserialize, Serialize};

/// One persisted key/value pair of a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Raw key bytes
    pub key: Bytes,
    /// Raw value bytes
    pub value: Bytes,
    /// Whether the entry was written as read-only
    pub is_constant: bool,
}

impl StorageEntry {
    /// Create a mutable storage entry
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self { key: key.into(), value: value.into(), is_constant: false }
    }

    /// Mark the entry as constant
    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    /// Content hash of the raw key bytes
    pub fn key_hash(&self) -> u32 {
        content_hash(&self.key)
    }
}

/// 32-bit content hash of a byte string.
///
/// A pure function of the bytes: the same content yields the same tag no
/// matter where it is displayed or how often the store is re-read. It is a
/// display label only and unrelated to variable handle allocation.
pub fn content_hash(bytes: &[u8]) -> u32 {
    let digest = keccak256(bytes);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Format a content hash the way evaluate paths and display names spell it
pub fn format_content_hash(hash: u32) -> String {
    format!("{hash:08x}")
}
