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

//! Test utilities: in-memory stand-ins for a suspended execution engine.
//!
//! These mocks let engine tests build a frame by hand and mutate storage
//! between two reads to exercise read-through behaviour.

use std::{cell::RefCell, collections::HashMap};

use crate::{ExecutionContextView, ScriptHash, StackItem, StorageEntry, StorageView};

/// Hand-built execution context
#[derive(Debug, Clone, Default)]
pub struct MockContext {
    /// Executing script hash
    pub script_hash: ScriptHash,
    /// Current instruction pointer
    pub instruction_pointer: usize,
    /// Script bytes
    pub script: Vec<u8>,
    /// Evaluation stack, bottom first
    pub evaluation_stack: Vec<StackItem>,
    /// Alt stack, bottom first
    pub alt_stack: Vec<StackItem>,
}

impl MockContext {
    /// Create an empty context for `script_hash` suspended at `instruction_pointer`
    pub fn new(script_hash: ScriptHash, instruction_pointer: usize) -> Self {
        Self { script_hash, instruction_pointer, ..Default::default() }
    }

    /// Push the locals array the compiler keeps on top of the alt stack
    pub fn with_locals(mut self, slots: Vec<StackItem>) -> Self {
        self.alt_stack.push(StackItem::array(slots));
        self
    }

    /// Replace the evaluation stack
    pub fn with_evaluation_stack(mut self, items: Vec<StackItem>) -> Self {
        self.evaluation_stack = items;
        self
    }

    /// Replace the script bytes
    pub fn with_script(mut self, script: Vec<u8>) -> Self {
        self.script = script;
        self
    }
}

impl ExecutionContextView for MockContext {
    fn script_hash(&self) -> ScriptHash {
        self.script_hash
    }

    fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    fn script(&self) -> &[u8] {
        &self.script
    }

    fn evaluation_stack(&self) -> Vec<StackItem> {
        self.evaluation_stack.clone()
    }

    fn alt_stack(&self) -> Vec<StackItem> {
        self.alt_stack.clone()
    }
}

/// In-memory contract storage that can be modified through a shared reference
#[derive(Debug, Default)]
pub struct MockStorage {
    entries: RefCell<HashMap<ScriptHash, Vec<StorageEntry>>>,
}

impl MockStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry of `script_hash`
    pub fn put(&self, script_hash: ScriptHash, entry: StorageEntry) {
        let mut entries = self.entries.borrow_mut();
        let contract = entries.entry(script_hash).or_default();
        match contract.iter_mut().find(|existing| existing.key == entry.key) {
            Some(existing) => *existing = entry,
            None => contract.push(entry),
        }
    }

    /// Remove every entry of `script_hash`
    pub fn clear(&self, script_hash: &ScriptHash) {
        self.entries.borrow_mut().remove(script_hash);
    }
}

impl StorageView for MockStorage {
    fn entries(&self, script_hash: &ScriptHash) -> Vec<StorageEntry> {
        self.entries.borrow().get(script_hash).cloned().unwrap_or_default()
    }
}
