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

//! Read-only views the execution engine exposes while it is suspended.
//!
//! The debugger never drives or mutates the virtual machine. It borrows these
//! views for the duration of one suspension and drops everything it derived
//! from them when execution resumes.

use auto_impl::auto_impl;

use crate::{ScriptHash, StackItem, StorageEntry};

/// State of the execution context at the top of the invocation stack
#[auto_impl(&, Box, Rc)]
pub trait ExecutionContextView {
    /// Script hash of the contract being executed
    fn script_hash(&self) -> ScriptHash;

    /// Address of the next instruction to execute
    fn instruction_pointer(&self) -> usize;

    /// Raw instruction bytes of the executing script
    fn script(&self) -> &[u8];

    /// Evaluation stack, bottom first
    fn evaluation_stack(&self) -> Vec<StackItem>;

    /// Alt stack, bottom first; the top holds the locals array of compiled methods
    fn alt_stack(&self) -> Vec<StackItem>;
}

/// Persistent storage of deployed contracts
#[auto_impl(&, Box, Rc)]
pub trait StorageView {
    /// All entries owned by `script_hash`, in store order
    fn entries(&self, script_hash: &ScriptHash) -> Vec<StorageEntry>;
}
