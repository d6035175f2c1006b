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

//! Per-frame glue between a suspended execution context and the variable tree.

use std::{cell::RefCell, rc::Rc};

use ndb_common::{
    ArrayRef, DebugInfo, ExecutionContextView, Method, StackItem, StorageEntry, StorageView,
};
use tracing::{debug, warn};

use crate::{
    disasm::{decode, render, DecodeError, DisassemblyLine, SyscallResolver},
    sequence::{resolve_method, resolve_sequence_point, SourceLocation},
    variables::{
        select, Container, ContainerKind, EvalError, EvaluatePath, StorageField, VariableSession,
        VariableStub, STORAGE_ROOT,
    },
    DebuggerConfig,
};

/// Name of the evaluation stack in evaluate paths
pub const EVALUATION_STACK: &str = "evalStack";
/// Name of the alt stack in evaluate paths
pub const ALT_STACK: &str = "altStack";

/// View of the frame at the top of the invocation stack.
///
/// The method is resolved once, when the adapter is built for a suspension.
pub struct FrameAdapter<'a> {
    context: &'a dyn ExecutionContextView,
    debug_info: Option<&'a DebugInfo>,
    method: Option<&'a Method>,
    storage: Option<Rc<dyn StorageView>>,
    show_alt_stack: bool,
}

impl<'a> FrameAdapter<'a> {
    /// Adapt a suspended context, with debug information when available
    pub fn new(context: &'a dyn ExecutionContextView, debug_info: Option<&'a DebugInfo>) -> Self {
        let method = debug_info.and_then(|info| resolve_frame_method(context, info));
        Self { context, debug_info, method, storage: None, show_alt_stack: true }
    }

    /// Expose contract storage as an extra scope
    pub fn with_storage(mut self, storage: Rc<dyn StorageView>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Apply presentation settings
    pub fn with_config(mut self, config: &DebuggerConfig) -> Self {
        self.show_alt_stack = config.show_alt_stack;
        self
    }

    /// Method whose range contains the instruction pointer.
    ///
    /// Overlapping method ranges are reported and treated as no method, so the
    /// frame falls back to anonymous names.
    pub fn method(&self) -> Option<&'a Method> {
        self.method
    }

    /// Method and sequence point at the instruction pointer
    pub fn source_location(&self) -> Option<SourceLocation<'a>> {
        let method = self.method()?;
        let sequence_point =
            resolve_sequence_point(&method.sequence_points, self.context.instruction_pointer());
        let document =
            sequence_point.and_then(|sp| self.debug_info.and_then(|info| info.document(sp)));
        Some(SourceLocation { method, sequence_point, document })
    }

    /// Qualified method name, or the script hash and address without metadata
    pub fn frame_name(&self) -> String {
        self.method().map(Method::qualified_name).unwrap_or_else(|| {
            format!("{} @ {}", self.context.script_hash(), self.context.instruction_pointer())
        })
    }

    fn locals(&self) -> Option<ArrayRef> {
        let alt_stack = self.context.alt_stack();
        alt_stack.last().and_then(StackItem::as_array).cloned()
    }

    /// Frame container over the locals array on top of the alt stack
    pub fn locals_container(&self) -> Container {
        let slots = match self.method {
            Some(method) => method.slots().cloned().collect(),
            None => {
                debug!(frame = %self.frame_name(), "No declared locals, using anonymous names");
                Vec::new()
            }
        };
        Container::new(ContainerKind::Frame { locals: self.locals(), slots }, "Locals")
    }

    /// Items of a stack, top first
    fn stack_items(&self, stack: &str) -> Option<Vec<StackItem>> {
        let mut items = match stack {
            EVALUATION_STACK => self.context.evaluation_stack(),
            ALT_STACK => self.context.alt_stack(),
            _ => return None,
        };
        items.reverse();
        Some(items)
    }

    /// Indexable container over a stack, with children at `$<stack>[i]`.
    ///
    /// The stack itself is copied when the container is built; the items it
    /// holds still share storage with the live ones.
    pub fn stack_container(&self, stack: &str) -> Option<Container> {
        let items = self.stack_items(stack)?;
        Some(stack_snapshot(items, stack, format!("${stack}")))
    }

    fn storage_container(&self) -> Option<Container> {
        let storage = self.storage.clone()?;
        let kind =
            ContainerKind::StorageSnapshot { storage, script_hash: self.context.script_hash() };
        Some(Container::new(kind, STORAGE_ROOT))
    }

    /// Top-level scopes: locals, evaluation stack, alt stack and storage
    pub fn scopes(&self, session: &mut VariableSession) -> Vec<VariableStub> {
        let mut containers = vec![self.locals_container()];
        containers.extend(self.stack_container(EVALUATION_STACK));
        if self.show_alt_stack {
            containers.extend(self.stack_container(ALT_STACK));
        }
        containers.extend(self.storage_container());
        containers.into_iter().map(|container| session.register(container)).collect()
    }

    /// Variables of the frame
    pub fn variables(&self, session: &mut VariableSession) -> Vec<VariableStub> {
        self.locals_container().children(session)
    }

    /// Resolve an evaluate path against the live frame
    pub fn evaluate(
        &self,
        session: &mut VariableSession,
        path: &EvaluatePath,
    ) -> Result<VariableStub, EvalError> {
        let text = path.to_string();
        match path {
            EvaluatePath::Stack { stack, indices } => {
                let items =
                    self.stack_items(stack).ok_or_else(|| EvalError::UnknownStack(stack.clone()))?;
                let Some((&first, rest)) = indices.split_first() else {
                    return Ok(session.register(stack_snapshot(items, text.clone(), text)));
                };
                let item = items
                    .get(first)
                    .cloned()
                    .ok_or(EvalError::IndexOutOfRange { index: first, len: items.len() })?;
                let item = select(item, rest)?;
                Ok(session.item_stub(text.clone(), Some(text), &item))
            }
            EvaluatePath::Variable { name, indices } => {
                let unknown = || EvalError::UnknownVariable(name.clone());
                let position = self
                    .method
                    .and_then(|method| method.slots().position(|decl| &decl.name == name))
                    .ok_or_else(unknown)?;
                let locals = self.locals().ok_or_else(unknown)?;
                let item = locals.borrow().get(position).cloned().ok_or_else(unknown)?;
                let item = select(item, indices)?;
                Ok(session.item_stub(text.clone(), Some(text), &item))
            }
            EvaluatePath::StorageEntry { key_hash } => {
                let entry = self.storage_entry(*key_hash)?;
                let container = Container::new(ContainerKind::StorageEntry(entry), text.clone())
                    .with_evaluate_path(Some(text));
                Ok(session.register(container))
            }
            EvaluatePath::Storage { key_hash, field } => {
                let entry = self.storage_entry(*key_hash)?;
                let bytes = match field {
                    StorageField::Key => entry.key,
                    StorageField::Value => entry.value,
                };
                let kind =
                    ContainerKind::ByteBuffer { bytes, hashed: session.hash_storage_buffers() };
                let container = Container::new(kind, text.clone()).with_evaluate_path(Some(text));
                Ok(session.register(container))
            }
        }
    }

    fn storage_entry(&self, key_hash: u32) -> Result<StorageEntry, EvalError> {
        let storage = self.storage.as_ref().ok_or(EvalError::NoStorage)?;
        storage
            .entries(&self.context.script_hash())
            .into_iter()
            .find(|entry| entry.key_hash() == key_hash)
            .ok_or(EvalError::UnknownStorageKey(key_hash))
    }

    /// Parse and resolve an evaluate path
    pub fn evaluate_expression(
        &self,
        session: &mut VariableSession,
        expression: &str,
    ) -> Result<VariableStub, EvalError> {
        self.evaluate(session, &EvaluatePath::parse(expression)?)
    }

    /// Disassembly line of the instruction at the instruction pointer
    pub fn current_instruction<R>(&self, resolver: &R) -> Result<DisassemblyLine, DecodeError>
    where
        R: SyscallResolver + ?Sized,
    {
        let (instruction, _) = decode(self.context.script(), self.context.instruction_pointer())?;
        Ok(render(&instruction, resolver))
    }
}

/// Overlapping method ranges are reported and treated as no method
fn resolve_frame_method<'a>(
    context: &dyn ExecutionContextView,
    info: &'a DebugInfo,
) -> Option<&'a Method> {
    let script_hash = context.script_hash();
    match resolve_method(&info.methods, &script_hash, context.instruction_pointer()) {
        Ok(method) => method,
        Err(err) => {
            warn!(error = %err, "Cannot name frame");
            None
        }
    }
}

fn stack_snapshot(items: Vec<StackItem>, name: impl Into<String>, path: String) -> Container {
    let kind =
        ContainerKind::CompositeArray { items: Rc::new(RefCell::new(items)), is_struct: false };
    Container::new(kind, name).with_evaluate_path(Some(path))
}
