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

//! Handle-addressed variable tree.
//!
//! Runtime values are exposed to the debugging protocol as [`VariableStub`]s.
//! Anything with children is wrapped in a [`Container`] and registered in a
//! [`VariableSession`], which hands out the handle the client later passes to
//! [`VariableSession::expand`]. The session is discarded on every resume.

mod container;
mod path;
mod session;
mod stub;

pub(crate) use path::select;

pub use container::{Container, ContainerKind};
pub use path::{EvalError, EvaluatePath, StorageField, STORAGE_ROOT};
pub use session::VariableSession;
pub use stub::VariableStub;

use thiserror::Error;

/// Errors raised by the handle table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    /// The handle was never issued or was released by a clear
    #[error("unknown variable reference {0}")]
    UnknownHandle(i64),
}
