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

//! NDB Engine - Debug introspection for NeoVM contracts
//!
//! The engine turns the state of a suspended NeoVM into something a debugger
//! front end can show:
//!
//! - [`disasm`] decodes and renders instruction streams
//! - [`sequence`] maps instruction addresses to methods and source lines
//! - [`variables`] exposes runtime values as a handle-addressed tree
//! - [`frame`] ties the three together for the frame on top of the stack
//!
//! Everything here reads engine state; nothing mutates it.

pub mod config;
pub use config::*;

pub mod disasm;

pub mod frame;
pub use frame::*;

pub mod opcode;
pub use opcode::*;

pub mod sequence;
pub use sequence::*;

pub mod variables;
pub use variables::*;
