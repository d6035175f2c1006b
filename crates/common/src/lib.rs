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

//! NDB Common - Shared functionality for NDB components
//!
//! This crate provides the value model and metadata types shared by the
//! debugger engine and the `ndb` binary: script hashes, NeoVM stack items,
//! contract storage entries, debug information, the read-only views the
//! execution engine exposes while suspended, and logging setup.

/// Common types used throughout NDB including stack items, storage entries and debug information
pub mod types;

/// Read-only views over a suspended execution engine
pub mod context;
/// Logging setup and utilities for consistent logging across NDB components
pub mod logging;
/// Mock execution contexts and storage for tests
pub mod test_utils;

pub use context::*;
pub use logging::*;
pub use types::*;
