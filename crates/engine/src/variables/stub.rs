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

//! Protocol-facing variable records.

use serde::{Deserialize, Serialize};

/// A variable as handed to the debugging protocol.
///
/// Field names serialize the way debug adapter clients expect them, so a stub
/// can be embedded in a `variables` response as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableStub {
    /// Display name, empty for anonymous map entries
    pub name: String,
    /// Type label, e.g. `Byte[4]` or `Struct[2]`
    #[serde(rename = "type")]
    pub type_label: String,
    /// Preview of the value
    pub value: String,
    /// Handle to expand, `0` for a leaf
    #[serde(rename = "variablesReference")]
    pub handle: i64,
    /// Number of indexed children
    #[serde(rename = "indexedVariables", default, skip_serializing_if = "Option::is_none")]
    pub indexed_count: Option<usize>,
    /// Number of named children
    #[serde(rename = "namedVariables", default, skip_serializing_if = "Option::is_none")]
    pub named_count: Option<usize>,
    /// Expression re-selecting this value
    #[serde(rename = "evaluateName", default, skip_serializing_if = "Option::is_none")]
    pub evaluate_path: Option<String>,
}

impl VariableStub {
    /// A leaf stub without children
    pub fn leaf(
        name: impl Into<String>,
        type_label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            value: value.into(),
            handle: 0,
            indexed_count: None,
            named_count: None,
            evaluate_path: None,
        }
    }

    /// Attach an evaluate path
    pub fn with_evaluate_path(mut self, path: Option<String>) -> Self {
        self.evaluate_path = path;
        self
    }

    /// Whether the stub has no children to expand
    pub fn is_leaf(&self) -> bool {
        self.handle == 0
    }
}
