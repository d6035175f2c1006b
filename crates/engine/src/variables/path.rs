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

//! Evaluate-path expressions.
//!
//! Three forms are understood:
//!
//! - `$<stack>[<i>]…` selects a stack slot, index `0` being the top; a bare
//!   `$<stack>` selects the whole stack
//! - `<name>[<i>]…` selects a declared local and walks into composites
//! - `$storage[<hash>]` selects a storage entry, `.key` / `.value` one half of it
//!
//! Names may carry any character except whitespace and brackets, so
//! compiler-generated locals such as `CS$<>8__locals0` stay addressable.

use std::{fmt, str::FromStr};

use ndb_common::{format_content_hash, StackItem};
use thiserror::Error;

/// Root name of storage paths
pub const STORAGE_ROOT: &str = "storage";

/// Half of a storage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum StorageField {
    /// Raw key bytes
    #[display("key")]
    Key,
    /// Raw value bytes
    #[display("value")]
    Value,
}

/// A parsed evaluate path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluatePath {
    /// Slot of a named stack, then nested indices
    Stack {
        /// Stack name without the `$`
        stack: String,
        /// Indices, the first one selecting the slot
        indices: Vec<usize>,
    },
    /// Declared local, then nested indices
    Variable {
        /// Declared name
        name: String,
        /// Indices into nested composites
        indices: Vec<usize>,
    },
    /// Storage entry with the given key hash
    StorageEntry {
        /// Content hash of the key bytes
        key_hash: u32,
    },
    /// Key or value of the storage entry with the given key hash
    Storage {
        /// Content hash of the key bytes
        key_hash: u32,
        /// Selected half
        field: StorageField,
    },
}

/// Errors raised while parsing or evaluating a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Malformed expression
    #[error("invalid evaluate path `{input}`: {reason}")]
    Syntax {
        /// The offending input
        input: String,
        /// What was expected
        reason: &'static str,
    },
    /// No stack with that name
    #[error("unknown stack `${0}`")]
    UnknownStack(String),
    /// No declared local with that name in the current frame
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    /// Index past the end of a composite or stack
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Actual length
        len: usize,
    },
    /// Indexing into a value without indexed children
    #[error("{type_name} values cannot be indexed")]
    NotIndexable {
        /// Type of the indexed value
        type_name: &'static str,
    },
    /// No storage entry whose key hashes to this value
    #[error("no storage entry with key hash {0:08x}")]
    UnknownStorageKey(u32),
    /// The frame was built without a storage view
    #[error("storage is not available in this frame")]
    NoStorage,
}

impl EvaluatePath {
    /// Parse an expression
    pub fn parse(input: &str) -> Result<Self, EvalError> {
        let syntax = |reason| EvalError::Syntax { input: input.to_string(), reason };
        let text = input.trim();

        if let Some(rest) = text.strip_prefix(&format!("${STORAGE_ROOT}[")) {
            let (hash, field) =
                rest.split_once(']').ok_or_else(|| syntax("unterminated storage key"))?;
            let key_hash =
                parse_hash(hash).ok_or_else(|| syntax("storage key must be a hex content hash"))?;
            let field = match field {
                "" => return Ok(Self::StorageEntry { key_hash }),
                ".key" => StorageField::Key,
                ".value" => StorageField::Value,
                _ => return Err(syntax("expected `.key` or `.value`")),
            };
            return Ok(Self::Storage { key_hash, field });
        }

        let (is_stack, body) = match text.strip_prefix('$') {
            Some(body) => (true, body),
            None => (false, text),
        };
        let (name, rest) = body.split_at(body.find('[').unwrap_or(body.len()));
        if !is_evaluable_name(name) {
            return Err(syntax("expected an identifier"));
        }
        let indices = parse_indices(rest).ok_or_else(|| syntax("expected `[<index>]`"))?;

        if is_stack {
            Ok(Self::Stack { stack: name.to_string(), indices })
        } else {
            Ok(Self::Variable { name: name.to_string(), indices })
        }
    }
}

/// Whether `name` can head a variable path
pub(crate) fn is_evaluable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('$')
        && !name.chars().any(|c| c.is_whitespace() || c == '[' || c == ']')
}

fn parse_hash(text: &str) -> Option<u32> {
    let valid = (1..=8).contains(&text.len()) && text.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| u32::from_str_radix(text, 16).ok()).flatten()
}

fn parse_indices(mut rest: &str) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let (index, tail) = rest.strip_prefix('[')?.split_once(']')?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        indices.push(index.parse().ok()?);
        rest = tail;
    }
    Some(indices)
}

impl FromStr for EvaluatePath {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EvaluatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, name, indices) = match self {
            Self::StorageEntry { key_hash } => {
                return write!(f, "${STORAGE_ROOT}[{}]", format_content_hash(*key_hash));
            }
            Self::Storage { key_hash, field } => {
                return write!(f, "${STORAGE_ROOT}[{}].{field}", format_content_hash(*key_hash));
            }
            Self::Stack { stack, indices } => ("$", stack, indices),
            Self::Variable { name, indices } => ("", name, indices),
        };
        write!(f, "{prefix}{name}")?;
        for index in indices {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

fn index_into(item: &StackItem, index: usize) -> Result<StackItem, EvalError> {
    let Some(items) = item.as_array() else {
        return Err(EvalError::NotIndexable { type_name: item.type_name() });
    };
    let items = items.borrow();
    let selected = items.get(index).cloned();
    selected.ok_or(EvalError::IndexOutOfRange { index, len: items.len() })
}

/// Walk `indices` into nested arrays and structs starting at `item`
pub(crate) fn select(item: StackItem, indices: &[usize]) -> Result<StackItem, EvalError> {
    indices.iter().try_fold(item, |current, &index| index_into(&current, index))
}
