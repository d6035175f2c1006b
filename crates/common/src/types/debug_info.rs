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

//! Contract debug information emitted by the compiler.
//!
//! The on-disk format is the `.avmdbgnfo` JSON document: a list of documents
//! and, per method, its address range, declared parameters and variables, and
//! the sequence points mapping addresses to source ranges. Methods and
//! sequence points are immutable once loaded.

use std::{fs, path::Path, path::PathBuf};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::ScriptHash;

/// A declared parameter or local variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDecl {
    /// Source-level name
    pub name: String,
    /// Declared type
    pub type_name: String,
}

impl VariableDecl {
    /// Create a declaration
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into() }
    }
}

/// Line/column position in a source document, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

/// Mapping from a bytecode address to a source range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePoint {
    /// Instruction address
    pub address: usize,
    /// Index into [`DebugInfo::documents`]
    pub document: usize,
    /// Start of the source range
    pub start: SourcePosition,
    /// End of the source range
    pub end: SourcePosition,
}

/// One compiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Compiler-assigned identifier
    pub id: String,
    /// Namespace or contract class the method belongs to
    pub namespace: String,
    /// Method name
    pub name: String,
    /// First instruction address (inclusive)
    pub start: usize,
    /// Last instruction address (inclusive)
    pub end: usize,
    /// Declared parameters, in slot order
    pub parameters: Vec<VariableDecl>,
    /// Declared local variables, in slot order after the parameters
    pub variables: Vec<VariableDecl>,
    /// Declared return type, if any
    pub return_type: Option<String>,
    /// Sequence points ascending by address
    pub sequence_points: Vec<SequencePoint>,
    /// Script the method was compiled into
    pub script_hash: ScriptHash,
}

impl Method {
    /// Fully qualified `namespace.name`
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Whether `address` lies within the method's inclusive range
    pub fn contains(&self, address: usize) -> bool {
        self.start <= address && address <= self.end
    }

    /// Declared slot layout: parameters followed by variables
    pub fn slots(&self) -> impl Iterator<Item = &VariableDecl> {
        self.parameters.iter().chain(self.variables.iter())
    }
}

/// Debug information for a single contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Script hash of the contract
    pub script_hash: ScriptHash,
    /// Name of the entry point method
    pub entrypoint: String,
    /// Source documents referenced by sequence points
    pub documents: Vec<PathBuf>,
    /// Compiled methods
    pub methods: Vec<Method>,
}

/// Errors raised while parsing debug information
#[derive(Debug, Error)]
pub enum DebugInfoError {
    /// The document is not valid JSON or misses required fields
    #[error("malformed debug info: {0}")]
    Json(#[from] serde_json::Error),
    /// A method range is not `start-end`
    #[error("invalid range `{range}` in method {method}")]
    InvalidRange {
        /// Method identifier
        method: String,
        /// Offending text
        range: String,
    },
    /// A variable declaration is not `name,type`
    #[error("invalid variable declaration `{0}`")]
    InvalidVariable(String),
    /// A sequence point is not `address[document]line:col-line:col`
    #[error("invalid sequence point `{0}`")]
    InvalidSequencePoint(String),
    /// A sequence point refers to a document that does not exist
    #[error("sequence point `{point}` refers to unknown document {document}")]
    UnknownDocument {
        /// Offending text
        point: String,
        /// Document index
        document: usize,
    },
    /// The optional `hash` field is not a script hash
    #[error("invalid script hash: {0}")]
    InvalidHash(#[from] super::ScriptHashParseError),
}

#[derive(Deserialize)]
struct RawDebugInfo {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    entrypoint: String,
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default)]
    methods: Vec<RawMethod>,
}

#[derive(Deserialize)]
struct RawMethod {
    id: String,
    #[serde(default)]
    namespace: String,
    name: String,
    range: String,
    #[serde(default)]
    params: Vec<String>,
    #[serde(rename = "return", default)]
    return_type: Option<String>,
    #[serde(default)]
    variables: Vec<String>,
    #[serde(rename = "sequence-points", default)]
    sequence_points: Vec<String>,
}

impl DebugInfo {
    /// Parse an `.avmdbgnfo` JSON document.
    ///
    /// The script hash is taken from the optional `hash` field; callers that
    /// know the hash from the loaded script should override it with
    /// [`DebugInfo::with_script_hash`].
    pub fn from_json(json: &str) -> Result<Self, DebugInfoError> {
        let raw: RawDebugInfo = serde_json::from_str(json)?;
        let script_hash = match raw.hash {
            Some(hash) => hash.parse()?,
            None => ScriptHash::default(),
        };

        let document_count = raw.documents.len();
        let methods = raw
            .methods
            .into_iter()
            .map(|method| parse_method(method, script_hash, document_count))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            script_hash,
            entrypoint: raw.entrypoint,
            documents: raw.documents.into_iter().map(PathBuf::from).collect(),
            methods,
        })
    }

    /// Load debug information from a file
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read debug info: {}", path.display()))?;
        let info = Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to parse debug info: {}", path.display()))?;
        debug!(path = %path.display(), methods = info.methods.len(), "Loaded debug info");
        Ok(info)
    }

    /// Re-key the contract and all its methods under `script_hash`
    pub fn with_script_hash(mut self, script_hash: ScriptHash) -> Self {
        self.script_hash = script_hash;
        for method in &mut self.methods {
            method.script_hash = script_hash;
        }
        self
    }

    /// Path of the document a sequence point refers to
    pub fn document(&self, point: &SequencePoint) -> Option<&Path> {
        self.documents.get(point.document).map(PathBuf::as_path)
    }
}

fn parse_method(
    raw: RawMethod,
    script_hash: ScriptHash,
    document_count: usize,
) -> Result<Method, DebugInfoError> {
    let invalid_range =
        || DebugInfoError::InvalidRange { method: raw.id.clone(), range: raw.range.clone() };
    let (start, end) = raw.range.split_once('-').ok_or_else(invalid_range)?;
    let start = start.trim().parse().map_err(|_| invalid_range())?;
    let end = end.trim().parse().map_err(|_| invalid_range())?;

    let mut sequence_points = raw
        .sequence_points
        .iter()
        .map(|text| parse_sequence_point(text, document_count))
        .collect::<Result<Vec<_>, _>>()?;
    sequence_points.sort_by_key(|point| point.address);

    let parameters = parse_variables(&raw.params)?;
    let variables = parse_variables(&raw.variables)?;

    Ok(Method {
        parameters,
        variables,
        id: raw.id,
        namespace: raw.namespace,
        name: raw.name,
        start,
        end,
        return_type: raw.return_type,
        sequence_points,
        script_hash,
    })
}

fn parse_variables(texts: &[String]) -> Result<Vec<VariableDecl>, DebugInfoError> {
    texts.iter().map(String::as_str).map(parse_variable).collect()
}

fn parse_variable(text: &str) -> Result<VariableDecl, DebugInfoError> {
    let (name, type_name) =
        text.split_once(',').ok_or_else(|| DebugInfoError::InvalidVariable(text.to_string()))?;
    Ok(VariableDecl::new(name.trim(), type_name.trim()))
}

/// Parse `address[document]line:col-line:col`
fn parse_sequence_point(
    text: &str,
    document_count: usize,
) -> Result<SequencePoint, DebugInfoError> {
    let invalid = || DebugInfoError::InvalidSequencePoint(text.to_string());

    let (address, rest) = text.split_once('[').ok_or_else(invalid)?;
    let (document, range) = rest.split_once(']').ok_or_else(invalid)?;
    let (start, end) = range.split_once('-').ok_or_else(invalid)?;

    let address = address.trim().parse().map_err(|_| invalid())?;
    let document: usize = document.trim().parse().map_err(|_| invalid())?;
    if document >= document_count {
        return Err(DebugInfoError::UnknownDocument { point: text.to_string(), document });
    }

    Ok(SequencePoint {
        address,
        document,
        start: parse_position(start).ok_or_else(invalid)?,
        end: parse_position(end).ok_or_else(invalid)?,
    })
}

fn parse_position(text: &str) -> Option<SourcePosition> {
    let (line, column) = text.trim().split_once(':')?;
    Some(SourcePosition { line: line.parse().ok()?, column: column.parse().ok()? })
}
