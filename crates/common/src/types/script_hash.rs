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

//! Contract identity.

use std::{fmt, str::FromStr};

use alloy_primitives::{hex, FixedBytes};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 20-byte script hash identifying a deployed contract.
///
/// The bytes are stored little-endian, as they appear in an `APPCALL`
/// operand. The textual form prints them reversed behind a `0x` prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScriptHash(pub FixedBytes<20>);

impl ScriptHash {
    /// Size of a script hash in bytes
    pub const LEN: usize = 20;

    /// Wrap raw little-endian bytes
    pub fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(FixedBytes::new(bytes))
    }

    /// Build a script hash from an operand slice, `None` unless exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; Self::LEN]>::try_from(bytes).ok().map(Self::new)
    }

    /// Raw little-endian bytes
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0 .0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

/// Errors produced when parsing the textual form of a [`ScriptHash`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptHashParseError {
    /// The string is not valid hexadecimal
    #[error("invalid script hash hex: {0}")]
    InvalidHex(String),
    /// The decoded value has the wrong size
    #[error("script hash must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for ScriptHash {
    type Err = ScriptHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes =
            hex::decode(digits).map_err(|e| ScriptHashParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != Self::LEN {
            return Err(ScriptHashParseError::InvalidLength(bytes.len()));
        }
        bytes.reverse();
        Self::from_slice(&bytes).ok_or(ScriptHashParseError::InvalidLength(bytes.len()))
    }
}

impl From<ScriptHash> for String {
    fn from(hash: ScriptHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ScriptHash {
    type Error = ScriptHashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
