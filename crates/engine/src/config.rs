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

//! Debugger presentation settings.
//!
//! Stored as TOML, by default at `~/.ndb.toml`. Every field has a default so a
//! partial file is valid.

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::disasm::MIN_ADDRESS_WIDTH;

/// Configuration of the introspection engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Minimum width of the zero-padded disassembly address column
    pub address_width: usize,
    /// Tag storage key/value buffers with their content hash
    pub hash_storage_buffers: bool,
    /// Maximum number of per-byte children of a byte buffer, `0` for no limit
    pub max_byte_children: usize,
    /// Expose the raw alt stack as a scope next to the locals
    pub show_alt_stack: bool,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            address_width: MIN_ADDRESS_WIDTH,
            hash_storage_buffers: true,
            max_byte_children: 0,
            show_alt_stack: true,
        }
    }
}

impl DebuggerConfig {
    /// Default config location (`~/.ndb.toml`)
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".ndb.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).wrap_err("Failed to parse config file as TOML")
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file not found at {path:?}, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {path:?}"))?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {path:?}");
        Ok(config)
    }

    /// Write to `path` as pretty TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).wrap_err("Failed to serialize config to TOML")?;
        fs::write(path, content)
            .wrap_err_with(|| format!("Failed to write config file: {path:?}"))?;
        debug!("Saved configuration to {path:?}");
        Ok(())
    }

    /// Set the minimum address width
    pub fn with_address_width(mut self, width: usize) -> Self {
        self.address_width = width;
        self
    }

    /// Enable or disable content-hash tags on storage buffers
    pub fn with_hash_storage_buffers(mut self, enabled: bool) -> Self {
        self.hash_storage_buffers = enabled;
        self
    }

    /// Cap the number of per-byte children, `0` for no limit
    pub fn with_max_byte_children(mut self, limit: usize) -> Self {
        self.max_byte_children = limit;
        self
    }

    /// Show or hide the alt stack scope
    pub fn with_alt_stack(mut self, show: bool) -> Self {
        self.show_alt_stack = show;
        self
    }

    /// Byte child limit as an option
    pub fn byte_child_limit(&self) -> Option<usize> {
        (self.max_byte_children > 0).then_some(self.max_byte_children)
    }
}
