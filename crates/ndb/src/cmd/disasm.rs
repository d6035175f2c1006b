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

use std::path::Path;

use eyre::{Result, WrapErr};
use ndb_engine::{disasm::disassemble_with_width, DebuggerConfig};

use crate::interop::InteropNames;

/// Print the disassembly of a script.
///
/// Everything up to a truncated instruction is printed before the error.
pub fn run(script: &Path, as_hex: bool, config: Option<&Path>) -> Result<()> {
    let config_path = match config {
        Some(path) => path.to_path_buf(),
        None => DebuggerConfig::config_path()?,
    };
    let config = DebuggerConfig::load(&config_path)
        .wrap_err_with(|| format!("Failed to load {}", config_path.display()))?;

    let bytes = super::read_script(script, as_hex)?;
    let resolver = InteropNames::builtin();
    let disassembly = disassemble_with_width(&bytes, &resolver, config.address_width);
    print!("{disassembly}");

    match disassembly.truncated {
        Some(err) => Err(err).wrap_err_with(|| format!("{} is truncated", script.display())),
        None => {
            tracing::debug!(instructions = disassembly.lines.len(), "Disassembly complete");
            Ok(())
        }
    }
}
