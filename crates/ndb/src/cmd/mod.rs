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

//! Subcommand implementations.

pub mod disasm;
pub mod source;

use std::{fs, path::Path};

use alloy_primitives::hex;
use eyre::{Result, WrapErr};

/// Read a script file, either raw bytes or hex text
pub fn read_script(path: &Path, as_hex: bool) -> Result<Vec<u8>> {
    if !as_hex {
        return fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()));
    }

    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    hex::decode(text.trim()).wrap_err_with(|| format!("{} is not valid hex", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_hex_and_raw_scripts() {
        let dir = tempfile::tempdir().unwrap();

        let hex_path = dir.path().join("script.hex");
        fs::write(&hex_path, "0x036162630a\n").unwrap();
        assert_eq!(read_script(&hex_path, true).unwrap(), vec![0x03, 0x61, 0x62, 0x63, 0x0A]);

        let raw_path = dir.path().join("script.avm");
        fs::write(&raw_path, [0x61, 0x66]).unwrap();
        assert_eq!(read_script(&raw_path, false).unwrap(), vec![0x61, 0x66]);

        fs::write(&hex_path, "xyz").unwrap();
        assert!(read_script(&hex_path, true).is_err());
    }
}
