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

use eyre::Result;
use ndb_common::DebugInfo;
use ndb_engine::{
    disasm::{decode, render},
    SourceResolver,
};

use crate::interop::InteropNames;

/// Print the method, source range and instruction at `ip`
pub fn run(script: &Path, debug_info: &Path, ip: usize, as_hex: bool) -> Result<()> {
    let bytes = super::read_script(script, as_hex)?;
    let info = DebugInfo::load(debug_info)?;

    let Some(location) = info.source_location(ip)? else {
        println!("method: <none>");
        tracing::warn!(ip, "No method contains the address");
        return print_instruction(&bytes, ip);
    };

    println!("method: {}", location.method.qualified_name());
    match (location.sequence_point, location.document) {
        (Some(point), document) => {
            let document = document.map(|d| d.display().to_string()).unwrap_or_default();
            println!(
                "source: {document}:{}:{}-{}:{}",
                point.start.line, point.start.column, point.end.line, point.end.column
            );
        }
        (None, _) => println!("source: <none>"),
    }
    print_instruction(&bytes, ip)
}

fn print_instruction(script: &[u8], ip: usize) -> Result<()> {
    let (instruction, _) = decode(script, ip)?;
    println!("instruction: {}", render(&instruction, &InteropNames::builtin()));
    Ok(())
}
