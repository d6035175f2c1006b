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

//! NeoVM bytecode disassembly utilities
//!
//! Decoding is stateless: [`decode`] reads one instruction at a position and
//! returns the position of the next one, borrowing the operand from the
//! script. [`instructions`] repeats that over a whole script as a restartable
//! iterator. A script truncated in the middle of an operand yields a
//! [`DecodeError`] and decoding stops there; operands are never padded.
//!
//! Rendering ([`render`]) turns an instruction into a [`DisassemblyLine`] with
//! an opcode-specific annotation computed from the position and operand:
//! branch targets, script hashes, syscall names and push literals.

use std::{collections::HashMap, fmt};

use itertools::Itertools;
use ndb_common::ScriptHash;
use thiserror::Error;
use tracing::debug;

use crate::{OpCode, OperandLayout};

/// Minimum width of the zero-padded address column
pub const MIN_ADDRESS_WIDTH: usize = 3;

/// A single decoded instruction borrowing its operand from the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    /// Address of the opcode byte
    pub position: usize,
    /// The opcode
    pub opcode: OpCode,
    /// Operand payload, excluding any length prefix
    pub operand: &'a [u8],
}

impl Instruction<'_> {
    /// Total encoded size: opcode, length prefix and operand
    pub fn size(&self) -> usize {
        let prefix = match self.opcode.operand_layout() {
            OperandLayout::Prefixed(width) => width,
            OperandLayout::Fixed(_) | OperandLayout::Inline => 0,
        };
        1 + prefix + self.operand.len()
    }

    /// Address of the following instruction
    pub fn next_position(&self) -> usize {
        self.position + self.size()
    }
}

/// Errors raised while decoding a script
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes remain than the opcode declares
    #[error(
        "instruction {opcode} at {position} is truncated: needs {needed} bytes, {available} available"
    )]
    Truncated {
        /// Address of the truncated instruction
        position: usize,
        /// Its opcode
        opcode: OpCode,
        /// Bytes required after the opcode byte
        needed: usize,
        /// Bytes actually present after the opcode byte
        available: usize,
    },
    /// The start position is not inside the script
    #[error("position {position} is outside of the script ({len} bytes)")]
    OutOfRange {
        /// Requested position
        position: usize,
        /// Script length
        len: usize,
    },
}

/// Decode the instruction at `position`, returning it with the next read position
pub fn decode(script: &[u8], position: usize) -> Result<(Instruction<'_>, usize), DecodeError> {
    let Some(&byte) = script.get(position) else {
        return Err(DecodeError::OutOfRange { position, len: script.len() });
    };
    let opcode = OpCode::new(byte);
    let rest = &script[position + 1..];

    let truncated =
        |needed: usize| DecodeError::Truncated { position, opcode, needed, available: rest.len() };

    let (prefix, width) = match opcode.operand_layout() {
        OperandLayout::Fixed(width) => (0, width),
        OperandLayout::Inline => (0, byte as usize),
        OperandLayout::Prefixed(prefix) => {
            let Some(length) = rest.get(..prefix) else {
                return Err(truncated(prefix));
            };
            let width = length.iter().rev().fold(0usize, |acc, b| (acc << 8) | *b as usize);
            (prefix, width)
        }
    };

    let operand = rest
        .get(prefix..)
        .and_then(|tail| tail.get(..width))
        .ok_or_else(|| truncated(prefix.saturating_add(width)))?;

    let instruction = Instruction { position, opcode, operand };
    Ok((instruction, instruction.next_position()))
}

/// Iterate over every instruction of `script` starting at address zero
pub fn instructions(script: &[u8]) -> Instructions<'_> {
    Instructions { script, position: 0, done: false }
}

/// Lazy instruction sequence over a borrowed script.
///
/// Yields `Err` at most once, then ends. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    script: &'a [u8],
    position: usize,
    done: bool,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.position >= self.script.len() {
            return None;
        }
        match decode(self.script, self.position) {
            Ok((instruction, next)) => {
                self.position = next;
                Some(Ok(instruction))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Resolves a 32-bit interop hash to a readable syscall name
pub trait SyscallResolver {
    /// Name registered for `hash`, if any
    fn resolve(&self, hash: u32) -> Option<String>;
}

impl<F> SyscallResolver for F
where
    F: Fn(u32) -> Option<String>,
{
    fn resolve(&self, hash: u32) -> Option<String> {
        self(hash)
    }
}

impl SyscallResolver for HashMap<u32, String> {
    fn resolve(&self, hash: u32) -> Option<String> {
        self.get(&hash).cloned()
    }
}

/// Resolver that knows no names; hashed syscalls render as their hash
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSyscallNames;

impl SyscallResolver for NoSyscallNames {
    fn resolve(&self, _hash: u32) -> Option<String> {
        None
    }
}

/// One rendered disassembly row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassemblyLine {
    /// Instruction address
    pub address: usize,
    /// Opcode mnemonic
    pub mnemonic: String,
    /// Dash separated operand bytes, empty without operand
    pub operand_hex: String,
    /// Opcode specific comment, empty when there is nothing to say
    pub annotation: String,
}

impl DisassemblyLine {
    /// `<address> <mnemonic> [<operand>] [# <annotation>]` with the address padded to `width`
    pub fn format(&self, width: usize) -> String {
        let mut line = format!("{:0width$} {}", self.address, self.mnemonic);
        if !self.operand_hex.is_empty() {
            line.push(' ');
            line.push_str(&self.operand_hex);
        }
        if !self.annotation.is_empty() {
            line.push_str(" # ");
            line.push_str(&self.annotation);
        }
        line
    }
}

impl fmt::Display for DisassemblyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(MIN_ADDRESS_WIDTH))
    }
}

/// Render one instruction
pub fn render<R>(instruction: &Instruction<'_>, resolver: &R) -> DisassemblyLine
where
    R: SyscallResolver + ?Sized,
{
    DisassemblyLine {
        address: instruction.position,
        mnemonic: instruction.opcode.to_string(),
        operand_hex: operand_hex(instruction.operand),
        annotation: annotate(instruction, resolver),
    }
}

/// Dash separated upper-case hex, as in `61-62-63`
pub fn operand_hex(operand: &[u8]) -> String {
    operand.iter().map(|b| format!("{b:02X}")).join("-")
}

fn annotate<R>(instruction: &Instruction<'_>, resolver: &R) -> String
where
    R: SyscallResolver + ?Sized,
{
    let Instruction { position, opcode, operand } = *instruction;
    match opcode {
        OpCode::PUSH0 => "PUSH0 or PUSHF: integer 0 or boolean false (ambiguous)".to_string(),
        OpCode::PUSH1 => "PUSH1 or PUSHT: integer 1 or boolean true (ambiguous)".to_string(),
        op if op.is_push_data() => printable_text(operand).unwrap_or_default(),
        OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT | OpCode::CALL => {
            branch_target(position, operand, 0)
                .map(|target| format!("position: {target}"))
                .unwrap_or_default()
        }
        OpCode::APPCALL | OpCode::TAILCALL => {
            ScriptHash::from_slice(operand).map(|hash| hash.to_string()).unwrap_or_default()
        }
        OpCode::CALL_I => {
            let mut fields = call_counts(operand);
            // The offset is counted from the byte after the two count bytes.
            if let Some(target) = operand.get(2..).and_then(|rest| branch_target(position, rest, 2))
            {
                fields.push(format!("position: {target}"));
            }
            fields.join(", ")
        }
        OpCode::CALL_E | OpCode::CALL_ET => {
            let mut fields = call_counts(operand);
            if let Some(hash) = operand.get(2..).and_then(ScriptHash::from_slice) {
                fields.push(hash.to_string());
            }
            fields.join(", ")
        }
        OpCode::CALL_ED | OpCode::CALL_EDT => call_counts(operand).join(", "),
        OpCode::SYSCALL => syscall_name(operand, resolver),
        _ => String::new(),
    }
}

/// `position + extra + i16 LE offset`
fn branch_target(position: usize, operand: &[u8], extra: i64) -> Option<i64> {
    let offset = i16::from_le_bytes(operand.get(..2)?.try_into().ok()?);
    Some(position as i64 + extra + offset as i64)
}

fn call_counts(operand: &[u8]) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(rvcount) = operand.first() {
        fields.push(format!("rvcount: {rvcount}"));
    }
    if let Some(pcount) = operand.get(1) {
        fields.push(format!("pcount: {pcount}"));
    }
    fields
}

fn syscall_name<R>(operand: &[u8], resolver: &R) -> String
where
    R: SyscallResolver + ?Sized,
{
    match <[u8; 4]>::try_from(operand) {
        Ok(bytes) => {
            let hash = u32::from_le_bytes(bytes);
            resolver.resolve(hash).unwrap_or_else(|| format!("hash: 0x{hash:08x}"))
        }
        Err(_) => String::from_utf8_lossy(operand).into_owned(),
    }
}

fn printable_text(operand: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(operand).ok()?;
    (!text.is_empty() && !text.chars().any(char::is_control)).then(|| text.to_string())
}

/// A rendered script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Decoded lines in address order
    pub lines: Vec<DisassemblyLine>,
    /// Set when decoding stopped before the end of the script
    pub truncated: Option<DecodeError>,
    /// Width of the zero-padded address column
    pub address_width: usize,
}

impl Disassembly {
    /// Line of the instruction starting at `address`
    pub fn line_at(&self, address: usize) -> Option<&DisassemblyLine> {
        self.lines.binary_search_by_key(&address, |line| line.address).ok().map(|i| &self.lines[i])
    }

    /// Whether the whole script decoded
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }

    /// Formatted text lines
    pub fn text_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().map(|line| line.format(self.address_width))
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.text_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Address column width for a script of `len` bytes
pub fn address_width(len: usize, min_width: usize) -> usize {
    len.to_string().len().max(min_width)
}

/// Disassemble a whole script.
///
/// Stops at the first undecodable instruction and records why in
/// [`Disassembly::truncated`]; everything before it is kept.
///
/// # Examples
/// ```rust
/// use ndb_engine::disasm::{disassemble, NoSyscallNames};
///
/// let script = [0x03, b'a', b'b', b'c', 0x62, 0x05, 0x00];
/// let text: Vec<_> = disassemble(&script, &NoSyscallNames).text_lines().collect();
/// assert_eq!(text, ["000 PUSHBYTES3 61-62-63 # abc", "004 JMP 05-00 # position: 9"]);
/// ```
pub fn disassemble<R>(script: &[u8], resolver: &R) -> Disassembly
where
    R: SyscallResolver + ?Sized,
{
    disassemble_with_width(script, resolver, MIN_ADDRESS_WIDTH)
}

/// [`disassemble`] with a custom minimum address width
pub fn disassemble_with_width<R>(script: &[u8], resolver: &R, min_width: usize) -> Disassembly
where
    R: SyscallResolver + ?Sized,
{
    let mut lines = Vec::new();
    let mut truncated = None;

    for result in instructions(script) {
        match result {
            Ok(instruction) => lines.push(render(&instruction, resolver)),
            Err(err) => {
                debug!(error = %err, "Stopping disassembly");
                truncated = Some(err);
            }
        }
    }

    Disassembly { lines, truncated, address_width: address_width(script.len(), min_width) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fixed_and_inline() {
        let script = [0x03, b'a', b'b', b'c', 0x62, 0x05, 0x00, 0x66];
        let (first, next) = decode(&script, 0).unwrap();
        assert_eq!(first.opcode, OpCode::new(0x03));
        assert_eq!(first.operand, b"abc");
        assert_eq!(next, 4);

        let (jmp, next) = decode(&script, next).unwrap();
        assert_eq!(jmp.opcode, OpCode::JMP);
        assert_eq!(jmp.operand, [0x05, 0x00]);
        assert_eq!(next, 7);

        let (ret, next) = decode(&script, next).unwrap();
        assert_eq!(ret.opcode, OpCode::RET);
        assert!(ret.operand.is_empty());
        assert_eq!(next, script.len());
    }

    #[test]
    fn test_decode_prefixed() {
        let script = [0x4D, 0x02, 0x00, 0xAA, 0xBB, 0x68, 0x04, 1, 2, 3, 4];
        let (push, next) = decode(&script, 0).unwrap();
        assert_eq!(push.opcode, OpCode::PUSHDATA2);
        assert_eq!(push.operand, [0xAA, 0xBB]);
        assert_eq!(push.size(), 5);
        let (syscall, next) = decode(&script, next).unwrap();
        assert_eq!(syscall.operand, [1, 2, 3, 4]);
        assert_eq!(next, script.len());
    }

    #[test]
    fn test_truncated_operand_is_an_error() {
        let script = [0x62, 0x05];
        assert_eq!(
            decode(&script, 0),
            Err(DecodeError::Truncated {
                position: 0,
                opcode: OpCode::JMP,
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_truncated_length_prefix() {
        let script = [0x4E, 0x01, 0x00];
        assert!(matches!(decode(&script, 0), Err(DecodeError::Truncated { needed: 4, .. })));
        let script = [0x4C, 0x05, 0x01];
        assert!(matches!(
            decode(&script, 0),
            Err(DecodeError::Truncated { needed: 6, available: 2, .. })
        ));
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(decode(&[0x66], 1), Err(DecodeError::OutOfRange { position: 1, len: 1 }));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let script = [0x66, 0x65, 0x01];
        let items: Vec<_> = instructions(&script).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn test_iterator_is_restartable() {
        let script = [0x61, 0x61, 0x66];
        let iter = instructions(&script);
        let first: Vec<_> = iter.clone().map(|i| i.unwrap().position).collect();
        let second: Vec<_> = iter.map(|i| i.unwrap().position).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_branch_annotations() {
        let script = [0x61, 0x61, 0x63, 0xFE, 0xFF];
        let lines = disassemble(&script, &NoSyscallNames).lines;
        assert_eq!(lines[2].annotation, "position: 0");
    }

    #[test]
    fn test_call_i_annotation() {
        let script = [0xE0, 0x01, 0x02, 0x0A, 0x00];
        let line = &disassemble(&script, &NoSyscallNames).lines[0];
        assert_eq!(line.annotation, "rvcount: 1, pcount: 2, position: 12");
    }

    #[test]
    fn test_call_e_and_appcall_annotation() {
        let mut raw = [0u8; 20];
        raw[0] = 0xAB;
        let hash = ScriptHash::new(raw);

        let mut call_e = vec![0xE1, 0x00, 0x03];
        call_e.extend_from_slice(&raw);
        let line = &disassemble(&call_e, &NoSyscallNames).lines[0];
        assert_eq!(line.annotation, format!("rvcount: 0, pcount: 3, {hash}"));

        let mut appcall = vec![0x67];
        appcall.extend_from_slice(&raw);
        let line = &disassemble(&appcall, &NoSyscallNames).lines[0];
        assert_eq!(line.annotation, hash.to_string());

        let line = &disassemble(&[0xE2, 0x01, 0x00], &NoSyscallNames).lines[0];
        assert_eq!(line.annotation, "rvcount: 1, pcount: 0");
    }

    #[test]
    fn test_syscall_annotations() {
        let names: HashMap<u32, String> =
            [(0x04030201, "Neo.Storage.Get".to_string())].into_iter().collect();
        let hashed = [0x68, 0x04, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(disassemble(&hashed, &names).lines[0].annotation, "Neo.Storage.Get");
        assert_eq!(
            disassemble(&hashed, &NoSyscallNames).lines[0].annotation,
            "hash: 0x04030201"
        );

        let mut named = vec![0x68, 0x0F];
        named.extend_from_slice(b"Neo.Runtime.Log");
        let resolver = |_: u32| -> Option<String> { panic!("named syscalls are not hashed") };
        assert_eq!(disassemble(&named, &resolver).lines[0].annotation, "Neo.Runtime.Log");
    }

    #[test]
    fn test_ambiguous_push_annotations() {
        let lines = disassemble(&[0x00, 0x51, 0x52], &NoSyscallNames).lines;
        assert!(lines[0].annotation.contains("PUSHF"));
        assert!(lines[1].annotation.contains("PUSHT"));
        assert!(lines[2].annotation.is_empty());
    }

    #[test]
    fn test_push_non_text_has_no_annotation() {
        let line = &disassemble(&[0x02, 0x00, 0xFF], &NoSyscallNames).lines[0];
        assert_eq!(line.operand_hex, "00-FF");
        assert!(line.annotation.is_empty());
    }

    #[test]
    fn test_disassembly_keeps_prefix_before_truncation() {
        let script = [0x03, b'a', b'b', b'c', 0x62, 0x05];
        let result = disassemble(&script, &NoSyscallNames);
        assert_eq!(result.lines.len(), 1);
        assert!(!result.is_complete());
        assert!(matches!(result.truncated, Some(DecodeError::Truncated { position: 4, .. })));
    }

    #[test]
    fn test_format_line() {
        let script = [0x03, b'a', b'b', b'c', 0x62, 0x05, 0x00];
        let result = disassemble(&script, &NoSyscallNames);
        let text: Vec<_> = result.text_lines().collect();
        assert_eq!(text, vec!["000 PUSHBYTES3 61-62-63 # abc", "004 JMP 05-00 # position: 9"]);
        assert_eq!(result.line_at(4).unwrap().mnemonic, "JMP");
        assert!(result.line_at(5).is_none());
    }

    #[test]
    fn test_address_width_grows_with_script() {
        assert_eq!(address_width(7, 3), 3);
        assert_eq!(address_width(12345, 3), 5);
        assert_eq!(address_width(7, 4), 4);
    }
}
