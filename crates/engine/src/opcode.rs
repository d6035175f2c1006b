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

//! NeoVM 2.x opcode table.
//!
//! Every opcode carries an [`OperandLayout`] describing how many bytes follow
//! it in the script. The decoder consults only this table.

use std::fmt;

/// How the operand of an opcode is laid out after the opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    /// Exactly `n` operand bytes (`0` for most opcodes)
    Fixed(usize),
    /// The operand width equals the opcode value (`PUSHBYTES1..PUSHBYTES75`)
    Inline,
    /// A little-endian length prefix of `n` bytes followed by that many bytes
    Prefixed(usize),
}

/// A single NeoVM opcode byte
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpCode(u8);

macro_rules! opcodes {
    ($($value:literal => $name:ident),* $(,)?) => {
        impl OpCode {
            $(
                #[allow(missing_docs)]
                pub const $name: Self = Self($value);
            )*

            /// Mnemonic of a named opcode, `None` for push-bytes and unassigned values
            pub const fn name(&self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    0x00 => PUSH0,
    0x4C => PUSHDATA1,
    0x4D => PUSHDATA2,
    0x4E => PUSHDATA4,
    0x4F => PUSHM1,
    0x51 => PUSH1,
    0x52 => PUSH2,
    0x53 => PUSH3,
    0x54 => PUSH4,
    0x55 => PUSH5,
    0x56 => PUSH6,
    0x57 => PUSH7,
    0x58 => PUSH8,
    0x59 => PUSH9,
    0x5A => PUSH10,
    0x5B => PUSH11,
    0x5C => PUSH12,
    0x5D => PUSH13,
    0x5E => PUSH14,
    0x5F => PUSH15,
    0x60 => PUSH16,

    0x61 => NOP,
    0x62 => JMP,
    0x63 => JMPIF,
    0x64 => JMPIFNOT,
    0x65 => CALL,
    0x66 => RET,
    0x67 => APPCALL,
    0x68 => SYSCALL,
    0x69 => TAILCALL,

    0x6A => DUPFROMALTSTACK,
    0x6B => TOALTSTACK,
    0x6C => FROMALTSTACK,
    0x6D => XDROP,
    0x72 => XSWAP,
    0x73 => XTUCK,
    0x74 => DEPTH,
    0x75 => DROP,
    0x76 => DUP,
    0x77 => NIP,
    0x78 => OVER,
    0x79 => PICK,
    0x7A => ROLL,
    0x7B => ROT,
    0x7C => SWAP,
    0x7D => TUCK,

    0x7E => CAT,
    0x7F => SUBSTR,
    0x80 => LEFT,
    0x81 => RIGHT,
    0x82 => SIZE,

    0x83 => INVERT,
    0x84 => AND,
    0x85 => OR,
    0x86 => XOR,
    0x87 => EQUAL,

    0x8B => INC,
    0x8C => DEC,
    0x8D => SIGN,
    0x8F => NEGATE,
    0x90 => ABS,
    0x91 => NOT,
    0x92 => NZ,
    0x93 => ADD,
    0x94 => SUB,
    0x95 => MUL,
    0x96 => DIV,
    0x97 => MOD,
    0x98 => SHL,
    0x99 => SHR,
    0x9A => BOOLAND,
    0x9B => BOOLOR,
    0x9C => NUMEQUAL,
    0x9E => NUMNOTEQUAL,
    0x9F => LT,
    0xA0 => GT,
    0xA1 => LTE,
    0xA2 => GTE,
    0xA3 => MIN,
    0xA4 => MAX,
    0xA5 => WITHIN,

    0xA7 => SHA1,
    0xA8 => SHA256,
    0xA9 => HASH160,
    0xAA => HASH256,
    0xAC => CHECKSIG,
    0xAD => VERIFY,
    0xAE => CHECKMULTISIG,

    0xC0 => ARRAYSIZE,
    0xC1 => PACK,
    0xC2 => UNPACK,
    0xC3 => PICKITEM,
    0xC4 => SETITEM,
    0xC5 => NEWARRAY,
    0xC6 => NEWSTRUCT,
    0xC7 => NEWMAP,
    0xC8 => APPEND,
    0xC9 => REVERSE,
    0xCA => REMOVE,
    0xCB => HASKEY,
    0xCC => KEYS,
    0xCD => VALUES,

    0xE0 => CALL_I,
    0xE1 => CALL_E,
    0xE2 => CALL_ED,
    0xE3 => CALL_ET,
    0xE4 => CALL_EDT,

    0xF0 => THROW,
    0xF1 => THROWIFNOT,
}

impl OpCode {
    /// `PUSHF` shares its value with `PUSH0`
    pub const PUSHF: Self = Self::PUSH0;
    /// `PUSHT` shares its value with `PUSH1`
    pub const PUSHT: Self = Self::PUSH1;

    /// Operand layout of this opcode
    pub const fn operand_layout(&self) -> OperandLayout {
        match self.0 {
            0x01..=0x4B => OperandLayout::Inline,
            // PUSHDATA1, PUSHDATA2, PUSHDATA4
            0x4C => OperandLayout::Prefixed(1),
            0x4D => OperandLayout::Prefixed(2),
            0x4E => OperandLayout::Prefixed(4),
            // JMP, JMPIF, JMPIFNOT, CALL
            0x62..=0x65 => OperandLayout::Fixed(2),
            // APPCALL, TAILCALL
            0x67 | 0x69 => OperandLayout::Fixed(20),
            // SYSCALL
            0x68 => OperandLayout::Prefixed(1),
            // CALL_I
            0xE0 => OperandLayout::Fixed(4),
            // CALL_E, CALL_ET
            0xE1 | 0xE3 => OperandLayout::Fixed(22),
            // CALL_ED, CALL_EDT
            0xE2 | 0xE4 => OperandLayout::Fixed(2),
            _ => OperandLayout::Fixed(0),
        }
    }

    /// Wrap a raw opcode byte
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw opcode byte
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// `PUSHBYTES1` through `PUSHBYTES75`
    pub const fn is_push_bytes(&self) -> bool {
        matches!(self.0, 0x01..=0x4B)
    }

    /// Any opcode pushing a literal byte string
    pub const fn is_push_data(&self) -> bool {
        self.is_push_bytes() || matches!(self.0, 0x4C..=0x4E)
    }

    /// Whether the value is assigned in the instruction set
    pub const fn is_valid(&self) -> bool {
        self.is_push_bytes() || self.name().is_some()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None if self.is_push_bytes() => write!(f, "PUSHBYTES{}", self.0),
            None => write!(f, "UNKNOWN(0x{:02x})", self.0),
        }
    }
}

impl fmt::Debug for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpCode({self})")
    }
}

impl From<u8> for OpCode {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
