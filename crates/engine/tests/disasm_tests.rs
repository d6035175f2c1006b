use std::collections::HashMap;

use ndb_engine::{
    disasm::{
        decode, disassemble, disassemble_with_width, instructions, DecodeError, NoSyscallNames,
    },
    OpCode, OperandLayout,
};
use tracing::info;

/// A script touching every operand layout
fn mixed_script() -> Vec<u8> {
    let mut script = vec![0x51, 0x02, 0xAB, 0xCD, 0x4C, 0x02, b'h', b'i', 0x62, 0x03, 0x00];
    script.push(0x67);
    script.extend_from_slice(&[0x11; 20]);
    script.extend_from_slice(&[0xE0, 0x01, 0x00, 0xF8, 0xFF]);
    script.extend_from_slice(&[0x68, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]);
    script.push(0x66);
    script
}

#[test]
fn test_push_and_jump_lines() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let script = [0x03, b'a', b'b', b'c', 0x62, 0x05, 0x00];
    let text: Vec<_> = disassemble(&script, &NoSyscallNames).text_lines().collect();
    assert_eq!(text, vec!["000 PUSHBYTES3 61-62-63 # abc", "004 JMP 05-00 # position: 9"]);
}

#[test]
fn test_instruction_sizes_cover_the_script() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let script = mixed_script();
    let decoded: Vec<_> = instructions(&script).collect::<Result<_, _>>().unwrap();

    let opcodes: Vec<_> = decoded.iter().map(|i| i.opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            OpCode::PUSH1,
            OpCode::new(0x02),
            OpCode::PUSHDATA1,
            OpCode::JMP,
            OpCode::APPCALL,
            OpCode::CALL_I,
            OpCode::SYSCALL,
            OpCode::RET,
        ]
    );
    assert_eq!(decoded.iter().map(|i| i.size()).sum::<usize>(), script.len());
    for pair in decoded.windows(2) {
        assert_eq!(pair[0].next_position(), pair[1].position);
    }
}

#[test]
fn test_every_truncation_is_reported() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let script = mixed_script();
    let boundaries: Vec<_> =
        instructions(&script).map(|i| i.unwrap().next_position()).collect();

    for cut in 1..script.len() {
        let prefix = &script[..cut];
        let result = disassemble(prefix, &NoSyscallNames);
        let complete = boundaries.contains(&cut);
        assert_eq!(result.is_complete(), complete, "cut at {cut}");
        for line in &result.lines {
            assert!(line.address < cut);
        }
        if let Some(DecodeError::Truncated { position, needed, available, .. }) = result.truncated
        {
            assert!(available < needed);
            assert_eq!(position + 1 + available, cut);
        }
    }
}

#[test]
fn test_prefixed_length_is_little_endian() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut script = vec![0x4D, 0x00, 0x01];
    script.resize(3 + 256, 0x00);
    let (push, next) = decode(&script, 0).unwrap();
    assert_eq!(push.operand.len(), 256);
    assert_eq!(next, script.len());
    assert_eq!(OpCode::PUSHDATA4.operand_layout(), OperandLayout::Prefixed(4));
}

#[test]
fn test_annotations_with_resolver() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let names: HashMap<u32, String> =
        [(0xEFBEADDE, "System.Runtime.Notify".to_string())].into_iter().collect();
    let result = disassemble(&mixed_script(), &names);
    let annotations: Vec<_> = result.lines.iter().map(|l| l.annotation.as_str()).collect();

    assert!(annotations[0].contains("ambiguous"));
    assert_eq!(annotations[1], "");
    assert_eq!(annotations[2], "hi");
    assert_eq!(annotations[3], "position: 11");
    assert_eq!(annotations[4], format!("0x{}", "11".repeat(20)));
    // CALL_I at 32: 32 + 2 - 8
    assert_eq!(annotations[5], "rvcount: 1, pcount: 0, position: 26");
    assert_eq!(annotations[6], "System.Runtime.Notify");
    assert_eq!(annotations[7], "");
}

#[test]
fn test_address_padding_grows() {
    ndb_common::logging::ensure_test_logging(None);
    info!("Running test");
    let script = vec![0x61; 1200];
    let result = disassemble(&script, &NoSyscallNames);
    assert_eq!(result.text_lines().last().unwrap(), "1199 NOP");
    assert_eq!(result.text_lines().next().unwrap(), "0000 NOP");

    let wide = disassemble_with_width(&[0x66], &NoSyscallNames, 6);
    assert_eq!(wide.to_string(), "000000 RET\n");
}
