//! Text formatting for everything the console shows about the machine.
//! Each function returns complete lines (newline terminated) for the caller to emit.
use crate::args::{ArgList, ArgumentValue};
use crate::registers::{ExecutionMode, Psr, RegisterFile};
use crate::target::{Disassembler, Memory, Target};
use std::fmt::Write;

/// Four rows of four registers: r0-r3, r4-r7, r8-r11, r12-r15.
pub fn registers(reg: &RegisterFile) -> String {
    let mut s = String::new();
    for row in reg.gprs.chunks(4) {
        let line: Vec<String> = row.iter().map(|r| format!("{:08X}", r)).collect();
        _ = writeln!(s, "{}", line.join(" "));
    }
    s
}

pub fn psr(psr: &Psr) -> String { format!("{}\n", psr) }

/// One disassembled instruction: the raw bits (word or halfword, per mode) then the text.
pub fn instruction_line<M: Memory + ?Sized>(
    mem: &M,
    decoder: &dyn Disassembler,
    address: u32,
    mode: ExecutionMode,
) -> String {
    let next_address = address.wrapping_add(2 * mode.instruction_width());
    match mode {
        ExecutionMode::Arm => {
            let bits = mem.load_u32(address);
            let info = decoder.decode(bits, mode);
            format!("{:08X}: {}\n", bits, decoder.render(&info, next_address))
        }
        ExecutionMode::Thumb => {
            let bits = mem.load_u16(address);
            let info = decoder.decode(bits as u32, mode);
            format!("{:04X}: {}\n", bits, decoder.render(&info, next_address))
        }
    }
}

/// Registers, status word, then the instruction about to execute.
pub fn status(target: &dyn Target, decoder: &dyn Disassembler) -> String {
    let reg = target.registers();
    let mode = reg.cpsr.mode();
    let mut s = registers(reg);
    s.push_str(&psr(&reg.cpsr));
    s.push_str(&instruction_line(target, decoder, reg.current_instruction(), mode));
    s
}

pub fn byte(value: u8) -> String { format!(" 0x{:02X}\n", value) }
pub fn halfword(value: u16) -> String { format!(" 0x{:04X}\n", value) }
pub fn word(value: u32) -> String { format!(" 0x{:08X}\n", value) }

/// Each integer argument in decimal, or as 8 hex digits when `hex` is set.
pub fn values(args: &ArgList, hex: bool) -> String {
    let mut s = String::new();
    for v in args {
        if let ArgumentValue::Int(v) = v {
            _ = if hex { write!(s, " 0x{:08X}", v) } else { write!(s, " {}", v) };
        }
    }
    s.push('\n');
    s
}
