//! Decoder and renderer for the ARM/Thumb instruction subset the reference machine executes.
use crate::registers::{reg_name, ExecutionMode};
use crate::target::Disassembler;

/// The operations the reference machine understands. Offsets are already scaled to bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Mov { rd: u32, imm: u32 },
    Add { rd: u32, rn: u32, imm: u32 },
    Sub { rd: u32, rn: u32, imm: u32 },
    Ldr { rd: u32, rn: u32, offset: i32 },
    Str { rd: u32, rn: u32, offset: i32 },
    B { offset: i32, link: bool },
    Bx { rm: u32 },
    Undefined,
}

/// A decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionInfo {
    pub mode: ExecutionMode,
    pub bits: u32,
    pub op: Op,
    /// true if the instruction updates the status flags
    pub set_flags: bool,
}
impl InstructionInfo {
    /// Branch destination for a `B`/`BL` when the instruction sees `next_address` in the PC.
    pub fn branch_target(&self, next_address: u32) -> Option<u32> {
        match self.op {
            Op::B { offset, .. } => Some(next_address.wrapping_add(offset as u32)),
            _ => None,
        }
    }
    pub fn render(&self, next_address: u32) -> String {
        let s = if self.set_flags { "s" } else { "" };
        match self.op {
            Op::Mov { rd, imm } => format!("mov{} {}, #0x{:X}", s, reg_name(rd), imm),
            Op::Add { rd, rn, imm } => format!("add{} {}, {}, #0x{:X}", s, reg_name(rd), reg_name(rn), imm),
            Op::Sub { rd, rn, imm } => format!("sub{} {}, {}, #0x{:X}", s, reg_name(rd), reg_name(rn), imm),
            Op::Ldr { rd, rn, offset } => format!("ldr {}, {}", reg_name(rd), render_address(rn, offset)),
            Op::Str { rd, rn, offset } => format!("str {}, {}", reg_name(rd), render_address(rn, offset)),
            Op::B { link, .. } => format!(
                "{} 0x{:08X}",
                if link { "bl" } else { "b" },
                self.branch_target(next_address).unwrap_or_default()
            ),
            Op::Bx { rm } => format!("bx {}", reg_name(rm)),
            Op::Undefined => "undefined".to_string(),
        }
    }
}

fn render_address(rn: u32, offset: i32) -> String {
    match offset {
        0 => format!("[{}]", reg_name(rn)),
        o if o < 0 => format!("[{}, #-0x{:X}]", reg_name(rn), o.unsigned_abs()),
        o => format!("[{}, #0x{:X}]", reg_name(rn), o),
    }
}

/// Sign extend the low `width` bits of `v`.
fn sign_extend(v: u32, width: u32) -> i32 { ((v << (32 - width)) as i32) >> (32 - width) }

pub fn decode(bits: u32, mode: ExecutionMode) -> InstructionInfo {
    let (op, set_flags) = match mode {
        ExecutionMode::Arm => decode_arm(bits),
        ExecutionMode::Thumb => decode_thumb(bits & 0xffff),
    };
    InstructionInfo { mode, bits, op, set_flags }
}

fn decode_arm(b: u32) -> (Op, bool) {
    // only "always" is supported
    if bits!(b, 28, 4) != 0xe {
        return (Op::Undefined, false);
    }
    if b & 0x0fff_fff0 == 0x012f_ff10 {
        return (Op::Bx { rm: bits!(b, 0, 4) }, false);
    }
    if bits!(b, 25, 3) == 0b101 {
        let offset = sign_extend(bits!(b, 0, 24), 24) << 2;
        return (Op::B { offset, link: bit!(b, 24) }, false);
    }
    let rn = bits!(b, 16, 4);
    let rd = bits!(b, 12, 4);
    match bits!(b, 25, 3) {
        // data processing, immediate operand
        0b001 => {
            let imm = bits!(b, 0, 8).rotate_right(2 * bits!(b, 8, 4));
            let s = bit!(b, 20);
            match bits!(b, 21, 4) {
                0b1101 => (Op::Mov { rd, imm }, s),
                0b0100 => (Op::Add { rd, rn, imm }, s),
                0b0010 => (Op::Sub { rd, rn, imm }, s),
                _ => (Op::Undefined, false),
            }
        }
        // single data transfer, immediate offset
        0b010 => {
            // pre-indexed word access without write-back
            if !bit!(b, 24) || bit!(b, 22) || bit!(b, 21) {
                return (Op::Undefined, false);
            }
            let magnitude = bits!(b, 0, 12) as i32;
            let offset = if bit!(b, 23) { magnitude } else { -magnitude };
            if bit!(b, 20) {
                (Op::Ldr { rd, rn, offset }, false)
            } else {
                (Op::Str { rd, rn, offset }, false)
            }
        }
        _ => (Op::Undefined, false),
    }
}

fn decode_thumb(b: u32) -> (Op, bool) {
    if b & 0xff87 == 0x4700 {
        return (Op::Bx { rm: bits!(b, 3, 4) }, false);
    }
    let rd8 = bits!(b, 8, 3);
    let imm8 = bits!(b, 0, 8);
    let rd = bits!(b, 0, 3);
    let rn = bits!(b, 3, 3);
    let offset = (bits!(b, 6, 5) * 4) as i32;
    match bits!(b, 11, 5) {
        0b00100 => (Op::Mov { rd: rd8, imm: imm8 }, true),
        0b00110 => (Op::Add { rd: rd8, rn: rd8, imm: imm8 }, true),
        0b00111 => (Op::Sub { rd: rd8, rn: rd8, imm: imm8 }, true),
        0b01100 => (Op::Str { rd, rn, offset }, false),
        0b01101 => (Op::Ldr { rd, rn, offset }, false),
        0b11100 => (Op::B { offset: sign_extend(bits!(b, 0, 11), 11) << 1, link: false }, false),
        _ => (Op::Undefined, false),
    }
}

/// The decoder the console uses by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disasm;
impl Disassembler for Disasm {
    fn decode(&self, bits: u32, mode: ExecutionMode) -> InstructionInfo { decode(bits, mode) }
    fn render(&self, info: &InstructionInfo, next_address: u32) -> String { info.render(next_address) }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn arm(bits: u32, addr: u32) -> String { decode(bits, ExecutionMode::Arm).render(addr + 8) }
    fn thumb(bits: u32, addr: u32) -> String { decode(bits, ExecutionMode::Thumb).render(addr + 4) }
    #[test]
    fn arm_data_processing() {
        assert_eq!(arm(0xe3a00001, 0), "mov r0, #0x1");
        assert_eq!(arm(0xe3a004ff, 0), "mov r0, #0xFF000000");
        assert_eq!(arm(0xe2812004, 0), "add r2, r1, #0x4");
        assert_eq!(arm(0xe2522001, 0), "subs r2, r2, #0x1");
    }
    #[test]
    fn arm_transfers_and_branches() {
        assert_eq!(arm(0xe5910004, 0), "ldr r0, [r1, #0x4]");
        assert_eq!(arm(0xe5010008, 0), "str r0, [r1, #-0x8]");
        assert_eq!(arm(0xe59d0000, 0), "ldr r0, [sp]");
        assert_eq!(arm(0xeafffffe, 0x100), "b 0x00000100");
        assert_eq!(arm(0xeb000001, 0), "bl 0x0000000C");
        assert_eq!(arm(0xe12fff1e, 0), "bx lr");
    }
    #[test]
    fn arm_unsupported_is_undefined() {
        // conditional, register operand, byte transfer, write-back
        for bits in [0x1a000000, 0xe0810002, 0xe5d10000, 0xe5b10004] {
            assert_eq!(decode(bits, ExecutionMode::Arm).op, Op::Undefined, "{:08X}", bits);
        }
        assert_eq!(arm(0x1a000000, 0), "undefined");
    }
    #[test]
    fn thumb_subset() {
        assert_eq!(thumb(0x2005, 0), "movs r0, #0x5");
        assert_eq!(thumb(0x3101, 0), "adds r1, r1, #0x1");
        assert_eq!(thumb(0x3a02, 0), "subs r2, r2, #0x2");
        assert_eq!(thumb(0x6848, 0), "ldr r0, [r1, #0x4]");
        assert_eq!(thumb(0x6008, 0), "str r0, [r1]");
        assert_eq!(thumb(0xe7fe, 0x200), "b 0x00000200");
        assert_eq!(thumb(0x4708, 0), "bx r1");
        assert_eq!(thumb(0xdf00, 0), "undefined");
    }
    #[test]
    fn thumb_ignores_upper_half() {
        assert_eq!(decode(0xffff_2005, ExecutionMode::Thumb).op, Op::Mov { rd: 0, imm: 5 });
    }
    #[test]
    fn trait_object_renders() {
        let d: &dyn Disassembler = &Disasm;
        let info = d.decode(0xeafffffe, ExecutionMode::Arm);
        assert_eq!(d.render(&info, 0x18), "b 0x00000010");
    }
}
