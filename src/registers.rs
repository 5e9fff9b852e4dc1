//! ARM7TDMI register set helpers
use super::*;

/// index of the program counter in the general register file
pub const ARM_PC: usize = 15;
pub const WORD_SIZE_ARM: u32 = 4;
pub const WORD_SIZE_THUMB: u32 = 2;

/// The two instruction sets the CPU can execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Arm,
    Thumb,
}
impl ExecutionMode {
    /// width in bytes of one instruction in this mode
    pub fn instruction_width(&self) -> u32 {
        match self {
            ExecutionMode::Arm => WORD_SIZE_ARM,
            ExecutionMode::Thumb => WORD_SIZE_THUMB,
        }
    }
}

/// Enumeration of the status word bits the console knows about (value is the bit position)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PsrBit {
    N = 31,
    Z = 30,
    C = 29,
    V = 28,
    I = 7,
    F = 6,
    T = 5,
}

/// Helper struct to map metadata about status word bits.
pub struct PsrInfo {
    bit: PsrBit,
    short: char,
    name: &'static str,
}
/// Metadata for each displayed status bit, in display order.
#[rustfmt::skip]
static PSR_TABLE: [PsrInfo; 7] = [
    PsrInfo {bit: PsrBit::N, short: 'N', name: "negative"},
    PsrInfo {bit: PsrBit::Z, short: 'Z', name: "zero"},
    PsrInfo {bit: PsrBit::C, short: 'C', name: "carry"},
    PsrInfo {bit: PsrBit::V, short: 'V', name: "overflow"},
    PsrInfo {bit: PsrBit::I, short: 'I', name: "IRQ disable"},
    PsrInfo {bit: PsrBit::F, short: 'F', name: "FIQ disable"},
    PsrInfo {bit: PsrBit::T, short: 'T', name: "thumb state"},
];

/// The packed program status word.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Psr {
    pub packed: u32,
}
impl Psr {
    /// supervisor mode with IRQ and FIQ disabled
    pub const RESET: u32 = 0x0000_00d3;

    pub fn reset(&mut self, mode: ExecutionMode) {
        self.packed = Psr::RESET;
        self.set(PsrBit::T, mode == ExecutionMode::Thumb);
    }
    pub fn set(&mut self, bit: PsrBit, val: bool) {
        let mask = 1u32 << bit as u32;
        if val {
            self.packed |= mask;
        } else {
            self.packed &= !mask;
        }
    }
    pub fn is_set(&self, bit: PsrBit) -> bool { bit!(self.packed, bit as u32) }
    pub fn mode(&self) -> ExecutionMode {
        if self.is_set(PsrBit::T) {
            ExecutionMode::Thumb
        } else {
            ExecutionMode::Arm
        }
    }
    /// Fixed 7-character rendering of the flags: the flag letter when set, '-' when clear.
    pub fn glyphs(&self) -> String {
        PSR_TABLE
            .iter()
            .map(|info| if self.is_set(info.bit) { info.short } else { '-' })
            .collect()
    }
    /// Explains each glyph position, e.g. "N=negative Z=zero ...".
    pub fn legend() -> String {
        PSR_TABLE
            .iter()
            .map(|info| format!("{}={}", info.short, info.name))
            .collect::<Vec<String>>()
            .join(" ")
    }
    /// N and Z follow the result.
    pub fn set_nz(&mut self, result: u32) {
        self.set(PsrBit::N, bit!(result, 31));
        self.set(PsrBit::Z, result == 0);
    }
    // status word doubles as the ALU for the few flag-setting instructions
    pub fn add(&mut self, a: u32, b: u32) -> u32 {
        let (result, c) = a.overflowing_add(b);
        let (_, v) = (a as i32).overflowing_add(b as i32);
        self.set_nz(result);
        self.set(PsrBit::C, c);
        self.set(PsrBit::V, v);
        result
    }
    pub fn sub(&mut self, a: u32, b: u32) -> u32 {
        let (result, borrow) = a.overflowing_sub(b);
        let (_, v) = (a as i32).overflowing_sub(b as i32);
        self.set_nz(result);
        // ARM carry is the inverse of borrow
        self.set(PsrBit::C, !borrow);
        self.set(PsrBit::V, v);
        result
    }
}
impl fmt::Display for Psr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:08X} [{}]", self.packed, self.glyphs()) }
}

/// The general registers plus the status word.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    pub gprs: [u32; 16],
    pub cpsr: Psr,
}
impl RegisterFile {
    pub fn pc(&self) -> u32 { self.gprs[ARM_PC] }
    /// Address of the instruction that will execute next (PC runs one instruction ahead).
    pub fn current_instruction(&self) -> u32 { self.pc().wrapping_sub(self.cpsr.mode().instruction_width()) }
    pub fn reset(&mut self, entry: u32, mode: ExecutionMode) {
        self.gprs = [0; 16];
        self.cpsr.reset(mode);
        self.gprs[ARM_PC] = entry.wrapping_add(mode.instruction_width());
    }
}

/// Conventional name of general register `r`.
pub fn reg_name(r: u32) -> String {
    match r {
        13 => "sp".to_string(),
        14 => "lr".to_string(),
        15 => "pc".to_string(),
        r => format!("r{}", r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn glyphs_follow_bits() {
        let mut psr = Psr::default();
        assert_eq!(psr.glyphs(), "-------");
        psr.set(PsrBit::N, true);
        psr.set(PsrBit::T, true);
        assert_eq!(psr.glyphs(), "N-----T");
        psr.reset(ExecutionMode::Arm);
        assert_eq!(psr.glyphs(), "----IF-");
        assert_eq!(psr.to_string(), "000000D3 [----IF-]");
        assert!(Psr::legend().starts_with("N=negative Z=zero C=carry"));
    }
    #[test]
    fn alu_flags() {
        let mut psr = Psr::default();
        assert_eq!(psr.add(0xffff_ffff, 1), 0);
        assert_eq!(psr.glyphs(), "-ZC----");
        assert_eq!(psr.add(0x7fff_ffff, 1), 0x8000_0000);
        assert_eq!(psr.glyphs(), "N--V---");
        assert_eq!(psr.sub(5, 5), 0);
        assert_eq!(psr.glyphs(), "-ZC----");
        assert_eq!(psr.sub(1, 2), 0xffff_ffff);
        assert_eq!(psr.glyphs(), "N------");
    }
    #[test]
    fn pc_runs_ahead() {
        let mut reg = RegisterFile::default();
        reg.reset(0x100, ExecutionMode::Arm);
        assert_eq!(reg.pc(), 0x104);
        assert_eq!(reg.current_instruction(), 0x100);
        reg.reset(0x100, ExecutionMode::Thumb);
        assert_eq!(reg.pc(), 0x102);
        assert_eq!(reg.current_instruction(), 0x100);
        assert_eq!(reg_name(13), "sp");
        assert_eq!(reg_name(3), "r3");
    }
}
