//! A small RAM-backed ARM7TDMI stand-in. It executes the instruction subset in disasm.rs,
//! which is enough to drive the console end to end.
use super::*;
use crate::disasm::{self, InstructionInfo, Op};
use crate::hex::{HexRecordCollection, HexRecordType};
use crate::registers::{ExecutionMode, PsrBit, RegisterFile, ARM_PC};
use crate::state::EntryReason;
use crate::target::{Breakpoints, Cpu, Memory, Target};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const LR: usize = 14;

pub struct Machine {
    pub reg: RegisterFile,
    ram: Vec<u8>,                // flat RAM mapped at address 0
    breakpoints: BTreeSet<u32>,  // instruction addresses
    watchpoints: BTreeSet<u32>,  // word addresses
    pub instruction_count: u64,  // instructions executed since reset
}
impl Machine {
    pub fn new(ram_size: u32) -> Machine {
        Machine {
            reg: RegisterFile::default(),
            ram: vec![0; ram_size as usize],
            breakpoints: BTreeSet::new(),
            watchpoints: BTreeSet::new(),
            instruction_count: 0,
        }
    }
    pub fn reset(&mut self, entry: u32, mode: ExecutionMode) {
        self.reg.reset(entry, mode);
        self.instruction_count = 0;
        verbose_println!("reset: entry={:08X} mode={:?}", entry, mode);
    }
    /// Copy bytes into RAM at addr. The whole block must fit.
    pub fn load_bytes(&mut self, bytes: &[u8], addr: u32) -> Result<(), Error> {
        let start = addr as usize;
        let end = start + bytes.len();
        if end > self.ram.len() {
            return Err(Error::new(
                ErrorKind::Memory,
                format!(
                    "image overflowed RAM ({} byte block at {:08X}, RAM={:08X} bytes)",
                    bytes.len(),
                    addr,
                    self.ram.len()
                )
                .as_str(),
            ));
        }
        self.ram[start..end].copy_from_slice(bytes);
        Ok(())
    }
    /// Load an image file. Returns the start address the image declares, if any.
    pub fn load_image(&mut self, filename: &str, load_addr: u32) -> Result<Option<u32>, Error> {
        let path = Path::new(filename);
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "hex" => {
                let hex = HexRecordCollection::read_from_file(path)?;
                let start = self.load_hex(&hex)?;
                info!("Successfully loaded hex file {}", filename);
                Ok(start)
            }
            _ => {
                self.load_bin(path, load_addr)?;
                info!("Successfully loaded binary file {}", filename);
                Ok(Some(load_addr))
            }
        }
    }
    /// Copy the contents of a HexRecordCollection into RAM.
    /// Returns the start address from a start linear address record, if there was one.
    pub fn load_hex(&mut self, hex: &HexRecordCollection) -> Result<Option<u32>, Error> {
        let mut base = 0u32;
        let mut start = None;
        let mut extent = 0usize;
        for r in hex.iter() {
            match r.record_type {
                HexRecordType::Data => {
                    if let Some(data) = r.data.as_ref() {
                        self.load_bytes(data, base.wrapping_add(r.address as u32))?;
                        extent += data.len();
                    }
                }
                HexRecordType::ExSegAddr => base = address_record(r.value())? << 4,
                HexRecordType::ExLinAddr => base = address_record(r.value())? << 16,
                HexRecordType::StartLinAddr => start = Some(address_record(r.value())?),
                HexRecordType::EndOfFile => break,
                _ => warn!("ignoring unsupported record type ({}) in hex file.", r.record_type),
            }
        }
        verbose_println!("loaded {} bytes from hex file", extent);
        Ok(start)
    }
    /// Load binary data from a file into RAM at the given address.
    pub fn load_bin(&mut self, bin_path: &Path, addr: u32) -> Result<usize, Error> {
        let mut bytes = Vec::new();
        File::open(bin_path)?.read_to_end(&mut bytes)?;
        self.load_bytes(&bytes, addr)?;
        verbose_println!(
            "loaded {} bytes at 0x{:08x} from binary file \"{}\"",
            bytes.len(),
            addr,
            bin_path.display()
        );
        Ok(bytes.len())
    }

    fn is_watched(&self, addr: u32) -> bool { self.watchpoints.contains(&(addr & !3)) }
    fn store_u32(&mut self, addr: u32, data: u32) {
        let a = addr as usize;
        match self.ram.get_mut(a..a.saturating_add(4)) {
            Some(word) => word.copy_from_slice(&data.to_le_bytes()),
            None => warn!(
                "write outside RAM ignored: {:08X} (PC={:08X})",
                addr,
                self.reg.current_instruction()
            ),
        }
    }
    /// Value of register r as an operand; the PC reads as `pc_value`.
    fn operand(&self, r: u32, pc_value: u32) -> u32 {
        if r as usize == ARM_PC {
            pc_value
        } else {
            self.reg.gprs[r as usize]
        }
    }
    fn branch_to(&mut self, target: u32) {
        let width = self.reg.cpsr.mode().instruction_width();
        self.reg.gprs[ARM_PC] = target.wrapping_add(width);
    }
    fn write_reg(&mut self, r: u32, v: u32) {
        if r as usize == ARM_PC {
            self.branch_to(v)
        } else {
            self.reg.gprs[r as usize] = v
        }
    }
    fn execute(&mut self, info: &InstructionInfo, pc_value: u32) -> Option<EntryReason> {
        let width = info.mode.instruction_width();
        match info.op {
            Op::Mov { rd, imm } => {
                if info.set_flags {
                    self.reg.cpsr.set_nz(imm);
                }
                self.write_reg(rd, imm);
            }
            Op::Add { rd, rn, imm } => {
                let a = self.operand(rn, pc_value);
                let v = if info.set_flags { self.reg.cpsr.add(a, imm) } else { a.wrapping_add(imm) };
                self.write_reg(rd, v);
            }
            Op::Sub { rd, rn, imm } => {
                let a = self.operand(rn, pc_value);
                let v = if info.set_flags { self.reg.cpsr.sub(a, imm) } else { a.wrapping_sub(imm) };
                self.write_reg(rd, v);
            }
            Op::Ldr { rd, rn, offset } => {
                let ea = self.operand(rn, pc_value).wrapping_add(offset as u32);
                let v = self.load_u32(ea);
                self.write_reg(rd, v);
                if self.is_watched(ea) {
                    return Some(EntryReason::Watchpoint);
                }
            }
            Op::Str { rd, rn, offset } => {
                let ea = self.operand(rn, pc_value).wrapping_add(offset as u32);
                let v = self.operand(rd, pc_value);
                self.store_u32(ea, v);
                if self.is_watched(ea) {
                    return Some(EntryReason::Watchpoint);
                }
            }
            Op::B { link, .. } => {
                if link {
                    // return to the instruction after this one
                    self.reg.gprs[LR] = pc_value.wrapping_sub(width);
                }
                if let Some(target) = info.branch_target(pc_value) {
                    self.branch_to(target);
                }
            }
            Op::Bx { rm } => {
                let target = self.operand(rm, pc_value);
                self.reg.cpsr.set(PsrBit::T, bit!(target, 0));
                self.branch_to(target & !1);
            }
            Op::Undefined => {
                verbose_println!("illegal instruction {:08X} ({:?})", info.bits, info.mode);
                return Some(EntryReason::IllegalInstruction);
            }
        }
        None
    }
}

fn address_record(value: Option<u32>) -> Result<u32, Error> {
    value.ok_or_else(|| general_err!("malformed address record in hex file"))
}

impl Memory for Machine {
    fn load_u8(&self, addr: u32) -> u8 { self.ram.get(addr as usize).copied().unwrap_or(0) }
    fn load_u16(&self, addr: u32) -> u16 {
        u16::from_le_bytes([self.load_u8(addr), self.load_u8(addr.wrapping_add(1))])
    }
    fn load_u32(&self, addr: u32) -> u32 {
        u32::from_le_bytes([
            self.load_u8(addr),
            self.load_u8(addr.wrapping_add(1)),
            self.load_u8(addr.wrapping_add(2)),
            self.load_u8(addr.wrapping_add(3)),
        ])
    }
}

impl Cpu for Machine {
    fn registers(&self) -> &RegisterFile { &self.reg }
    fn step(&mut self) -> Option<EntryReason> {
        let mode = self.reg.cpsr.mode();
        let width = mode.instruction_width();
        let addr = self.reg.current_instruction();
        let bits = match mode {
            ExecutionMode::Arm => self.load_u32(addr),
            ExecutionMode::Thumb => self.load_u16(addr) as u32,
        };
        let info = disasm::decode(bits, mode);
        // the executing instruction sees the PC two instructions ahead
        let pc_value = addr.wrapping_add(2 * width);
        self.reg.gprs[ARM_PC] = pc_value;
        self.instruction_count += 1;
        self.execute(&info, pc_value)
    }
}

impl Breakpoints for Machine {
    fn set_breakpoint(&mut self, addr: u32) { self.breakpoints.insert(addr); }
    fn clear_breakpoint(&mut self, addr: u32) { self.breakpoints.remove(&addr); }
    fn set_watchpoint(&mut self, addr: u32) { self.watchpoints.insert(addr & !3); }
    fn breakpoint_hit(&self) -> bool { self.breakpoints.contains(&self.reg.current_instruction()) }
}

impl Target for Machine {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn arm_machine(program: &[u32]) -> Result<Machine, Error> {
        let mut m = Machine::new(0x1000);
        let bytes: Vec<u8> = program.iter().flat_map(|w| w.to_le_bytes()).collect();
        m.load_bytes(&bytes, 0)?;
        m.reset(0, ExecutionMode::Arm);
        Ok(m)
    }

    #[test]
    fn executes_arm_data_processing() -> Result<(), Error> {
        // mov r0,#1; mov r1,#2; add r2,r0,#3; b .
        let mut m = arm_machine(&[0xe3a00001, 0xe3a01002, 0xe2802003, 0xeafffffe])?;
        for _ in 0..3 {
            assert_eq!(m.step(), None);
        }
        assert_eq!(&m.reg.gprs[0..3], &[1, 2, 4]);
        assert_eq!(m.reg.current_instruction(), 0xc);
        assert_eq!(m.reg.pc(), 0x10);
        // b . stays put
        assert_eq!(m.step(), None);
        assert_eq!(m.reg.current_instruction(), 0xc);
        assert_eq!(m.instruction_count, 4);
        Ok(())
    }
    #[test]
    fn subs_sets_flags() -> Result<(), Error> {
        // mov r2,#1; subs r2,r2,#1
        let mut m = arm_machine(&[0xe3a02001, 0xe2522001])?;
        m.step();
        m.step();
        assert_eq!(m.reg.gprs[2], 0);
        assert_eq!(m.reg.cpsr.glyphs(), "-ZC-IF-");
        Ok(())
    }
    #[test]
    fn branch_with_link() -> Result<(), Error> {
        let mut m = arm_machine(&[0xeb000001])?;
        m.step();
        assert_eq!(m.reg.gprs[LR], 4);
        assert_eq!(m.reg.current_instruction(), 0xc);
        Ok(())
    }
    #[test]
    fn run_stops_at_breakpoint() -> Result<(), Error> {
        let mut m = arm_machine(&[0xe3a00001, 0xe3a01002, 0xe2802003, 0xeafffffe])?;
        m.set_breakpoint(8);
        let flag = AtomicBool::new(false);
        assert_eq!(m.run(&flag), EntryReason::Breakpoint);
        assert_eq!(m.reg.current_instruction(), 8);
        assert_eq!(m.reg.gprs[1], 2);
        assert_eq!(m.reg.gprs[2], 0);
        m.clear_breakpoint(8);
        assert!(!m.breakpoint_hit());
        Ok(())
    }
    #[test]
    fn watchpoints_trap_loads_and_stores() -> Result<(), Error> {
        // mov r1,#0x100; ldr r0,[r1]; str r0,[r1,#4]; b .
        let mut m = arm_machine(&[0xe3a01c01, 0xe5910000, 0xe5810004, 0xeafffffe])?;
        m.load_bytes(&0xdead_beefu32.to_le_bytes(), 0x100)?;
        m.set_watchpoint(0x100);
        m.set_watchpoint(0x106);
        let flag = AtomicBool::new(false);
        assert_eq!(m.run(&flag), EntryReason::Watchpoint);
        assert_eq!(m.reg.gprs[0], 0xdead_beef);
        assert_eq!(m.run(&flag), EntryReason::Watchpoint);
        assert_eq!(m.load_u32(0x104), 0xdead_beef);
        assert_eq!(m.reg.current_instruction(), 0xc);
        Ok(())
    }
    #[test]
    fn illegal_instruction_is_skipped() -> Result<(), Error> {
        let mut m = arm_machine(&[0x1a000000, 0xe3a00001])?;
        assert_eq!(m.step(), Some(EntryReason::IllegalInstruction));
        assert_eq!(m.reg.current_instruction(), 4);
        assert_eq!(m.step(), None);
        assert_eq!(m.reg.gprs[0], 1);
        Ok(())
    }
    #[test]
    fn break_flag_stops_run() -> Result<(), Error> {
        let mut m = arm_machine(&[0xeafffffe])?;
        let flag = AtomicBool::new(true);
        assert_eq!(m.run(&flag), EntryReason::Manual);
        assert!(!flag.load(Ordering::SeqCst));
        Ok(())
    }
    #[test]
    fn bx_switches_to_thumb() -> Result<(), Error> {
        // mov r0,#0x11; bx r0
        let mut m = arm_machine(&[0xe3a00011, 0xe12fff10])?;
        // movs r0,#7; subs r0,#7; b .
        m.load_bytes(&[0x07, 0x20, 0x07, 0x38, 0xfe, 0xe7], 0x10)?;
        m.step();
        m.step();
        assert_eq!(m.execution_mode(), ExecutionMode::Thumb);
        assert_eq!(m.reg.current_instruction(), 0x10);
        assert_eq!(m.reg.pc(), 0x12);
        m.step();
        assert_eq!(m.reg.gprs[0], 7);
        m.step();
        assert_eq!(m.reg.gprs[0], 0);
        assert!(m.reg.cpsr.is_set(PsrBit::Z));
        m.step();
        assert_eq!(m.reg.current_instruction(), 0x14);
        Ok(())
    }
    #[test]
    fn memory_outside_ram() -> Result<(), Error> {
        let mut m = arm_machine(&[])?;
        assert_eq!(m.load_u32(0xffff_fffe), 0);
        m.store_u32(0x0fff, 0x1234_5678);
        assert_eq!(m.load_u8(0x0fff), 0);
        assert!(m.load_bytes(&[1, 2], 0x0fff).is_err());
        Ok(())
    }
    #[test]
    fn loads_hex_with_extended_address() -> Result<(), Error> {
        let mut m = Machine::new(0x20000);
        let hex = HexRecordCollection::from_str_iter([
            ":020000040001F9",
            ":040010000100A0E368",
            ":0400000500010010E6",
            ":00000001FF",
        ])?;
        assert_eq!(m.load_hex(&hex)?, Some(0x0001_0010));
        assert_eq!(m.load_u32(0x0001_0010), 0xe3a0_0001);
        assert_eq!(m.load_u16(0x0001_0012), 0xe3a0);
        Ok(())
    }
}
