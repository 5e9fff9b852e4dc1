//! The services the console drives: memory, CPU, breakpoint engine and disassembler.
//! The console only talks to them through these traits; machine.rs and disasm.rs
//! provide the implementations used by the binary.
use crate::disasm::InstructionInfo;
use crate::registers::{ExecutionMode, RegisterFile};
use crate::state::EntryReason;
use std::sync::atomic::{AtomicBool, Ordering};

/// Debugger view of the memory bus. Reads made through here never trigger watchpoints.
pub trait Memory {
    fn load_u8(&self, addr: u32) -> u8;
    fn load_u16(&self, addr: u32) -> u16;
    fn load_u32(&self, addr: u32) -> u32;
}

pub trait Cpu: Memory {
    fn registers(&self) -> &RegisterFile;
    fn execution_mode(&self) -> ExecutionMode { self.registers().cpsr.mode() }
    /// Execute exactly one instruction. Returns the entry reason if the instruction itself
    /// raised one (watchpoint access, illegal instruction).
    fn step(&mut self) -> Option<EntryReason>;
}

/// The breakpoint/watchpoint engine. Setting and clearing are fire and forget.
pub trait Breakpoints {
    fn set_breakpoint(&mut self, addr: u32);
    fn clear_breakpoint(&mut self, addr: u32);
    fn set_watchpoint(&mut self, addr: u32);
    /// true if the next instruction to execute sits on a breakpoint
    fn breakpoint_hit(&self) -> bool;
}

/// Everything the console needs from the emulated machine.
pub trait Target: Cpu + Breakpoints {
    /// Execute until the next stop condition. The break flag is polled (and cleared)
    /// between instructions; a raised flag stops execution as a manual break-in.
    fn run(&mut self, break_flag: &AtomicBool) -> EntryReason {
        loop {
            if break_flag.swap(false, Ordering::SeqCst) {
                return EntryReason::Manual;
            }
            if let Some(reason) = self.step() {
                return reason;
            }
            if self.breakpoint_hit() {
                return EntryReason::Breakpoint;
            }
        }
    }
}

pub trait Disassembler {
    fn decode(&self, bits: u32, mode: ExecutionMode) -> InstructionInfo;
    /// Text for a decoded instruction. `next_address` is the PC value the instruction
    /// sees (its address plus two instruction widths), used to resolve branch targets.
    fn render(&self, info: &InstructionInfo, next_address: u32) -> String;
}
