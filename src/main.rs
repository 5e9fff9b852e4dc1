//! # An interactive debugger console for an ARM/Thumb CPU emulator, written in Rust.
//!
//! ## Getting Started
//! To load an image and break in before its first instruction:
//! ```
//! cargo run -- /path/to/image.hex
//! ```
//! ...or, to start running right away and break in later with <ctrl-c>...
//! ```
//! armdbg -r -b 0x100 /path/to/image.bin
//! ```
//! ## Options
//! Help for command line options is available using -h or --help.
//! Type `help` at the `> ` prompt for the console commands.
#[macro_use]
mod macros;
mod args;
mod commands;
mod config;
mod console;
mod debug;
mod disasm;
mod error;
mod hex;
mod inspect;
mod machine;
mod parse;
mod registers;
mod state;
mod target;
mod term;
use std::{fmt, io};
pub(crate) use crate::error::*;
use crate::console::Console;
use crate::debug::Debugger;
use crate::machine::Machine;
use crate::registers::ExecutionMode;
use crate::target::Breakpoints;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init();
    term::init();
    // debug_image does all the work
    if let Err(e) = debug_image(config::ARGS.file.as_deref()) {
        println!("{}", e);
        return Err(Box::new(e));
    }
    Ok(())
}

/// Build the machine described by the command line: RAM, image, reset state and breakpoints.
fn prepare_machine(filename: Option<&str>, args: &config::Args) -> Result<Machine, Error> {
    let mut machine = Machine::new(args.ram_size);
    let start = match filename {
        Some(f) => machine.load_image(f, args.load_addr)?,
        None => {
            info!("No image given; starting with empty RAM.");
            None
        }
    };
    let entry = args.entry.or(start).unwrap_or(args.load_addr);
    let mode = if args.thumb { ExecutionMode::Thumb } else { ExecutionMode::Arm };
    machine.reset(entry, mode);
    for &addr in &args.breakpoint {
        machine.set_breakpoint(addr);
        verbose_println!("breakpoint set at {:08X}", addr);
    }
    Ok(machine)
}

/// debug_image drives the top level functionality (load, attach, command loop) of the app
fn debug_image(filename: Option<&str>) -> Result<(), Error> {
    let machine = prepare_machine(filename, &config::ARGS)?;
    let console = Console::new(config::history_size())?;
    let mut debugger = Debugger::new(
        Box::new(machine),
        Box::new(disasm::Disasm),
        Box::new(console),
        Box::new(io::stdout()),
    );
    if !term::install_break_handler(debugger.break_handle().flag()) {
        warn!("break handler already installed; <ctrl-c> won't interrupt this session");
    }
    debugger.attach();
    if config::ARGS.run {
        info!("Running. Press <ctrl-c> to break in.");
        debugger.resume();
    }
    debugger.run()?;
    verbose_println!("session ended: {:?}", debugger.state());
    debugger.detach();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Cpu, Memory};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &[u8]) -> Result<PathBuf, Error> {
        let path = std::env::temp_dir().join(format!("armdbg-{}-{}", std::process::id(), name));
        fs::write(&path, contents)?;
        Ok(path)
    }
    #[test]
    fn raw_binary_at_load_address() -> Result<(), Error> {
        let path = temp_file("image.bin", &[0x01, 0x00, 0xa0, 0xe3])?;
        let args = config::Args::parse_from(["test", "--load-addr", "0x200", "-b", "0x204", "--ram-size", "0x1000"]);
        let m = prepare_machine(path.to_str(), &args)?;
        fs::remove_file(&path)?;
        assert_eq!(m.load_u32(0x200), 0xe3a0_0001);
        assert_eq!(m.registers().current_instruction(), 0x200);
        assert_eq!(m.execution_mode(), ExecutionMode::Arm);
        Ok(())
    }
    #[test]
    fn hex_start_address_and_overrides() -> Result<(), Error> {
        let text = ":020000040001F9\n:040010000100A0E368\n:0400000500010010E6\n:00000001FF\n";
        let path = temp_file("image.hex", text.as_bytes())?;
        let args = config::Args::parse_from(["test", "--ram-size", "0x20000"]);
        let m = prepare_machine(path.to_str(), &args)?;
        assert_eq!(m.registers().current_instruction(), 0x0001_0010);
        let args = config::Args::parse_from(["test", "--ram-size", "0x20000", "--entry", "0x40", "-t"]);
        let m = prepare_machine(path.to_str(), &args)?;
        fs::remove_file(&path)?;
        assert_eq!(m.registers().current_instruction(), 0x40);
        assert_eq!(m.execution_mode(), ExecutionMode::Thumb);
        Ok(())
    }
    #[test]
    fn load_failures() {
        let args = config::Args::parse_from(["test", "--ram-size", "0x10"]);
        assert!(prepare_machine(Some("/nonexistent/armdbg.bin"), &args).is_err());
        let big = [0u8; 0x20];
        if let Ok(path) = temp_file("big.bin", &big) {
            let e = prepare_machine(path.to_str(), &args).err();
            _ = fs::remove_file(&path);
            assert_eq!(e.map(|e| e.kind), Some(ErrorKind::Memory));
        }
    }
    #[test]
    fn defaults() -> Result<(), Error> {
        let m = prepare_machine(None, &config::Args::parse_from(["test"]))?;
        assert_eq!(m.registers().pc(), 4);
        assert_eq!(config::ARGS.history, 200);
        assert_eq!(config::history_size(), 200);
        Ok(())
    }
}
