use super::BREAK_FLAG;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use windows::Win32::Foundation::BOOL;
use windows::Win32::System::Console::*;
use windows::Win32::System::Diagnostics::Debug::{DebugBreak, IsDebuggerPresent};

pub fn init() {
    unsafe {
        // make sure VT escape sequences will be honored in the console
        let mut cm: CONSOLE_MODE = CONSOLE_MODE::default();
        if let Ok(h) = GetStdHandle(STD_OUTPUT_HANDLE) {
            GetConsoleMode(h, &mut cm as *mut CONSOLE_MODE);
            if (cm.0 & 0x4) == 0 {
                cm.0 |= 0x4;
                SetConsoleMode(h, cm);
            }
        }
    }
}

unsafe extern "system" fn request_break(ctrl_type: u32) -> BOOL {
    if ctrl_type != CTRL_C_EVENT {
        return BOOL(0);
    }
    if let Some(flag) = BREAK_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
    BOOL(1)
}

/// Route <ctrl-c> to `flag`. Returns false if a flag was already registered.
pub fn install_break_handler(flag: Arc<AtomicBool>) -> bool {
    if BREAK_FLAG.set(flag).is_err() {
        return false;
    }
    unsafe { SetConsoleCtrlHandler(Some(request_break), true).as_bool() }
}

/// Stop in an attached native debugger. Without one, print a note and carry on.
pub fn raise_debug_trap() {
    unsafe {
        if IsDebuggerPresent().as_bool() {
            DebugBreak();
        } else {
            println!("No debugger attached!");
        }
    }
}
