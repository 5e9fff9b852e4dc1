use super::BREAK_FLAG;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn init() {
    // intentionally left blank
}

extern "C" fn request_break(_: libc::c_int) {
    // a single atomic store; nothing here may allocate or lock
    if let Some(flag) = BREAK_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Route SIGINT to `flag`. Returns false if a flag was already registered.
pub fn install_break_handler(flag: Arc<AtomicBool>) -> bool {
    if BREAK_FLAG.set(flag).is_err() {
        return false;
    }
    // SAFETY: request_break only performs an atomic store
    unsafe {
        libc::signal(libc::SIGINT, request_break as extern "C" fn(libc::c_int) as libc::sighandler_t);
    }
    true
}

extern "C" fn no_debugger(_: libc::c_int) {
    const MSG: &[u8] = b"No debugger attached!\n";
    // SAFETY: write(2) is async-signal-safe and MSG outlives the call
    unsafe {
        libc::write(libc::STDOUT_FILENO, MSG.as_ptr() as *const libc::c_void, MSG.len());
    }
}

/// Stop in an attached native debugger. Without one, print a note and carry on.
pub fn raise_debug_trap() {
    // SAFETY: both sigaction structs are fully initialized before use and the previous
    // SIGTRAP disposition is restored before returning
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        let mut osa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = no_debugger as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaddset(&mut sa.sa_mask, libc::SIGTRAP);
        sa.sa_flags = libc::SA_RESTART;
        libc::sigaction(libc::SIGTRAP, &sa, &mut osa);
        libc::pthread_kill(libc::pthread_self(), libc::SIGTRAP);
        libc::sigaction(libc::SIGTRAP, &osa, std::ptr::null_mut());
    }
}
