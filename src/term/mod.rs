#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use self::windows::*;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

/// The flag the interrupt handler raises. Set once per process.
static BREAK_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    #[test]
    fn break_flag_registers_once() {
        let first = Arc::new(AtomicBool::new(false));
        let installed = install_break_handler(first.clone());
        // a second session can't take over the interrupt
        assert!(!install_break_handler(Arc::new(AtomicBool::new(false))));
        if installed {
            assert!(Arc::ptr_eq(BREAK_FLAG.get().unwrap(), &first));
            assert!(!first.load(Ordering::SeqCst));
        }
    }
}
