//! Run state of a debugging session and the break request shared with the signal layer.
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// no session attached yet (or detached again)
    Detached = 0,
    /// the console owns the CPU and accepts commands
    Paused,
    /// the CPU run loop owns control until the next entry event
    Running,
    /// the operator asked to quit
    Shutdown,
    /// the line source ran dry
    Exiting,
}
impl From<u8> for RunState {
    fn from(v: u8) -> RunState {
        match v {
            1 => RunState::Paused,
            2 => RunState::Running,
            3 => RunState::Shutdown,
            4 => RunState::Exiting,
            _ => RunState::Detached,
        }
    }
}

/// Why execution stopped and the console took over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryReason {
    Breakpoint,
    Watchpoint,
    IllegalInstruction,
    Manual,
    Attached,
}
impl EntryReason {
    /// The one-line message printed on entry; manual break-ins and attaching are silent.
    pub fn announcement(&self) -> Option<&'static str> {
        match self {
            EntryReason::Breakpoint => Some("Hit breakpoint"),
            EntryReason::Watchpoint => Some("Hit watchpoint"),
            EntryReason::IllegalInstruction => Some("Hit illegal opcode"),
            EntryReason::Manual | EntryReason::Attached => None,
        }
    }
}

/// Session state that is touched from outside the console loop.
/// Both fields are single atomic words, so reading or writing them is signal safe.
#[derive(Debug)]
pub struct SessionState {
    run_state: AtomicU8,
    break_requested: Arc<AtomicBool>,
}
impl SessionState {
    pub fn new() -> Self {
        SessionState {
            run_state: AtomicU8::new(RunState::Detached as u8),
            break_requested: Arc::new(AtomicBool::new(false)),
        }
    }
    pub fn get(&self) -> RunState { RunState::from(self.run_state.load(Ordering::SeqCst)) }
    pub fn set(&self, state: RunState) { self.run_state.store(state as u8, Ordering::SeqCst) }
    /// The flag the CPU run loop polls between instructions.
    pub fn break_flag(&self) -> &AtomicBool { &self.break_requested }
    /// Drop any break request left over from an earlier run.
    pub fn clear_break(&self) { self.break_requested.store(false, Ordering::SeqCst) }
    /// A handle that can request a break from another context.
    pub fn break_handle(&self) -> BreakHandle { BreakHandle(self.break_requested.clone()) }
}
impl Default for SessionState {
    fn default() -> Self { SessionState::new() }
}

/// Requests a manual break-in. Cloneable and usable from a signal handler: requesting
/// a break is a single atomic store.
#[derive(Debug, Clone)]
pub struct BreakHandle(Arc<AtomicBool>);
impl BreakHandle {
    #[cfg(test)]
    pub fn request_break(&self) { self.0.store(true, Ordering::SeqCst) }
    /// The shared flag, for handing to platform signal plumbing.
    pub fn flag(&self) -> Arc<AtomicBool> { self.0.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn run_state_round_trips_through_atomic() {
        let state = SessionState::new();
        assert_eq!(state.get(), RunState::Detached);
        for s in [
            RunState::Paused,
            RunState::Running,
            RunState::Shutdown,
            RunState::Exiting,
            RunState::Detached,
        ] {
            state.set(s);
            assert_eq!(state.get(), s);
        }
    }
    #[test]
    fn break_handle_raises_shared_flag() {
        let state = SessionState::new();
        let handle = state.break_handle();
        assert!(!state.break_flag().load(Ordering::SeqCst));
        handle.clone().request_break();
        assert!(state.break_flag().load(Ordering::SeqCst));
        state.clear_break();
        assert!(!handle.flag().load(Ordering::SeqCst));
    }
    #[test]
    fn announcements() {
        assert_eq!(EntryReason::Breakpoint.announcement(), Some("Hit breakpoint"));
        assert_eq!(EntryReason::Watchpoint.announcement(), Some("Hit watchpoint"));
        assert_eq!(EntryReason::IllegalInstruction.announcement(), Some("Hit illegal opcode"));
        assert_eq!(EntryReason::Manual.announcement(), None);
        assert_eq!(EntryReason::Attached.announcement(), None);
    }
}
