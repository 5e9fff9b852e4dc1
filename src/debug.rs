use super::*;
use crate::args::{parse_arguments, ArgList};
use crate::commands::{self, Syntax};
use crate::console::LineSource;
use crate::inspect;
use crate::state::{BreakHandle, EntryReason, RunState, SessionState};
use crate::target::{Disassembler, Target};
use std::io::Write;
use std::sync::atomic::Ordering;

const PROMPT: &str = "> ";

/// One debugging session: the machine under control, how to show it, and where commands
/// come from and output goes.
pub struct Debugger {
    pub(crate) target: Box<dyn Target>,
    pub(crate) decoder: Box<dyn Disassembler>,
    state: SessionState,
    console: Box<dyn LineSource>,
    out: Box<dyn Write>,
}

impl Debugger {
    pub fn new(
        target: Box<dyn Target>,
        decoder: Box<dyn Disassembler>,
        console: Box<dyn LineSource>,
        out: Box<dyn Write>,
    ) -> Debugger {
        Debugger {
            target,
            decoder,
            state: SessionState::new(),
            console,
            out,
        }
    }
    pub fn state(&self) -> RunState { self.state.get() }
    pub(crate) fn set_state(&mut self, state: RunState) { self.state.set(state) }
    /// A handle the platform layer can use to request a manual break-in.
    pub fn break_handle(&self) -> BreakHandle { self.state.break_handle() }

    pub fn attach(&mut self) { self.enter(EntryReason::Attached) }
    pub fn detach(&mut self) { self.state.set(RunState::Detached) }
    /// Pause and announce why.
    pub fn enter(&mut self, reason: EntryReason) {
        self.state.set(RunState::Paused);
        if let Some(msg) = reason.announcement() {
            self.emit_line(msg);
        }
    }
    /// Hand control back to the CPU. A break requested while paused is dropped.
    pub fn resume(&mut self) {
        self.state.clear_break();
        self.state.set(RunState::Running);
    }

    /// True once for each break request made since the last check.
    pub(crate) fn break_requested(&self) -> bool { self.state.break_flag().swap(false, Ordering::SeqCst) }

    pub(crate) fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            verbose_println!("output failed: {}", e);
        }
    }
    pub(crate) fn emit_line(&mut self, text: &str) {
        self.emit(text);
        self.emit("\n");
    }
    pub fn print_status(&mut self) {
        let text = inspect::status(self.target.as_ref(), self.decoder.as_ref());
        self.emit(&text);
    }

    /// Parse and execute one command line. Returns true if a handler ran.
    pub fn dispatch(&mut self, line: &str) -> bool {
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let command = commands::lookup(verb);
        let args = match command.map(|c| c.syntax) {
            Some(Syntax::Text) => ArgList::text(rest),
            // arguments are parsed before the verb is checked
            _ => match parse_arguments(rest) {
                Ok(args) => args,
                Err(e) => {
                    verbose_println!("{}", e);
                    self.emit_line("Parse error");
                    return false;
                }
            },
        };
        match command {
            Some(c) => {
                (c.handler)(self, &args);
                true
            }
            None => {
                self.emit_line("Command not found");
                false
            }
        }
    }

    /// Read and dispatch lines for as long as the session stays paused.
    pub fn command_line(&mut self) -> Result<(), Error> {
        self.print_status();
        while self.state.get() == RunState::Paused {
            let Some(line) = self.console.read_line(PROMPT)? else {
                self.state.set(RunState::Exiting);
                break;
            };
            if line.is_empty() {
                // repeat the last command that ran
                if let Some(last) = self.console.last_entry() {
                    self.dispatch(&last);
                }
            } else if self.dispatch(&line) {
                self.console.add_entry(&line);
            }
        }
        Ok(())
    }

    /// Drive the session until it shuts down, runs out of input or is detached.
    pub fn run(&mut self) -> Result<RunState, Error> {
        loop {
            match self.state.get() {
                RunState::Running => {
                    let reason = self.target.run(self.state.break_flag());
                    self.enter(reason);
                }
                RunState::Paused => self.command_line()?,
                state => return Ok(state),
            }
        }
    }
}
