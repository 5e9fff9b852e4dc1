//! The command table and its handlers.
use crate::args::ArgList;
use crate::debug::Debugger;
use crate::inspect;
use crate::registers::Psr;
use crate::state::RunState;
use crate::term;

/// Printed by handlers whose required argument is absent.
pub const ERROR_MISSING_ARGS: &str = "Arguments missing";

pub type Handler = fn(&mut Debugger, &ArgList);

/// How the text after the verb is turned into arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// space separated expressions, each evaluated to an integer
    Expressions,
    /// the raw text, unevaluated
    Text,
}

pub struct Command {
    pub name: &'static str,
    pub handler: Handler,
    pub syntax: Syntax,
    pub help: &'static str,
}

macro_rules! help {
    ($name:ident,$help:expr) => {
        #[allow(non_upper_case_globals)]
        static $name: &'static str = $help;
    };
}

help!(cmd_break, "break <addr> - Set a breakpoint at <addr> (alias b)");
help!(cmd_delete, "delete <addr> - Clear the breakpoint at <addr> (alias d)");
help!(cmd_watch, "watch <addr> - Stop when the word at <addr> is loaded or stored (alias w)");
help!(cmd_continue, "continue - Resume execution until the next stop (alias c)");
help!(cmd_next, "next - Execute one instruction and show status (alias n)");
help!(cmd_print, "print <expr>... - Print each value in decimal (alias p)");
help!(cmd_print_hex, "print/x <expr>... - Print each value in hex (alias p/x)");
help!(
    cmd_disasm,
    "disasm [<addr> [<count>]] - Disassemble <count> instructions at <addr> (alias dis)"
);
help!(cmd_info, "info - Show registers, flags and the current instruction (aliases i, status)");
help!(cmd_rb, "rb <addr> - Read the byte at <addr>");
help!(cmd_rh, "rh <addr> - Read the halfword at <addr>");
help!(cmd_rw, "rw <addr> - Read the word at <addr>");
help!(cmd_x, "x - Break into an attached native debugger");
help!(cmd_quit, "quit - Terminate this application (alias q)");
help!(cmd_help, "help [<command>] - Display this help text, or help for <command> (alias h)");

static COMMAND_HELP: &[&str] = &[
    cmd_break,
    cmd_delete,
    cmd_watch,
    cmd_continue,
    cmd_next,
    cmd_print,
    cmd_print_hex,
    cmd_disasm,
    cmd_info,
    cmd_rb,
    cmd_rh,
    cmd_rw,
    cmd_x,
    cmd_quit,
    cmd_help,
    "<expr> syntax: decimal, 0x or $ hex, 0b binary; operators = + - * /; no spaces inside an expression",
];

macro_rules! command {
    ($name:literal, $handler:ident, $help:ident) => {
        command!($name, $handler, $help, Syntax::Expressions)
    };
    ($name:literal, $handler:ident, $help:ident, $syntax:expr) => {
        Command {
            name: $name,
            handler: $handler,
            syntax: $syntax,
            help: $help,
        }
    };
}

/// Every verb, sorted by name. Aliases are separate rows sharing a handler.
#[rustfmt::skip]
pub static COMMANDS: &[Command] = &[
    command!("b", set_breakpoint, cmd_break),
    command!("break", set_breakpoint, cmd_break),
    command!("c", resume, cmd_continue),
    command!("continue", resume, cmd_continue),
    command!("d", clear_breakpoint, cmd_delete),
    command!("delete", clear_breakpoint, cmd_delete),
    command!("dis", disassemble, cmd_disasm),
    command!("disasm", disassemble, cmd_disasm),
    command!("h", show_help, cmd_help, Syntax::Text),
    command!("help", show_help, cmd_help, Syntax::Text),
    command!("i", print_status, cmd_info),
    command!("info", print_status, cmd_info),
    command!("n", next, cmd_next),
    command!("next", next, cmd_next),
    command!("p", print, cmd_print),
    command!("p/x", print_hex, cmd_print_hex),
    command!("print", print, cmd_print),
    command!("print/x", print_hex, cmd_print_hex),
    command!("q", quit, cmd_quit),
    command!("quit", quit, cmd_quit),
    command!("rb", read_byte, cmd_rb),
    command!("rh", read_halfword, cmd_rh),
    command!("rw", read_word, cmd_rw),
    command!("status", print_status, cmd_info),
    command!("w", set_watchpoint, cmd_watch),
    command!("watch", set_watchpoint, cmd_watch),
    command!("x", break_into, cmd_x),
];

/// Exact, case-insensitive verb lookup. Abbreviations are not expanded.
pub fn lookup(verb: &str) -> Option<&'static Command> {
    COMMANDS
        .iter()
        .find(|c| c.name.len() == verb.len() && c.name.eq_ignore_ascii_case(verb))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Completion {
    /// text to insert at the cursor
    Complete(String),
    NoMatch,
}

/// Complete a partially typed verb. Only a unique match completes; it gets the rest of
/// the name plus a trailing space.
pub fn complete(typed: &str) -> Completion {
    let matches = |c: &Command| {
        c.name.len() >= typed.len() && c.name.as_bytes()[..typed.len()].eq_ignore_ascii_case(typed.as_bytes())
    };
    let Some(i) = COMMANDS.iter().position(|c| matches(c)) else {
        return Completion::NoMatch;
    };
    if COMMANDS.get(i + 1).map_or(false, |c| matches(c)) {
        return Completion::NoMatch;
    }
    Completion::Complete(format!("{} ", &COMMANDS[i].name[typed.len()..]))
}

/// The integer at the head of the list, or the missing-arguments message.
fn required_address(d: &mut Debugger, args: &ArgList) -> Option<u32> {
    let addr = args.int(0);
    if addr.is_none() {
        d.emit_line(ERROR_MISSING_ARGS);
    }
    addr
}

fn set_breakpoint(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        d.target.set_breakpoint(addr);
    }
}
fn clear_breakpoint(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        d.target.clear_breakpoint(addr);
    }
}
fn set_watchpoint(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        d.target.set_watchpoint(addr);
    }
}
fn resume(d: &mut Debugger, _: &ArgList) { d.resume(); }
fn next(d: &mut Debugger, _: &ArgList) {
    if let Some(reason) = d.target.step() {
        d.enter(reason);
    }
    d.print_status();
}
fn print(d: &mut Debugger, args: &ArgList) { d.emit(&inspect::values(args, false)); }
fn print_hex(d: &mut Debugger, args: &ArgList) { d.emit(&inspect::values(args, true)); }
fn disassemble(d: &mut Debugger, args: &ArgList) {
    let mode = d.target.execution_mode();
    let width = mode.instruction_width();
    let address = args
        .int(0)
        .unwrap_or_else(|| d.target.registers().pc().wrapping_sub(width));
    // the count is signed: zero or negative lists nothing
    let count = args.int(1).map_or(1, |c| c as i32);
    for i in 0..count.max(0) as u32 {
        if d.break_requested() {
            break;
        }
        let line = inspect::instruction_line(
            d.target.as_ref(),
            d.decoder.as_ref(),
            address.wrapping_add(i.wrapping_mul(width)),
            mode,
        );
        d.emit(&line);
    }
}
fn print_status(d: &mut Debugger, _: &ArgList) { d.print_status(); }
fn read_byte(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        let text = inspect::byte(d.target.load_u8(addr));
        d.emit(&text);
    }
}
fn read_halfword(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        let text = inspect::halfword(d.target.load_u16(addr));
        d.emit(&text);
    }
}
fn read_word(d: &mut Debugger, args: &ArgList) {
    if let Some(addr) = required_address(d, args) {
        let text = inspect::word(d.target.load_u32(addr));
        d.emit(&text);
    }
}
fn break_into(_: &mut Debugger, _: &ArgList) { term::raise_debug_trap(); }
fn quit(d: &mut Debugger, _: &ArgList) { d.set_state(RunState::Shutdown); }
fn show_help(d: &mut Debugger, args: &ArgList) {
    match args.text_at(0).map(str::trim) {
        None | Some("") => {
            for line in COMMAND_HELP {
                d.emit_line(line);
            }
        }
        Some(verb) => match lookup(verb) {
            Some(c) => {
                d.emit_line(c.help);
                if c.help == cmd_info {
                    d.emit_line(&format!("flags: {}", Psr::legend()));
                }
            }
            None => d.emit_line("Command not found"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn table_is_sorted() {
        assert!(COMMANDS.windows(2).all(|w| w[0].name < w[1].name));
    }
    #[test]
    fn lookup_is_exact_and_case_insensitive() {
        assert_eq!(lookup("BREAK").map(|c| c.name), Some("break"));
        assert_eq!(lookup("P/X").map(|c| c.name), Some("p/x"));
        assert!(lookup("pr").is_none());
        assert!(lookup("breakpoint").is_none());
        assert!(lookup("").is_none());
    }
    #[test]
    fn aliases_share_help() {
        for (a, b) in [("b", "break"), ("i", "status"), ("dis", "disasm"), ("p/x", "print/x")] {
            let (a, b) = (lookup(a).unwrap(), lookup(b).unwrap());
            assert_eq!(a.help, b.help);
            assert_eq!(a.syntax, b.syntax);
        }
    }
    #[test]
    fn only_help_takes_raw_text() {
        for c in COMMANDS {
            assert_eq!(c.syntax == Syntax::Text, c.name.starts_with('h'), "{}", c.name);
        }
    }
    #[test]
    fn completion() {
        assert_eq!(complete("br"), Completion::Complete("eak ".to_string()));
        assert_eq!(complete("BR"), Completion::Complete("eak ".to_string()));
        assert_eq!(complete("sta"), Completion::Complete("tus ".to_string()));
        assert_eq!(complete("x"), Completion::Complete(" ".to_string()));
        assert_eq!(complete("rw"), Completion::Complete(" ".to_string()));
        // more than one candidate
        assert_eq!(complete("p"), Completion::NoMatch);
        assert_eq!(complete("r"), Completion::NoMatch);
        assert_eq!(complete(""), Completion::NoMatch);
        assert_eq!(complete("z"), Completion::NoMatch);
        assert_eq!(complete("breakx"), Completion::NoMatch);
    }
}
